//! Core traits and types for the legal voice backend
//!
//! This crate provides foundational types used across all other crates:
//! - Core traits for pluggable upstream services (STT, completion, TTS)
//! - The request language vocabulary
//! - Transcript and audio artifact types
//! - The structured legal result schema and its degraded fallback
//! - Error types

pub mod artifact;
pub mod error;
pub mod language;
pub mod legal;
pub mod prompt;
pub mod traits;
pub mod transcript;

pub use artifact::{AudioArtifact, AudioFormat};
pub use error::{Error, Result};
pub use language::Language;
pub use legal::{
    ApplicableProvision, Classification, Confidence, DegradedResult, IncidentDetails,
    LegalAnalysis, ProceduralProvision, QueryType, SimilarCase, SourceRef, SourceType, SpecialAct,
    StructuredLegalResult,
};
pub use prompt::PromptPair;
pub use traits::{CompletionModel, CompletionOptions, SpeechSynthesizer, SpeechToText};
pub use transcript::{Transcript, WordTimestamp};
