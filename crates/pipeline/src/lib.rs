//! Request pipelines
//!
//! Each endpoint is a fixed, named list of stages run in order over a
//! mutable [`PipelineContext`]. Stages accumulate fields (transcript,
//! prompt, completion, analysis, synthesized audio); a stage error aborts
//! the run and the context's artifact set cleans up on drop.

pub mod context;
pub mod pipelines;
pub mod stage;
pub mod stages;
pub mod stt;
pub mod tts;

pub use context::PipelineContext;
pub use pipelines::{chat_pipeline, legal_pipeline, transcribe_pipeline};
pub use stage::{Pipeline, Stage};
pub use stt::{HttpTranscriber, TranscriberConfig};
pub use tts::{HttpSynthesizer, SynthesizerConfig};
