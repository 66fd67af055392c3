//! Mutable context threaded through a pipeline run

use std::sync::Arc;

use nyaya_audio::{ArtifactSet, TransientAudioStore};
use nyaya_core::{
    AudioArtifact, IncidentDetails, Language, LegalAnalysis, PromptPair, Transcript,
};

/// Per-request state accumulated by pipeline stages.
///
/// Fields start empty and are filled as stages execute; a later stage reads
/// what earlier stages produced and must not overwrite it. The artifact set
/// releases every tracked file when the context drops, however the request
/// ended.
pub struct PipelineContext {
    pub language: Language,
    pub enable_tts: bool,

    /// Raw uploaded audio bytes, before normalization
    pub input_audio: Option<Vec<u8>>,
    /// Free-form text input, or the transcript once transcription ran
    pub text: Option<String>,
    /// Structured incident facts for the legal flow
    pub incident: Option<IncidentDetails>,

    /// Canonical WAV produced by normalization
    pub wav: Option<Vec<u8>>,
    pub transcript: Option<Transcript>,
    pub prompt: Option<PromptPair>,
    /// Raw model output
    pub completion: Option<String>,
    pub analysis: Option<LegalAnalysis>,
    /// Text to feed the synthesizer, when it differs from the completion
    pub speech_text: Option<String>,
    pub synthesized: Option<AudioArtifact>,

    pub artifacts: ArtifactSet,
}

impl PipelineContext {
    pub fn new(store: Arc<TransientAudioStore>, language: Language, enable_tts: bool) -> Self {
        Self {
            language,
            enable_tts,
            input_audio: None,
            text: None,
            incident: None,
            wav: None,
            transcript: None,
            prompt: None,
            completion: None,
            analysis: None,
            speech_text: None,
            synthesized: None,
            artifacts: ArtifactSet::new(store),
        }
    }

    /// Context for a free-form chat question
    pub fn for_text(
        store: Arc<TransientAudioStore>,
        text: String,
        language: Language,
        enable_tts: bool,
    ) -> Self {
        let mut ctx = Self::new(store, language, enable_tts);
        ctx.text = Some(text);
        ctx
    }

    /// Context for an uploaded audio recording
    pub fn for_audio(
        store: Arc<TransientAudioStore>,
        audio: Vec<u8>,
        language: Language,
        enable_tts: bool,
    ) -> Self {
        let mut ctx = Self::new(store, language, enable_tts);
        ctx.input_audio = Some(audio);
        ctx
    }

    /// Context for a structured legal incident
    pub fn for_incident(
        store: Arc<TransientAudioStore>,
        incident: IncidentDetails,
        language: Language,
        enable_tts: bool,
    ) -> Self {
        let mut ctx = Self::new(store, language, enable_tts);
        ctx.incident = Some(incident);
        ctx
    }
}
