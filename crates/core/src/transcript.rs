//! Transcript types produced by the transcription adapter

use serde::{Deserialize, Serialize};

/// Word-level timing, when the upstream backend provides it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTimestamp {
    pub word: String,
    pub start_ms: u64,
    pub end_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

/// Result of transcribing one audio artifact.
///
/// Produced at most once per request and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Transcript {
    /// Flat transcript text
    pub text: String,
    /// Language detected (or declared) by the backend, ISO 639-1
    pub language: Option<String>,
    /// Overall confidence in [0, 1]; 0.0 when the backend reports none
    pub confidence: f32,
    /// Word timings, empty when the backend does not report them
    #[serde(default)]
    pub words: Vec<WordTimestamp>,
    /// Audio duration in seconds, when reported
    pub duration_secs: Option<f32>,
}

impl Transcript {
    /// Transcript carrying only text, for backends that report nothing else
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}
