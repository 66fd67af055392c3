//! Traits for pluggable upstream services
//!
//! The pipeline talks to speech-to-text, completion, and speech synthesis
//! backends only through these traits. Concrete HTTP adapters live in the
//! pipeline and llm crates; tests inject in-memory implementations.

use async_trait::async_trait;

use crate::{AudioArtifact, Language, PromptPair, Result, Transcript};

/// Sampling parameters for one completion call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Request a JSON-object response format from the backend
    pub force_json: bool,
}

impl CompletionOptions {
    /// Conversational answers: mildly creative, short
    pub fn chat() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: 600,
            force_json: false,
        }
    }

    /// Structured legal output: near-deterministic, long enough for the
    /// full result tree
    pub fn legal() -> Self {
        Self {
            temperature: 0.1,
            max_tokens: 7500,
            force_json: true,
        }
    }
}

/// Transcribes canonical WAV audio into text
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe mono 16 kHz 16-bit WAV bytes. The language is a hint;
    /// `Auto` leaves detection to the backend.
    async fn transcribe(&self, wav_bytes: &[u8], language: Language) -> Result<Transcript>;

    /// Backend identifier for logs and response metadata
    fn model_name(&self) -> &str;
}

/// Produces a text completion for a system+user prompt pair
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(&self, prompt: &PromptPair, options: &CompletionOptions) -> Result<String>;

    fn model_name(&self) -> &str;
}

/// Renders text to an audio artifact.
///
/// Synthesis is best-effort: `Ok(None)` means the backend declined (blank
/// input, model warming up) and the response should simply omit audio.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Option<AudioArtifact>>;

    fn model_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    struct CannedStt;

    #[async_trait]
    impl SpeechToText for CannedStt {
        async fn transcribe(&self, _wav: &[u8], _language: Language) -> Result<Transcript> {
            Ok(Transcript::from_text("hello"))
        }

        fn model_name(&self) -> &str {
            "canned-stt"
        }
    }

    struct EchoModel;

    #[async_trait]
    impl CompletionModel for EchoModel {
        async fn complete(
            &self,
            prompt: &PromptPair,
            _options: &CompletionOptions,
        ) -> Result<String> {
            Ok(prompt.user.clone())
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    #[tokio::test]
    async fn test_traits_are_object_safe() {
        let stt: Arc<dyn SpeechToText> = Arc::new(CannedStt);
        let llm: Arc<dyn CompletionModel> = Arc::new(EchoModel);

        let transcript = stt.transcribe(&[], Language::Auto).await.unwrap();
        assert_eq!(transcript.text, "hello");

        let prompt = PromptPair::new("sys", "ping");
        let answer = llm
            .complete(&prompt, &CompletionOptions::chat())
            .await
            .unwrap();
        assert_eq!(answer, "ping");
    }

    #[test]
    fn test_preset_options() {
        let chat = CompletionOptions::chat();
        assert!(!chat.force_json);
        assert_eq!(chat.max_tokens, 600);

        let legal = CompletionOptions::legal();
        assert!(legal.force_json);
        assert!(legal.temperature < chat.temperature);
    }
}
