//! HTTP speech synthesis adapter
//!
//! Synthesis is best-effort. Blank input, a warming-up model, or a
//! transport failure all mean "no audio this time", never a failed
//! request; the response simply omits the audio envelope.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use nyaya_audio::TransientAudioStore;
use nyaya_core::{AudioArtifact, AudioFormat, Error, Result, SpeechSynthesizer};

/// Configuration for the synthesis adapter
#[derive(Debug, Clone)]
pub struct SynthesizerConfig {
    pub url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            url: "https://api-inference.huggingface.co/models/facebook/mms-tts-eng".to_string(),
            model: "facebook/mms-tts-eng".to_string(),
            api_key: None,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Synthesizer backed by a hosted inference endpoint, persisting output
/// into the transient audio store
pub struct HttpSynthesizer {
    config: SynthesizerConfig,
    client: Client,
    store: Arc<TransientAudioStore>,
}

impl HttpSynthesizer {
    pub fn new(config: SynthesizerConfig, store: Arc<TransientAudioStore>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            config,
            client,
            store,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Option<AudioArtifact>> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        let mut builder = self
            .client
            .post(&self.config.url)
            .json(&json!({ "inputs": text }));
        if let Some(ref key) = self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(error = %err, "speech synthesis unreachable, skipping audio");
                return Ok(None);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                status = status.as_u16(),
                body = %body,
                "speech synthesis failed, skipping audio"
            );
            metrics::counter!("tts_skips_total").increment(1);
            return Ok(None);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if bytes.is_empty() {
            tracing::warn!("speech synthesis returned no audio, skipping");
            return Ok(None);
        }

        let artifact = self.store.store(
            &bytes,
            "flac",
            AudioFormat {
                container: "flac".into(),
                ..Default::default()
            },
        )?;

        tracing::debug!(
            model = %self.config.model,
            file = %artifact.file_name,
            bytes = artifact.byte_len,
            "speech synthesized"
        );
        Ok(Some(artifact))
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_blank_text_is_skipped_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(TransientAudioStore::new(dir.path()).unwrap());
        let synth = HttpSynthesizer::new(SynthesizerConfig::default(), store).unwrap();

        assert!(synth.synthesize("").await.unwrap().is_none());
        assert!(synth.synthesize("   \n").await.unwrap().is_none());
    }
}
