//! HTTP transcription adapter
//!
//! Sends raw WAV bytes to a hosted speech-to-text endpoint and normalizes
//! whichever response shape the service happens to return: a bare string,
//! an object with a `text` field, or a single-element array of such
//! objects. Richer payloads (language, confidence, word timings) are
//! captured when present.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use nyaya_core::{Error, Language, Result, SpeechToText, Transcript, WordTimestamp};

/// Configuration for the transcription adapter
#[derive(Debug, Clone)]
pub struct TranscriberConfig {
    pub url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for TranscriberConfig {
    fn default() -> Self {
        Self {
            url: "https://api-inference.huggingface.co/models/openai/whisper-large-v3".to_string(),
            model: "openai/whisper-large-v3".to_string(),
            api_key: None,
            timeout: Duration::from_secs(120),
        }
    }
}

/// Transcriber backed by a hosted inference endpoint
pub struct HttpTranscriber {
    config: TranscriberConfig,
    client: Client,
}

impl HttpTranscriber {
    pub fn new(config: TranscriberConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl SpeechToText for HttpTranscriber {
    async fn transcribe(&self, wav_bytes: &[u8], language: Language) -> Result<Transcript> {
        let mut builder = self
            .client
            .post(&self.config.url)
            .header(reqwest::header::CONTENT_TYPE, "audio/wav")
            .body(wav_bytes.to_vec());

        if let Some(ref key) = self.config.api_key {
            builder = builder.bearer_auth(key);
        }
        if let Some(hint) = language.stt_hint() {
            builder = builder.query(&[("language", hint)]);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::from_upstream_status(status.as_u16(), body));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| Error::UnrecognizedResponseShape(e.to_string()))?;

        let transcript = extract_transcript(&payload)?;
        tracing::debug!(
            model = %self.config.model,
            chars = transcript.text.len(),
            language = transcript.language.as_deref().unwrap_or("unknown"),
            "transcription finished"
        );
        Ok(transcript)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// Normalize the tolerated upstream payload shapes into a [`Transcript`]
pub fn extract_transcript(payload: &Value) -> Result<Transcript> {
    match payload {
        Value::String(text) => Ok(Transcript::from_text(text.clone())),
        Value::Object(_) => extract_from_object(payload),
        Value::Array(items) => match items.first() {
            Some(first @ Value::Object(_)) => extract_from_object(first),
            Some(Value::String(text)) => Ok(Transcript::from_text(text.clone())),
            _ => Err(Error::UnrecognizedResponseShape(
                "empty or non-object array from transcription service".to_string(),
            )),
        },
        other => Err(Error::UnrecognizedResponseShape(format!(
            "unexpected transcription payload: {other}"
        ))),
    }
}

fn extract_from_object(payload: &Value) -> Result<Transcript> {
    let text = payload
        .get("text")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            Error::UnrecognizedResponseShape(
                "transcription object is missing a text field".to_string(),
            )
        })?
        .to_string();

    let language = payload
        .get("language_code")
        .or_else(|| payload.get("language"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let confidence = payload
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(0.0) as f32;

    let duration_secs = payload
        .get("audio_duration")
        .and_then(Value::as_f64)
        .map(|d| d as f32);

    let words = payload
        .get("words")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    Some(WordTimestamp {
                        word: item.get("word")?.as_str()?.to_string(),
                        start_ms: (item.get("start")?.as_f64()? * 1000.0) as u64,
                        end_ms: (item.get("end")?.as_f64()? * 1000.0) as u64,
                        confidence: item
                            .get("confidence")
                            .and_then(Value::as_f64)
                            .map(|c| c as f32),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(Transcript {
        text,
        language,
        confidence,
        words,
        duration_secs,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_bare_string_payload() {
        let transcript = extract_transcript(&json!("hello world")).unwrap();
        assert_eq!(transcript.text, "hello world");
        assert!(transcript.language.is_none());
    }

    #[test]
    fn test_object_payload() {
        let transcript = extract_transcript(&json!({"text": "hello"})).unwrap();
        assert_eq!(transcript.text, "hello");
    }

    #[test]
    fn test_array_of_objects_payload() {
        let transcript = extract_transcript(&json!([{"text": "first"}, {"text": "second"}])).unwrap();
        assert_eq!(transcript.text, "first");
    }

    #[test]
    fn test_rich_payload() {
        let payload = json!({
            "text": "namaste",
            "language_code": "hi",
            "confidence": 0.93,
            "audio_duration": 1.5,
            "words": [{"word": "namaste", "start": 0.1, "end": 0.9, "confidence": 0.95}]
        });
        let transcript = extract_transcript(&payload).unwrap();
        assert_eq!(transcript.language.as_deref(), Some("hi"));
        assert!((transcript.confidence - 0.93).abs() < 1e-6);
        assert_eq!(transcript.words.len(), 1);
        assert_eq!(transcript.words[0].start_ms, 100);
        assert_eq!(transcript.duration_secs, Some(1.5));
    }

    #[test]
    fn test_unrecognized_shapes_rejected() {
        assert!(extract_transcript(&json!(42)).is_err());
        assert!(extract_transcript(&json!([])).is_err());
        assert!(extract_transcript(&json!({"transcript": "x"})).is_err());
    }
}
