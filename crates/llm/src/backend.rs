//! OpenAI-compatible chat completions backend

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use nyaya_core::{CompletionModel, CompletionOptions, Error, PromptPair, Result};

/// Configuration for the completion backend
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Base URL without the /chat/completions suffix
    pub endpoint: String,
    /// Model identifier sent in the request body
    pub model: String,
    /// Bearer token, omitted from requests when absent
    pub api_key: Option<String>,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://router.huggingface.co/v1".to_string(),
            model: "zai-org/GLM-4.6:novita".to_string(),
            api_key: None,
            timeout: Duration::from_secs(120),
        }
    }
}

/// Backend for any server speaking the OpenAI chat completions protocol
pub struct ChatCompletionBackend {
    config: CompletionConfig,
    client: Client,
}

impl ChatCompletionBackend {
    pub fn new(config: CompletionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    fn chat_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl CompletionModel for ChatCompletionBackend {
    async fn complete(&self, prompt: &PromptPair, options: &CompletionOptions) -> Result<String> {
        let start = Instant::now();

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: prompt.system.clone(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt.user.clone(),
                },
            ],
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            response_format: options.force_json.then(|| ResponseFormat {
                format_type: "json_object",
            }),
        };

        let mut builder = self.client.post(self.chat_url()).json(&request);
        if let Some(ref key) = self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            metrics::counter!("completion_errors_total").increment(1);
            return Err(Error::from_upstream_status(status.as_u16(), body));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::UnrecognizedResponseShape(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default();

        let elapsed = start.elapsed();
        metrics::histogram!("completion_duration_seconds").record(elapsed.as_secs_f64());
        tracing::debug!(
            model = %self.config.model,
            elapsed_ms = elapsed.as_millis() as u64,
            chars = content.len(),
            "completion finished"
        );

        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_url_trims_trailing_slash() {
        let backend = ChatCompletionBackend::new(CompletionConfig {
            endpoint: "https://example.com/v1/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(backend.chat_url(), "https://example.com/v1/chat/completions");
    }

    #[test]
    fn test_json_mode_serialized_only_when_forced() {
        let request = ChatRequest {
            model: "m".to_string(),
            messages: vec![],
            temperature: 0.1,
            max_tokens: 100,
            response_format: Some(ResponseFormat {
                format_type: "json_object",
            }),
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"response_format\":{\"type\":\"json_object\"}"));

        let request = ChatRequest {
            model: "m".to_string(),
            messages: vec![],
            temperature: 0.1,
            max_tokens: 100,
            response_format: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("response_format"));
    }

    #[test]
    fn test_response_parses_missing_content() {
        let parsed: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant"}}]}"#).unwrap();
        assert_eq!(parsed.choices[0].message.content, "");
    }
}
