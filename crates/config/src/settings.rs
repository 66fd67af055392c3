//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream inference services
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Request and storage limits
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Transient audio storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging and metrics
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind host
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Enable permissive CORS (browser clients on other origins)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_timeout() -> u64 {
    120
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: default_true(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Upstream inference service endpoints and model identifiers.
///
/// The same bearer token authenticates all three services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Transcription endpoint (accepts raw WAV bytes)
    #[serde(default = "default_stt_url")]
    pub stt_url: String,

    /// Transcription model identifier, for logs and response metadata
    #[serde(default = "default_stt_model")]
    pub stt_model: String,

    /// OpenAI-compatible chat completions base URL (without /chat/completions)
    #[serde(default = "default_llm_endpoint")]
    pub llm_endpoint: String,

    /// Completion model identifier sent in the request body
    #[serde(default = "default_llm_model")]
    pub llm_model: String,

    /// Speech synthesis endpoint
    #[serde(default = "default_tts_url")]
    pub tts_url: String,

    /// Speech synthesis model identifier
    #[serde(default = "default_tts_model")]
    pub tts_model: String,

    /// Bearer token. Read from NYAYA__UPSTREAM__API_KEY or HF_API_KEY;
    /// never stored in config files.
    #[serde(default = "default_api_key")]
    pub api_key: Option<String>,
}

fn default_stt_url() -> String {
    "https://api-inference.huggingface.co/models/openai/whisper-large-v3".to_string()
}
fn default_stt_model() -> String {
    "openai/whisper-large-v3".to_string()
}
fn default_llm_endpoint() -> String {
    "https://router.huggingface.co/v1".to_string()
}
fn default_llm_model() -> String {
    "zai-org/GLM-4.6:novita".to_string()
}
fn default_tts_url() -> String {
    "https://api-inference.huggingface.co/models/facebook/mms-tts-eng".to_string()
}
fn default_tts_model() -> String {
    "facebook/mms-tts-eng".to_string()
}
fn default_api_key() -> Option<String> {
    std::env::var("HF_API_KEY").ok()
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            stt_url: default_stt_url(),
            stt_model: default_stt_model(),
            llm_endpoint: default_llm_endpoint(),
            llm_model: default_llm_model(),
            tts_url: default_tts_url(),
            tts_model: default_tts_model(),
            api_key: default_api_key(),
        }
    }
}

/// Request size and artifact lifetime limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum upload size in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,

    /// How long synthesized audio stays downloadable, in seconds
    #[serde(default = "default_artifact_ttl_secs")]
    pub artifact_ttl_secs: u64,
}

fn default_max_upload_bytes() -> u64 {
    10 * 1024 * 1024
}
fn default_artifact_ttl_secs() -> u64 {
    900
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: default_max_upload_bytes(),
            artifact_ttl_secs: default_artifact_ttl_secs(),
        }
    }
}

/// Transient audio storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for uploaded and synthesized audio files
    #[serde(default = "default_storage_dir")]
    pub dir: String,
}

fn default_storage_dir() -> String {
    "uploads".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level filter
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON-formatted logs
    #[serde(default)]
    pub log_json: bool,

    /// Expose Prometheus metrics on /metrics
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: default_true(),
        }
    }
}

impl Settings {
    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if self.limits.max_upload_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "limits.max_upload_bytes".to_string(),
                message: "Upload limit must be at least 1 byte".to_string(),
            });
        }

        if self.limits.artifact_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "limits.artifact_ttl_secs".to_string(),
                message: "Artifact TTL must be at least 1 second".to_string(),
            });
        }

        if self.storage.dir.is_empty() {
            return Err(ConfigError::MissingField("storage.dir".to_string()));
        }

        for (field, url) in [
            ("upstream.stt_url", &self.upstream.stt_url),
            ("upstream.llm_endpoint", &self.upstream.llm_endpoint),
            ("upstream.tts_url", &self.upstream.tts_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: format!("Expected an http(s) URL, got '{url}'"),
                });
            }
        }

        if self.upstream.api_key.is_none() {
            tracing::warn!(
                "No upstream API key configured; inference requests will be unauthenticated"
            );
        }

        Ok(())
    }
}

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (NYAYA_ prefix, `__` separator)
/// 2. config/{env}.yaml (if env specified)
/// 3. config/default.yaml
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("NYAYA")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_validate() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.limits.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(settings.limits.artifact_ttl_secs, 900);
    }

    #[test]
    fn test_zero_port_rejected() {
        let mut settings = Settings::default();
        settings.server.port = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_zero_upload_limit_rejected() {
        let mut settings = Settings::default();
        settings.limits.max_upload_bytes = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_non_http_endpoint_rejected() {
        let mut settings = Settings::default();
        settings.upstream.llm_endpoint = "ftp://example.com".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_empty_storage_dir_rejected() {
        let mut settings = Settings::default();
        settings.storage.dir = String::new();
        assert!(settings.validate().is_err());
    }
}
