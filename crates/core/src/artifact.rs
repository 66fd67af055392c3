//! Audio artifact references
//!
//! An artifact is a transient binary audio file owned by exactly one request
//! for its duration. The store crate manages lifetimes; this module only
//! defines the reference type passed between stages.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Audio container/encoding metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AudioFormat {
    /// Container short name ("wav", "flac", ...), "unknown" for raw uploads
    pub container: String,
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
    pub bits_per_sample: Option<u16>,
}

impl AudioFormat {
    /// Canonical transcription input: mono 16-bit PCM at 16 kHz
    pub fn canonical_wav() -> Self {
        Self {
            container: "wav".into(),
            sample_rate: Some(16_000),
            channels: Some(1),
            bits_per_sample: Some(16),
        }
    }

    pub fn unknown() -> Self {
        Self {
            container: "unknown".into(),
            ..Default::default()
        }
    }
}

/// Reference to a stored audio payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioArtifact {
    /// Name within the store directory (uuid + extension)
    pub file_name: String,
    /// Absolute path of the backing file
    pub path: PathBuf,
    pub format: AudioFormat,
    pub byte_len: u64,
}

impl AudioArtifact {
    /// MIME type for serving this artifact over HTTP
    pub fn content_type(&self) -> &'static str {
        match self.file_name.rsplit('.').next() {
            Some("wav") => "audio/wav",
            Some("flac") => "audio/flac",
            Some("mp3") => "audio/mpeg",
            Some("ogg") => "audio/ogg",
            _ => "application/octet-stream",
        }
    }
}
