//! Transient audio storage and normalization
//!
//! Uploaded audio arrives in whatever container the client recorded; the
//! transcription backend wants mono 16-bit PCM at 16 kHz. This crate decodes
//! and resamples uploads into that canonical form, and owns the on-disk
//! lifecycle of every audio file the service touches.

pub mod normalize;
pub mod store;

pub use normalize::normalize_to_wav;
pub use store::{ArtifactSet, TransientAudioStore};
