//! Transient on-disk audio storage
//!
//! Every audio file the service writes lives in one flat directory and is
//! named with a fresh UUID, so client-supplied names never reach the
//! filesystem. Request-scoped files are tracked in an [`ArtifactSet`] and
//! removed when the set drops, whichever way the request ends. Synthesized
//! audio that must outlive its request is detached from the set and later
//! collected by the TTL sweeper.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use uuid::Uuid;

use nyaya_core::{AudioArtifact, AudioFormat, Error, Result};

/// Flat directory of transient audio files
#[derive(Debug)]
pub struct TransientAudioStore {
    dir: PathBuf,
}

impl TransientAudioStore {
    /// Open (creating if necessary) the storage directory
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist bytes under a fresh UUID name with the given extension
    pub fn store(&self, bytes: &[u8], extension: &str, format: AudioFormat) -> Result<AudioArtifact> {
        let file_name = format!("{}.{}", Uuid::new_v4(), extension);
        let path = self.dir.join(&file_name);
        fs::write(&path, bytes)?;

        tracing::debug!(file = %file_name, bytes = bytes.len(), "stored audio artifact");

        Ok(AudioArtifact {
            file_name,
            path,
            format,
            byte_len: bytes.len() as u64,
        })
    }

    /// Resolve a stored file by name, rejecting anything that could escape
    /// the storage directory. Returns the file's bytes.
    pub fn open(&self, file_name: &str) -> Result<Vec<u8>> {
        if file_name.is_empty()
            || file_name.contains('/')
            || file_name.contains('\\')
            || file_name.contains("..")
        {
            return Err(Error::Storage(format!("invalid artifact name: {file_name}")));
        }

        let path = self.dir.join(file_name);
        fs::read(&path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                Error::Storage(format!("artifact not found: {file_name}"))
            } else {
                Error::from(err)
            }
        })
    }

    /// Remove a stored file. Removing a file that is already gone is not an
    /// error; release must stay idempotent under racing cleanup paths.
    pub fn release(&self, file_name: &str) {
        let path = self.dir.join(file_name);
        match fs::remove_file(&path) {
            Ok(()) => tracing::debug!(file = %file_name, "released audio artifact"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                tracing::warn!(file = %file_name, error = %err, "failed to release audio artifact")
            }
        }
    }

    /// Delete files whose modification time is older than `ttl`.
    /// Returns how many were removed.
    pub fn sweep_older_than(&self, ttl: Duration) -> usize {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(error = %err, "sweep could not read storage directory");
                return 0;
            }
        };

        let now = SystemTime::now();
        let mut removed = 0;

        for entry in entries.flatten() {
            let Ok(metadata) = entry.metadata() else { continue };
            if !metadata.is_file() {
                continue;
            }
            let Ok(modified) = metadata.modified() else { continue };
            let expired = now
                .duration_since(modified)
                .map(|age| age >= ttl)
                .unwrap_or(false);
            if expired && fs::remove_file(entry.path()).is_ok() {
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::info!(removed, "swept expired audio artifacts");
        }
        removed
    }
}

/// Request-scoped set of stored artifacts.
///
/// Dropping the set releases every tracked file exactly once, on success and
/// failure paths alike. Files that must outlive the request (synthesized
/// audio served via `/audio/:filename`) are detached with [`ArtifactSet::keep`].
#[derive(Debug)]
pub struct ArtifactSet {
    store: Arc<TransientAudioStore>,
    tracked: Vec<String>,
}

impl ArtifactSet {
    pub fn new(store: Arc<TransientAudioStore>) -> Self {
        Self {
            store,
            tracked: Vec::new(),
        }
    }

    /// Register an artifact for cleanup when this set drops
    pub fn track(&mut self, artifact: &AudioArtifact) {
        self.tracked.push(artifact.file_name.clone());
    }

    /// Detach an artifact so it survives the request. The TTL sweeper
    /// collects it later.
    pub fn keep(&mut self, file_name: &str) {
        self.tracked.retain(|name| name != file_name);
    }

    /// Release all tracked artifacts now
    pub fn release_all(&mut self) {
        for name in self.tracked.drain(..) {
            self.store.release(&name);
        }
    }
}

impl Drop for ArtifactSet {
    fn drop(&mut self) {
        self.release_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, Arc<TransientAudioStore>) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(TransientAudioStore::new(dir.path()).unwrap());
        (dir, store)
    }

    #[test]
    fn test_store_and_open_roundtrip() {
        let (_dir, store) = temp_store();
        let artifact = store
            .store(b"abc", "wav", AudioFormat::canonical_wav())
            .unwrap();
        assert!(artifact.file_name.ends_with(".wav"));
        assert_eq!(store.open(&artifact.file_name).unwrap(), b"abc");
    }

    #[test]
    fn test_open_rejects_traversal() {
        let (_dir, store) = temp_store();
        assert!(store.open("../etc/passwd").is_err());
        assert!(store.open("a/b.wav").is_err());
        assert!(store.open("").is_err());
    }

    #[test]
    fn test_release_is_idempotent() {
        let (_dir, store) = temp_store();
        let artifact = store.store(b"x", "flac", AudioFormat::unknown()).unwrap();
        store.release(&artifact.file_name);
        store.release(&artifact.file_name);
        assert!(store.open(&artifact.file_name).is_err());
    }

    #[test]
    fn test_artifact_set_releases_on_drop() {
        let (_dir, store) = temp_store();
        let artifact = store.store(b"x", "wav", AudioFormat::unknown()).unwrap();
        {
            let mut set = ArtifactSet::new(store.clone());
            set.track(&artifact);
        }
        assert!(store.open(&artifact.file_name).is_err());
    }

    #[test]
    fn test_kept_artifact_survives_drop() {
        let (_dir, store) = temp_store();
        let artifact = store.store(b"x", "flac", AudioFormat::unknown()).unwrap();
        {
            let mut set = ArtifactSet::new(store.clone());
            set.track(&artifact);
            set.keep(&artifact.file_name);
        }
        assert_eq!(store.open(&artifact.file_name).unwrap(), b"x");
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let (_dir, store) = temp_store();
        let artifact = store.store(b"x", "flac", AudioFormat::unknown()).unwrap();

        assert_eq!(store.sweep_older_than(Duration::from_secs(3600)), 0);
        assert!(store.open(&artifact.file_name).is_ok());

        assert_eq!(store.sweep_older_than(Duration::ZERO), 1);
        assert!(store.open(&artifact.file_name).is_err());
    }
}
