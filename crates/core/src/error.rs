//! Shared error taxonomy
//!
//! Every stage of a pipeline reports failures through this enum so that the
//! HTTP layer can map them to status codes in exactly one place. Structured
//! parse failures are deliberately absent: the repair step recovers them into
//! a [`crate::DegradedResult`] instead of erroring.

use thiserror::Error;

/// Result alias used across the workspace
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline and adapter errors
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed client input. Raised before any resource is
    /// allocated, so no cleanup is owed when this is returned.
    #[error("{0}")]
    Validation(String),

    /// Audio decode/resample/encode failure (corrupt input, unsupported codec)
    #[error("audio conversion failed: {0}")]
    Conversion(String),

    /// Upstream model is still loading. Callers may retry after the hint.
    #[error("upstream model is loading, retry in ~{wait_hint_secs}s")]
    RetryableUnavailable { wait_hint_secs: u64 },

    /// Non-2xx from an upstream service, propagated untransformed
    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    /// An upstream payload that none of the tolerated shapes matched
    #[error("unrecognized upstream response shape: {0}")]
    UnrecognizedResponseShape(String),

    /// Transport-level failure talking to an upstream service
    #[error("network error: {0}")]
    Network(String),

    /// Filesystem failure in the transient audio store
    #[error("storage error: {0}")]
    Storage(String),

    /// Invalid or missing configuration discovered at runtime
    #[error("configuration error: {0}")]
    Config(String),

    /// A stage ran without its prerequisite field; indicates a wiring bug
    #[error("internal pipeline error: {0}")]
    Internal(String),
}

impl Error {
    /// Classify an upstream HTTP status, treating 503 as the retryable
    /// "model warming up" case every Hugging Face style service reports.
    pub fn from_upstream_status(status: u16, body: String) -> Self {
        if status == 503 {
            Error::RetryableUnavailable { wait_hint_secs: 25 }
        } else {
            Error::Upstream { status, body }
        }
    }

    /// True when the caller should retry later rather than treat this as fatal
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::RetryableUnavailable { .. })
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_503_maps_to_retryable() {
        let err = Error::from_upstream_status(503, "model loading".into());
        assert!(err.is_retryable());
    }

    #[test]
    fn test_other_statuses_stay_upstream() {
        let err = Error::from_upstream_status(429, "rate limited".into());
        assert!(!err.is_retryable());
        match err {
            Error::Upstream { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
