//! HTTP API for the legal voice backend
//!
//! Exposes the chat, transcription, and legal research pipelines over REST,
//! serves synthesized audio back to clients, and owns process-level
//! observability (tracing, Prometheus metrics) and artifact cleanup.

pub mod error;
pub mod http;
pub mod metrics;
pub mod state;
pub mod sweeper;

pub use error::ApiError;
pub use http::create_router;
pub use metrics::{init_metrics, metrics_handler};
pub use state::AppState;
pub use sweeper::spawn_artifact_sweeper;
