//! Prometheus metrics endpoint

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder. Safe to call more than once; only the
/// first call installs anything.
pub fn init_metrics() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE
        .get_or_try_init(|| PrometheusBuilder::new().install_recorder())
        .map_err(|e| {
            tracing::warn!(error = %e, "failed to install Prometheus recorder");
        })
        .ok()
}

/// Render the current metrics snapshot for `GET /metrics`
pub async fn metrics_handler() -> String {
    match PROMETHEUS_HANDLE.get() {
        Some(handle) => handle.render(),
        None => String::new(),
    }
}
