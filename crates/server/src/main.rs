//! Server entry point

use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use nyaya_config::{load_settings, Settings};
use nyaya_server::{create_router, init_metrics, spawn_artifact_sweeper, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Priority: env vars > config/{env}.yaml > config/default.yaml > defaults
    let env = std::env::var("NYAYA_ENV").ok();
    let settings = match load_settings(env.as_deref()) {
        Ok(settings) => {
            // Tracing not yet initialized, use eprintln for early logging
            eprintln!(
                "Loaded configuration (env: {})",
                env.as_deref().unwrap_or("default")
            );
            settings
        }
        Err(e) => {
            eprintln!("Warning: failed to load config: {}. Using defaults.", e);
            Settings::default()
        }
    };

    init_tracing(&settings);
    tracing::info!("Starting legal voice backend v{}", env!("CARGO_PKG_VERSION"));

    if settings.observability.metrics_enabled {
        init_metrics();
        tracing::info!("Initialized Prometheus metrics at /metrics");
    }

    let state = AppState::from_settings(settings.clone())?;

    let sweeper = spawn_artifact_sweeper(
        state.store.clone(),
        Duration::from_secs(settings.limits.artifact_ttl_secs),
    );
    tracing::info!(
        dir = %settings.storage.dir,
        ttl_secs = settings.limits.artifact_ttl_secs,
        "Artifact sweeper running"
    );

    let app = create_router(state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

/// Initialize tracing from the observability settings
fn init_tracing(settings: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &settings.observability.log_level;
        format!("nyaya={},tower_http=info", level).into()
    });

    let fmt_layer = if settings.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
