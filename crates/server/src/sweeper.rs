//! Background cleanup of expired audio artifacts
//!
//! Synthesized audio outlives the request that produced it so clients can
//! fetch it from `/audio/{file}`. The sweeper bounds that lifetime.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use nyaya_audio::TransientAudioStore;

/// How often the store is scanned for expired files
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Spawn the periodic sweep task. Files older than `ttl` are deleted.
pub fn spawn_artifact_sweeper(store: Arc<TransientAudioStore>, ttl: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let removed = store.sweep_older_than(ttl);
            if removed > 0 {
                tracing::info!(removed, ttl_secs = ttl.as_secs(), "swept expired audio");
            }
        }
    })
}
