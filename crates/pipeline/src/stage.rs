//! Stage trait and sequential orchestrator

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use nyaya_core::Result;

use crate::context::PipelineContext;

/// One processing step in a pipeline
#[async_trait]
pub trait Stage: Send + Sync {
    /// Stable stage name for logs and metrics
    fn name(&self) -> &'static str;

    async fn run(&self, ctx: &mut PipelineContext) -> Result<()>;
}

/// Named, ordered list of stages
pub struct Pipeline {
    name: &'static str,
    stages: Vec<Arc<dyn Stage>>,
}

impl Pipeline {
    pub fn new(name: &'static str, stages: Vec<Arc<dyn Stage>>) -> Self {
        Self { name, stages }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Run every stage in order. The first error aborts the run; artifact
    /// cleanup is owed to the context's drop, not to this loop.
    pub async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        let start = Instant::now();

        for stage in &self.stages {
            let stage_start = Instant::now();
            tracing::debug!(pipeline = self.name, stage = stage.name(), "stage starting");

            stage.run(ctx).await.map_err(|err| {
                tracing::warn!(
                    pipeline = self.name,
                    stage = stage.name(),
                    error = %err,
                    "stage failed"
                );
                metrics::counter!("pipeline_stage_failures_total", "stage" => stage.name())
                    .increment(1);
                err
            })?;

            metrics::histogram!("pipeline_stage_duration_seconds", "stage" => stage.name())
                .record(stage_start.elapsed().as_secs_f64());
        }

        tracing::info!(
            pipeline = self.name,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "pipeline completed"
        );
        Ok(())
    }
}
