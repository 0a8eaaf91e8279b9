use std::time::Instant;

use podlite_shared::PodliteResult;

use super::metrics::{PipelineMetrics, StageMetrics, TaskMetrics};
use super::stage::Stage;
use super::task::BoxedTask;

/// Ordered stages to run against one context.
pub struct ExecutionPlan<Ctx> {
    stages: Vec<Stage<BoxedTask<Ctx>>>,
}

impl<Ctx> ExecutionPlan<Ctx> {
    pub fn new(stages: Vec<Stage<BoxedTask<Ctx>>>) -> Self {
        Self { stages }
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// `(stage, tasks)` pairs, for logging a plan before it runs.
    pub fn describe(&self) -> Vec<(&'static str, Vec<String>)> {
        self.stages
            .iter()
            .map(|stage| {
                let tasks = stage.tasks.iter().map(|t| t.name().to_string()).collect();
                (stage.name, tasks)
            })
            .collect()
    }
}

pub struct PipelineExecutor;

impl PipelineExecutor {
    /// Run every task of `plan` in order, stopping at the first error.
    ///
    /// `Ctx` is cloned per task, so it is normally an `Arc` around shared state.
    pub async fn execute<Ctx>(plan: ExecutionPlan<Ctx>, ctx: Ctx) -> PodliteResult<PipelineMetrics>
    where
        Ctx: Clone,
    {
        let total_start = Instant::now();
        let mut stage_metrics = Vec::with_capacity(plan.stages.len());

        for stage in plan.stages {
            let stage_start = Instant::now();
            tracing::trace!(stage = stage.name, tasks = stage.tasks.len(), "Running stage");

            let mut tasks: Vec<TaskMetrics> = Vec::with_capacity(stage.tasks.len());
            for task in stage.tasks {
                let name = task.name().to_string();
                let task_start = Instant::now();
                if let Err(e) = task.run(ctx.clone()).await {
                    let completed: Vec<&str> = tasks.iter().map(|t| t.name.as_str()).collect();
                    tracing::debug!(
                        stage = stage.name,
                        task = %name,
                        completed = ?completed,
                        "Plan aborted"
                    );
                    return Err(e);
                }
                tasks.push(TaskMetrics {
                    name,
                    duration_ms: task_start.elapsed().as_millis(),
                });
            }

            stage_metrics.push(StageMetrics {
                name: stage.name,
                duration_ms: stage_start.elapsed().as_millis(),
                tasks,
            });
        }

        Ok(PipelineMetrics {
            total_duration_ms: total_start.elapsed().as_millis(),
            stages: stage_metrics,
        })
    }
}
