//! Task: create and start the instance detached.

use async_trait::async_trait;
use podlite_shared::{PodliteError, PodliteResult};

use super::{WorkflowCtx, log_task_error, task_start};
use crate::pipeline::PipelineTask;

pub(crate) struct RuntimeRunTask;

#[async_trait]
impl PipelineTask<WorkflowCtx> for RuntimeRunTask {
    async fn run(self: Box<Self>, ctx: WorkflowCtx) -> PodliteResult<()> {
        let task_name = self.name();
        let instance_id = task_start(&ctx, task_name).await;

        let (engine, metrics, bundle_path) = {
            let ctx = ctx.lock().await;
            let bundle_path = ctx.bundle_path.clone().ok_or_else(|| {
                PodliteError::Internal("bundle_unpack task must run first".into())
            })?;
            (ctx.deps.engine.clone(), ctx.deps.metrics.clone(), bundle_path)
        };

        metrics.increment_tool_invocations();
        engine
            .run_detached(&bundle_path, &instance_id)
            .await
            .inspect_err(|e| log_task_error(&instance_id, task_name, e))
    }

    fn name(&self) -> &str {
        "runtime_run"
    }
}
