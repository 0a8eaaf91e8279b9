//! Task: resolve the PID owning the sandbox's network namespace.

use async_trait::async_trait;
use podlite_shared::{PodliteError, PodliteResult};

use super::{WorkflowCtx, log_task_error, task_start};
use crate::pipeline::PipelineTask;
use crate::workflow::WorkflowKind;

pub(crate) struct SandboxPidTask;

#[async_trait]
impl PipelineTask<WorkflowCtx> for SandboxPidTask {
    async fn run(self: Box<Self>, ctx: WorkflowCtx) -> PodliteResult<()> {
        let task_name = self.name();
        let instance_id = task_start(&ctx, task_name).await;

        let (engine, metrics, sandbox_id) = {
            let ctx = ctx.lock().await;
            let WorkflowKind::Container { sandbox_id } = &ctx.kind else {
                return Err(PodliteError::Internal(format!(
                    "{} requires a container workflow",
                    task_name
                )));
            };
            (
                ctx.deps.engine.clone(),
                ctx.deps.metrics.clone(),
                sandbox_id.clone(),
            )
        };

        metrics.increment_tool_invocations();
        let pid = engine
            .query_pid(&sandbox_id)
            .await
            .inspect_err(|e| log_task_error(&instance_id, task_name, e))?;

        tracing::debug!(
            instance_id = %instance_id,
            sandbox_id = %sandbox_id,
            pid,
            "Resolved sandbox PID"
        );
        ctx.lock().await.sandbox_pid = Some(pid);
        Ok(())
    }

    fn name(&self) -> &str {
        "sandbox_pid"
    }
}
