//! Task: rewrite the bundle config before it is run.
//!
//! Terminal allocation is always disabled. Container bundles additionally
//! join the network namespace of their sandbox's PID.

use async_trait::async_trait;
use podlite_shared::{PodliteError, PodliteResult};

use super::{WorkflowCtx, log_task_error, task_start};
use crate::bundle;
use crate::pipeline::PipelineTask;
use crate::workflow::WorkflowKind;

pub(crate) struct BundleConfigureTask;

#[async_trait]
impl PipelineTask<WorkflowCtx> for BundleConfigureTask {
    async fn run(self: Box<Self>, ctx: WorkflowCtx) -> PodliteResult<()> {
        let task_name = self.name();
        let instance_id = task_start(&ctx, task_name).await;

        let (bundle_path, netns_pid) = {
            let ctx = ctx.lock().await;
            let bundle_path = ctx.bundle_path.clone().ok_or_else(|| {
                PodliteError::Internal("bundle_unpack task must run first".into())
            })?;
            let netns_pid = match ctx.kind {
                WorkflowKind::Sandbox => None,
                WorkflowKind::Container { .. } => Some(ctx.sandbox_pid.ok_or_else(|| {
                    PodliteError::Internal("sandbox_pid task must run first".into())
                })?),
            };
            (bundle_path, netns_pid)
        };

        bundle::prepare(&bundle_path, netns_pid)
            .inspect_err(|e| log_task_error(&instance_id, task_name, e))
    }

    fn name(&self) -> &str {
        "bundle_configure"
    }
}
