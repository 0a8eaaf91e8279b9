//! Workflow steps.

mod bundle_configure;
mod bundle_unpack;
mod image_pull;
mod runtime_run;
mod sandbox_pid;

pub(super) use bundle_configure::BundleConfigureTask;
pub(super) use bundle_unpack::BundleUnpackTask;
pub(super) use image_pull::ImagePullTask;
pub(super) use runtime_run::RuntimeRunTask;
pub(super) use sandbox_pid::SandboxPidTask;

use podlite_shared::PodliteError;

use super::WorkflowCtx;

/// Log the start of `task_name` and return the instance id it works on.
async fn task_start(ctx: &WorkflowCtx, task_name: &str) -> String {
    let instance_id = ctx.lock().await.instance_id.clone();
    tracing::debug!(instance_id = %instance_id, task = task_name, "Task started");
    instance_id
}

fn log_task_error(instance_id: &str, task_name: &str, err: &PodliteError) {
    tracing::error!(instance_id = %instance_id, task = task_name, error = %err, "Task failed");
}
