//! Task: unpack the image into the instance's bundle directory.

use async_trait::async_trait;
use podlite_shared::PodliteResult;

use super::{WorkflowCtx, log_task_error, task_start};
use crate::pipeline::PipelineTask;

pub(crate) struct BundleUnpackTask;

#[async_trait]
impl PipelineTask<WorkflowCtx> for BundleUnpackTask {
    async fn run(self: Box<Self>, ctx: WorkflowCtx) -> PodliteResult<()> {
        let task_name = self.name();
        let instance_id = task_start(&ctx, task_name).await;

        // Don't hold the context lock across the unpack: it runs beside sandbox_pid.
        let (images, image) = {
            let ctx = ctx.lock().await;
            (ctx.deps.images.clone(), ctx.image.clone())
        };

        let bundle_path = images
            .unpack(&image, &instance_id)
            .await
            .inspect_err(|e| log_task_error(&instance_id, task_name, e))?;

        ctx.lock().await.bundle_path = Some(bundle_path);
        Ok(())
    }

    fn name(&self) -> &str {
        "bundle_unpack"
    }
}
