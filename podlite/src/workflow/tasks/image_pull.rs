//! Task: pull the container image.

use async_trait::async_trait;
use podlite_shared::PodliteResult;

use super::{WorkflowCtx, log_task_error, task_start};
use crate::pipeline::PipelineTask;

pub(crate) struct ImagePullTask;

#[async_trait]
impl PipelineTask<WorkflowCtx> for ImagePullTask {
    async fn run(self: Box<Self>, ctx: WorkflowCtx) -> PodliteResult<()> {
        let task_name = self.name();
        let instance_id = task_start(&ctx, task_name).await;

        let (images, image) = {
            let ctx = ctx.lock().await;
            (ctx.deps.images.clone(), ctx.image.clone())
        };

        images
            .pull(&image)
            .await
            .inspect_err(|e| log_task_error(&instance_id, task_name, e))
    }

    fn name(&self) -> &str {
        "image_pull"
    }
}
