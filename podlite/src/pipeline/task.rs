use async_trait::async_trait;
use podlite_shared::PodliteResult;

/// One step of an execution plan.
///
/// Each task receives its own clone of the context; share state through
/// interior mutability.
#[async_trait]
pub trait PipelineTask<Ctx>: Send + Sync {
    async fn run(self: Box<Self>, ctx: Ctx) -> PodliteResult<()>;

    /// Name used in logs and [`PipelineMetrics`](super::PipelineMetrics).
    fn name(&self) -> &str;
}

pub type BoxedTask<Ctx> = Box<dyn PipelineTask<Ctx>>;
