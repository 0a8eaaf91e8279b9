//! Create workflows for sandboxes and containers.
//!
//! ## Architecture
//!
//! Each workflow is an execution plan over a shared [`WorkflowState`]:
//!
//! ```text
//! Sandbox:
//!   prepare    BundleUnpack     (unpack sandbox image at the sandbox id)
//!   configure  BundleConfigure  (terminal off)
//!   launch     RuntimeRun       (detached create + start)
//!
//! Container:
//!   prepare    ImagePull        (idempotent pull)
//!              BundleUnpack     (unpack image at the container id)
//!   network    SandboxPid       (PID of the owning sandbox)
//!   configure  BundleConfigure  (terminal off, join sandbox netns)
//!   launch     RuntimeRun       (detached create + start)
//! ```
//!
//! Registration of the resulting record is left to the caller, after the
//! plan succeeded. Nothing is rolled back on failure.

mod tasks;

use std::path::PathBuf;
use std::sync::Arc;

use podlite_shared::PodliteResult;
use tokio::sync::Mutex;

use crate::engine::ProcessRuntime;
use crate::images::ImageStore;
use crate::metrics::RuntimeMetricsStorage;
use crate::pipeline::{BoxedTask, ExecutionPlan, PipelineExecutor, PipelineMetrics, Stage};

use tasks::{
    BundleConfigureTask, BundleUnpackTask, ImagePullTask, RuntimeRunTask, SandboxPidTask,
};

pub(crate) type WorkflowCtx = Arc<Mutex<WorkflowState>>;

/// What a workflow creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowKind {
    Sandbox,
    /// A container joining the network namespace of `sandbox_id`.
    Container { sandbox_id: String },
}

/// Shared services the tasks call into.
#[derive(Clone)]
pub(crate) struct WorkflowDeps {
    pub images: Arc<ImageStore>,
    pub engine: Arc<dyn ProcessRuntime>,
    pub metrics: RuntimeMetricsStorage,
}

/// Inputs and intermediate outputs of one workflow run.
pub(crate) struct WorkflowState {
    pub kind: WorkflowKind,
    pub instance_id: String,
    pub image: String,
    pub deps: WorkflowDeps,
    /// Set by `bundle_unpack`.
    pub bundle_path: Option<PathBuf>,
    /// Set by `sandbox_pid` (containers only).
    pub sandbox_pid: Option<u32>,
}

impl WorkflowState {
    pub fn new(
        kind: WorkflowKind,
        instance_id: impl Into<String>,
        image: impl Into<String>,
        deps: WorkflowDeps,
    ) -> Self {
        Self {
            kind,
            instance_id: instance_id.into(),
            image: image.into(),
            deps,
            bundle_path: None,
            sandbox_pid: None,
        }
    }
}

fn execution_plan(kind: &WorkflowKind) -> ExecutionPlan<WorkflowCtx> {
    let stages: Vec<Stage<BoxedTask<WorkflowCtx>>> = match kind {
        WorkflowKind::Sandbox => vec![
            Stage::single("prepare", Box::new(BundleUnpackTask)),
            Stage::single("configure", Box::new(BundleConfigureTask)),
            Stage::single("launch", Box::new(RuntimeRunTask)),
        ],
        // The unpack completes before the PID query runs, so an unknown
        // sandbox never interrupts the unpack tool.
        WorkflowKind::Container { .. } => vec![
            Stage::new("prepare", vec![Box::new(ImagePullTask), Box::new(BundleUnpackTask)]),
            Stage::single("network", Box::new(SandboxPidTask)),
            Stage::single("configure", Box::new(BundleConfigureTask)),
            Stage::single("launch", Box::new(RuntimeRunTask)),
        ],
    };
    ExecutionPlan::new(stages)
}

/// Run the plan for `state.kind` to completion.
pub(crate) async fn run(state: WorkflowState) -> PodliteResult<PipelineMetrics> {
    let instance_id = state.instance_id.clone();
    let plan = execution_plan(&state.kind);
    tracing::debug!(instance_id = %instance_id, plan = ?plan.describe(), "Starting create workflow");

    let ctx = Arc::new(Mutex::new(state));
    let metrics = PipelineExecutor::execute(plan, ctx).await?;

    tracing::info!(
        instance_id = %instance_id,
        total_ms = metrics.total_duration_ms,
        prepare_ms = ?metrics.stage_duration_ms("prepare"),
        unpack_ms = ?metrics.task_duration_ms("bundle_unpack"),
        launch_ms = ?metrics.stage_duration_ms("launch"),
        "Create workflow finished"
    );
    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(tasks: &[&str]) -> Vec<String> {
        tasks.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_sandbox_plan_skips_pull_and_pid() {
        let plan = execution_plan(&WorkflowKind::Sandbox);
        assert_eq!(
            plan.describe(),
            vec![
                ("prepare", names(&["bundle_unpack"])),
                ("configure", names(&["bundle_configure"])),
                ("launch", names(&["runtime_run"])),
            ]
        );
    }

    #[test]
    fn test_container_plan_unpacks_before_pid_query() {
        let plan = execution_plan(&WorkflowKind::Container {
            sandbox_id: "default-web-sandbox".into(),
        });
        assert_eq!(
            plan.describe(),
            vec![
                ("prepare", names(&["image_pull", "bundle_unpack"])),
                ("network", names(&["sandbox_pid"])),
                ("configure", names(&["bundle_configure"])),
                ("launch", names(&["runtime_run"])),
            ]
        );
    }
}
