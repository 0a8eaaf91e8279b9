//! Staged task execution for the create workflows.
//!
//! A create request is a fixed sequence of side effects on disk and in the
//! low-level runtime. This module runs such a sequence as a table-driven plan:
//!
//! ```text
//! ExecutionPlan → Stages → Tasks
//!
//! - ExecutionPlan: ordered stages, run one after another
//! - Stage: a named phase ("prepare", "configure", "launch", ...)
//! - Task: one workflow step against a shared context
//! ```
//!
//! Tasks run strictly in declaration order, inside and across stages. A step
//! that starts an external tool is never raced against another step, so a
//! failure elsewhere cannot cancel a tool half way through its output.
//!
//! The first failing task aborts the plan and its error is returned as is.
//! Nothing already done is rolled back; a later retry of the same request
//! reuses it.
//!
//! ## Example
//!
//! ```ignore
//! let plan = ExecutionPlan::new(vec![
//!     Stage::new("prepare", vec![Box::new(ImagePullTask), Box::new(BundleUnpackTask)]),
//!     Stage::single("launch", Box::new(RuntimeRunTask)),
//! ]);
//! let metrics = PipelineExecutor::execute(plan, ctx).await?;
//! tracing::info!(prepare_ms = ?metrics.stage_duration_ms("prepare"));
//! ```

mod executor;
mod metrics;
mod stage;
mod task;

pub use executor::{ExecutionPlan, PipelineExecutor};
pub use metrics::{PipelineMetrics, StageMetrics, TaskMetrics};
pub use stage::Stage;
pub use task::{BoxedTask, PipelineTask};
