//! Low-level runtime adapter.
//!
//! ## Architecture
//!
//! - [`ProcessRuntime`]: capability trait for the external OCI runtime
//!   (create/run a bundle detached, query an instance's state)
//! - [`RuncRuntime`]: implementation driving a runc-compatible CLI
//!
//! The trait is the seam for alternative runtimes and for test doubles.

mod runc;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use podlite_shared::{PodliteError, PodliteResult};
use serde::Deserialize;

pub use runc::RuncRuntime;

/// State of one instance as reported by the low-level runtime.
///
/// Mirrors the OCI runtime `state` document; unknown fields are ignored.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RuntimeState {
    pub id: String,
    #[serde(default)]
    pub pid: u32,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub bundle: Option<PathBuf>,
}

impl RuntimeState {
    /// Parse the JSON printed by `<runtime> state <id>`.
    pub fn parse(raw: &[u8]) -> PodliteResult<Self> {
        serde_json::from_slice(raw)
            .map_err(|e| PodliteError::Config(format!("failed to parse runtime state output: {}", e)))
    }
}

/// Capability interface for the external OCI runtime.
#[async_trait]
pub trait ProcessRuntime: Send + Sync {
    /// Create and start a detached instance `instance_id` from the bundle at `bundle_path`.
    async fn run_detached(&self, bundle_path: &Path, instance_id: &str) -> PodliteResult<()>;

    /// Query the state of `instance_id`.
    async fn state(&self, instance_id: &str) -> PodliteResult<RuntimeState>;

    /// PID of the init process of `instance_id`.
    ///
    /// # Errors
    ///
    /// - `ExternalTool` if the state query fails
    /// - `Config` if the output is malformed or reports no running process
    async fn query_pid(&self, instance_id: &str) -> PodliteResult<u32> {
        let state = self.state(instance_id).await?;
        if state.pid == 0 {
            return Err(PodliteError::Config(format!(
                "instance {} has no running process (status: {})",
                instance_id, state.status
            )));
        }
        Ok(state.pid)
    }
}
