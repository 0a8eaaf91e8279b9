//! runc-compatible CLI driver.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use podlite_shared::{PodliteError, PodliteResult};

use super::{ProcessRuntime, RuntimeState};
use crate::runtime::constants::filenames;
use crate::util::ToolCommand;

/// Drives `runc` (or any CLI with the same `run`/`state` interface).
#[derive(Debug, Clone)]
pub struct RuncRuntime {
    binary: String,
    state_root: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl RuncRuntime {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            state_root: None,
            timeout: None,
        }
    }

    /// Pass `--root <dir>` to every invocation.
    pub fn with_state_root(mut self, root: Option<PathBuf>) -> Self {
        self.state_root = root;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn command(&self) -> ToolCommand {
        let mut cmd = ToolCommand::new(&self.binary).timeout(self.timeout);
        if let Some(root) = &self.state_root {
            cmd = cmd.arg("--root").arg(root.display().to_string());
        }
        cmd
    }

    /// `runc [--root R] --log {bundle}/runtime.log run -d --bundle {bundle} {id}`
    pub fn run_command(&self, bundle_path: &Path, instance_id: &str) -> ToolCommand {
        self.command()
            .arg("--log")
            .arg(bundle_path.join(filenames::RUNTIME_LOG).display().to_string())
            .args(["run", "-d", "--bundle"])
            .arg(bundle_path.display().to_string())
            .arg(instance_id)
            .discard_output()
    }

    /// `runc [--root R] state {id}`
    pub fn state_command(&self, instance_id: &str) -> ToolCommand {
        self.command().arg("state").arg(instance_id)
    }
}

#[async_trait]
impl ProcessRuntime for RuncRuntime {
    async fn run_detached(&self, bundle_path: &Path, instance_id: &str) -> PodliteResult<()> {
        let cmd = self.run_command(bundle_path, instance_id);

        // stdio is discarded (the detached instance inherits it), so runc's own
        // diagnostics come from its log file.
        if let Err(err) = cmd.run().await {
            return Err(match err {
                PodliteError::ExternalTool { status, stderr, .. } => {
                    let detail = match runtime_log_tail(bundle_path).await {
                        Some(tail) => tail,
                        None => stderr,
                    };
                    cmd.failure(status, detail)
                }
                other => other,
            });
        }

        tracing::info!(
            instance_id = %instance_id,
            bundle = %bundle_path.display(),
            "Started detached instance"
        );
        Ok(())
    }

    async fn state(&self, instance_id: &str) -> PodliteResult<RuntimeState> {
        let raw = self.state_command(instance_id).run().await?;
        RuntimeState::parse(&raw)
    }
}

/// Last lines of `{bundle}/runtime.log`, or `None` when it is missing or empty.
async fn runtime_log_tail(bundle_path: &Path) -> Option<String> {
    let log = tokio::fs::read_to_string(bundle_path.join(filenames::RUNTIME_LOG))
        .await
        .ok()?;
    if log.trim().is_empty() {
        return None;
    }
    Some(last_lines(&log, 5))
}

fn last_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.trim().lines().collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}
