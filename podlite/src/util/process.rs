//! External tool invocation and PID checking.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use podlite_shared::{PodliteError, PodliteResult};
use tokio::process::Command;

/// One invocation of an external tool.
///
/// The child is spawned with `kill_on_drop`, so dropping the future returned by
/// [`ToolCommand::run`] (caller cancellation, RPC deadline) terminates the
/// tool. An optional timeout does the same and yields `Timeout`.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
    discard_output: bool,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: None,
            discard_output: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send stdout/stderr to /dev/null.
    ///
    /// Required for tools that hand their stdio to a long-lived child
    /// (e.g. `runc run -d`): waiting on a pipe would block until that child exits.
    pub fn discard_output(mut self) -> Self {
        self.discard_output = true;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Run to completion and return stdout.
    ///
    /// # Errors
    ///
    /// - `ExternalTool` if the tool can't be spawned or exits unsuccessfully
    /// - `Timeout` if the configured timeout elapses first
    pub async fn run(&self) -> PodliteResult<Vec<u8>> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        if self.discard_output {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        } else {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        }

        tracing::debug!(tool = %self.program, args = ?self.args, "Invoking external tool");

        let child = cmd.spawn().map_err(|e| self.failure(format!("spawn failed: {}", e), ""))?;

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| {
                    PodliteError::Timeout(format!(
                        "{} {} did not finish within {:?}",
                        self.program,
                        self.args.join(" "),
                        limit
                    ))
                })?,
            None => child.wait_with_output().await,
        }
        .map_err(|e| self.failure(format!("wait failed: {}", e), ""))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.failure(describe_status(output.status), stderr.trim()));
        }

        Ok(output.stdout)
    }

    /// Build an `ExternalTool` error for this invocation.
    pub fn failure(&self, status: impl Into<String>, stderr: impl Into<String>) -> PodliteError {
        PodliteError::ExternalTool {
            tool: self.program.clone(),
            args: self.args.clone(),
            status: status.into(),
            stderr: stderr.into(),
        }
    }
}

fn describe_status(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit code {}", code),
        None => status.to_string(),
    }
}

/// Check if a process with the given PID exists.
///
/// Uses `libc::kill(pid, 0)` which sends a null signal to check existence.
///
/// # Returns
/// * `true` - Process exists
/// * `false` - Process does not exist or permission denied
pub fn is_process_alive(pid: u32) -> bool {
    unsafe { libc::kill(pid as i32, 0) == 0 }
}
