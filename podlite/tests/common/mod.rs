//! Recording fakes for the external tool capabilities.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use oci_spec::runtime::Spec;
use parking_lot::Mutex;
use podlite::engine::{ProcessRuntime, RuntimeState};
use podlite::images::{ImagePuller, ImageUnpacker};
use podlite::{PodliteError, PodliteOptions, PodliteResult, PodliteRuntime};
use tempfile::TempDir;

pub const SANDBOX_PID: u32 = 4242;

fn tool_failure(tool: &str, args: &[&str], stderr: &str) -> PodliteError {
    PodliteError::ExternalTool {
        tool: tool.to_string(),
        args: args.iter().map(|a| a.to_string()).collect(),
        status: "exit code 1".to_string(),
        stderr: stderr.to_string(),
    }
}

/// Low-level runtime that remembers started instances.
pub struct FakeRuntime {
    pub runs: Mutex<Vec<(PathBuf, String)>>,
    pub state_queries: Mutex<Vec<String>>,
    /// PID reported for every started instance.
    pub pid: u32,
    /// Instance ids whose run fails.
    pub fail_runs: Mutex<Vec<String>>,
    pub delay: Duration,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::with_pid(SANDBOX_PID)
    }

    pub fn with_pid(pid: u32) -> Self {
        Self {
            runs: Mutex::new(Vec::new()),
            state_queries: Mutex::new(Vec::new()),
            pid,
            fail_runs: Mutex::new(Vec::new()),
            delay: Duration::from_millis(10),
        }
    }

    pub fn fail_run_of(&self, instance_id: &str) {
        self.fail_runs.lock().push(instance_id.to_string());
    }

    pub fn run_ids(&self) -> Vec<String> {
        self.runs.lock().iter().map(|(_, id)| id.clone()).collect()
    }

    /// Forget a started instance, as if it was deleted outside podlite.
    pub fn forget(&self, instance_id: &str) {
        self.runs.lock().retain(|(_, id)| id != instance_id);
    }
}

#[async_trait]
impl ProcessRuntime for FakeRuntime {
    async fn run_detached(&self, bundle_path: &Path, instance_id: &str) -> PodliteResult<()> {
        tokio::time::sleep(self.delay).await;
        if self.fail_runs.lock().iter().any(|id| id == instance_id) {
            return Err(tool_failure("runc", &["run", "-d", instance_id], "container init failed"));
        }
        self.runs
            .lock()
            .push((bundle_path.to_path_buf(), instance_id.to_string()));
        Ok(())
    }

    async fn state(&self, instance_id: &str) -> PodliteResult<RuntimeState> {
        self.state_queries.lock().push(instance_id.to_string());
        if !self.runs.lock().iter().any(|(_, id)| id == instance_id) {
            return Err(tool_failure(
                "runc",
                &["state", instance_id],
                &format!("container \"{}\" does not exist", instance_id),
            ));
        }
        Ok(RuntimeState {
            id: instance_id.to_string(),
            pid: self.pid,
            status: "running".to_string(),
            bundle: None,
        })
    }
}

/// Image copy tool that writes a tiny OCI layout.
#[derive(Default)]
pub struct FakePuller {
    pub copies: Mutex<Vec<(String, PathBuf)>>,
}

impl FakePuller {
    pub fn references(&self) -> Vec<String> {
        self.copies.lock().iter().map(|(r, _)| r.clone()).collect()
    }
}

#[async_trait]
impl ImagePuller for FakePuller {
    async fn copy(&self, source_ref: &str, dest_path: &Path) -> PodliteResult<()> {
        tokio::time::sleep(Duration::from_millis(10)).await;
        self.copies
            .lock()
            .push((source_ref.to_string(), dest_path.to_path_buf()));

        // `oci:{dir}:{tag}` writes the layout to `{dir}`.
        let dest = dest_path.to_string_lossy();
        let name_start = dest.rfind('/').map_or(0, |i| i + 1);
        let layout_dir = match dest[name_start..].find(':') {
            Some(i) => PathBuf::from(&dest[..name_start + i]),
            None => dest_path.to_path_buf(),
        };
        std::fs::create_dir_all(layout_dir.join("blobs/sha256"))?;
        std::fs::write(layout_dir.join("index.json"), b"{\"schemaVersion\":2}")?;
        std::fs::write(layout_dir.join("blobs/sha256/layer"), vec![0u8; 512])?;
        Ok(())
    }
}

/// Unpack tool that writes a default OCI config with a terminal.
///
/// Like umoci, it creates the bundle directory before anything else and
/// writes `config.json` last.
#[derive(Default)]
pub struct FakeUnpacker {
    pub unpacks: Mutex<Vec<(PathBuf, PathBuf)>>,
    /// Destinations whose next unpack stops after the rootfs is written.
    pub interrupt: Mutex<Vec<PathBuf>>,
}

impl FakeUnpacker {
    pub fn destinations(&self) -> Vec<PathBuf> {
        self.unpacks.lock().iter().map(|(_, d)| d.clone()).collect()
    }

    pub fn interrupt_next(&self, dest_path: PathBuf) {
        self.interrupt.lock().push(dest_path);
    }
}

#[async_trait]
impl ImageUnpacker for FakeUnpacker {
    async fn unpack(&self, image_path: &Path, dest_path: &Path) -> PodliteResult<()> {
        self.unpacks
            .lock()
            .push((image_path.to_path_buf(), dest_path.to_path_buf()));
        std::fs::create_dir_all(dest_path.join("rootfs"))?;

        tokio::time::sleep(Duration::from_millis(10)).await;

        let interrupted = {
            let mut pending = self.interrupt.lock();
            let before = pending.len();
            pending.retain(|p| p != dest_path);
            pending.len() != before
        };
        if interrupted {
            return Err(PodliteError::Timeout(format!(
                "umoci unpack into {} timed out",
                dest_path.display()
            )));
        }

        let mut spec = Spec::default();
        if let Some(mut process) = spec.process().clone() {
            process.set_terminal(Some(true));
            spec.set_process(Some(process));
        }
        spec.save(dest_path.join("config.json"))
            .map_err(|e| PodliteError::Config(e.to_string()))?;
        Ok(())
    }
}

/// A runtime over fakes, rooted in a temporary directory.
pub struct Harness {
    pub runtime: PodliteRuntime,
    pub engine: Arc<FakeRuntime>,
    pub puller: Arc<FakePuller>,
    pub unpacker: Arc<FakeUnpacker>,
    pub root: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_engine(FakeRuntime::new())
    }

    pub fn with_engine(engine: FakeRuntime) -> Self {
        let root = tempfile::tempdir().unwrap();
        let engine = Arc::new(engine);
        let puller = Arc::new(FakePuller::default());
        let unpacker = Arc::new(FakeUnpacker::default());

        let runtime = PodliteRuntime::with_tools(
            PodliteOptions::with_root(root.path()),
            engine.clone(),
            puller.clone(),
            unpacker.clone(),
        )
        .unwrap();

        Self {
            runtime,
            engine,
            puller,
            unpacker,
            root,
        }
    }

    pub fn bundle(&self, instance_id: &str) -> PathBuf {
        self.root.path().join(instance_id)
    }

    pub fn load_spec(&self, instance_id: &str) -> Spec {
        Spec::load(self.bundle(instance_id).join("config.json")).unwrap()
    }
}
