//! Public runtime API.
//!
//! [`PodliteRuntime`] is what the CRI services call into. Create operations
//! run the staged workflows; status and list operations only read the state
//! registry and never consult the low-level runtime.

use std::path::PathBuf;
use std::sync::Arc;

use podlite_shared::PodliteResult;

use crate::engine::ProcessRuntime;
use crate::images::{ImagePuller, ImageUnpacker};
use crate::metrics::RuntimeMetrics;
use crate::runtime::layout::FilesystemLayout;
use crate::runtime::options::PodliteOptions;
use crate::runtime::rt_impl::{RuntimeInner, RuntimeInnerImpl};
use crate::runtime::types::{
    ContainerFilter, ContainerRecord, ContainerRequest, ImageRecord, SandboxFilter,
    SandboxRecord, SandboxRequest, now_nanos,
};

/// Usage of the filesystem holding pulled images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFsUsage {
    /// Nanoseconds since the Unix epoch.
    pub timestamp: i64,
    pub mountpoint: PathBuf,
    pub used_bytes: u64,
}

/// Handle to a podlite runtime. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct PodliteRuntime {
    inner: RuntimeInner,
}

// ============================================================================
// CONSTRUCTION
// ============================================================================

impl PodliteRuntime {
    /// Create a runtime that drives runc, skopeo and umoci as configured in `options`.
    ///
    /// Validates the options and creates both roots.
    pub fn new(options: PodliteOptions) -> PodliteResult<Self> {
        Ok(Self {
            inner: RuntimeInnerImpl::new(options)?,
        })
    }

    /// Create a runtime over caller-supplied tool implementations.
    pub fn with_tools(
        options: PodliteOptions,
        engine: Arc<dyn ProcessRuntime>,
        puller: Arc<dyn ImagePuller>,
        unpacker: Arc<dyn ImageUnpacker>,
    ) -> PodliteResult<Self> {
        Ok(Self {
            inner: RuntimeInnerImpl::with_tools(options, engine, puller, unpacker)?,
        })
    }

    pub fn options(&self) -> &PodliteOptions {
        &self.inner.options
    }

    pub fn layout(&self) -> &FilesystemLayout {
        &self.inner.layout
    }

    /// Pull the sandbox image so sandboxes can be unpacked from it.
    pub async fn ensure_sandbox_image(&self) -> PodliteResult<()> {
        self.inner.images.pull(&self.inner.options.sandbox_image).await
    }
}

// ============================================================================
// SANDBOXES
// ============================================================================

impl PodliteRuntime {
    /// Create and start the sandbox described by `request`, or return the id
    /// of the already existing one.
    pub async fn run_pod_sandbox(&self, request: SandboxRequest) -> PodliteResult<String> {
        self.inner.run_pod_sandbox(request).await
    }

    /// # Errors
    ///
    /// `NotFound` if no sandbox with this id was created.
    pub fn pod_sandbox_status(&self, id: &str) -> PodliteResult<SandboxRecord> {
        self.inner.registry.sandboxes.require(id)
    }

    /// Sandboxes matching `filter`, in no particular order.
    pub fn list_pod_sandboxes(&self, filter: &SandboxFilter) -> Vec<SandboxRecord> {
        self.inner
            .registry
            .sandboxes
            .list()
            .into_iter()
            .filter(|record| filter.matches(record))
            .collect()
    }
}

// ============================================================================
// CONTAINERS
// ============================================================================

impl PodliteRuntime {
    /// Pull, unpack and start the container described by `request`, or return
    /// the id of the already existing one.
    ///
    /// The sandbox is not looked up in the registry; querying its PID from the
    /// low-level runtime fails for unknown sandboxes.
    pub async fn create_container(&self, request: ContainerRequest) -> PodliteResult<String> {
        self.inner.create_container(request).await
    }

    /// Containers are already running once created, so this does nothing.
    pub fn start_container(&self, id: &str) -> PodliteResult<()> {
        tracing::debug!(container_id = %id, "StartContainer is a no-op");
        Ok(())
    }

    /// # Errors
    ///
    /// `NotFound` if no container with this id was created.
    pub fn container_status(&self, id: &str) -> PodliteResult<ContainerRecord> {
        self.inner.registry.containers.require(id)
    }

    pub fn list_containers(&self, filter: &ContainerFilter) -> Vec<ContainerRecord> {
        self.inner
            .registry
            .containers
            .list()
            .into_iter()
            .filter(|record| filter.matches(record))
            .collect()
    }
}

// ============================================================================
// IMAGES
// ============================================================================

impl PodliteRuntime {
    /// Pull `reference` (at most once) and return it as the image ref.
    pub async fn pull_image(&self, reference: &str) -> PodliteResult<String> {
        self.inner.images.pull(reference).await?;
        Ok(reference.to_string())
    }

    /// The image pulled under exactly `reference`, if any. Absence is not an error.
    pub fn image_status(&self, reference: &str) -> Option<ImageRecord> {
        self.inner.registry.images.get(reference)
    }

    /// Pulled images, optionally restricted to one exact reference.
    pub fn list_images(&self, reference: Option<&str>) -> Vec<ImageRecord> {
        match reference {
            Some(reference) => self.image_status(reference).into_iter().collect(),
            None => self.inner.registry.images.list(),
        }
    }

    pub async fn image_fs_usage(&self) -> ImageFsUsage {
        ImageFsUsage {
            timestamp: now_nanos(),
            mountpoint: self.inner.layout.image_root().to_path_buf(),
            used_bytes: self.inner.images.used_bytes().await,
        }
    }
}

// ============================================================================
// OBSERVABILITY
// ============================================================================

impl PodliteRuntime {
    /// Runtime-wide counters. Lock-free.
    pub fn metrics(&self) -> RuntimeMetrics {
        self.inner.metrics()
    }

    /// Ids of tracked sandboxes and containers whose instance no longer runs.
    pub async fn reconcile(&self) -> Vec<String> {
        self.inner.reconcile().await
    }
}

impl std::fmt::Debug for PodliteRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PodliteRuntime")
            .field("inner", &self.inner)
            .finish()
    }
}

// Compile-time assertion: the runtime is shared across gRPC handler tasks
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    let _ = assert_send_sync::<PodliteRuntime>;
};
