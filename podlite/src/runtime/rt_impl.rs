use std::sync::Arc;

use podlite_shared::PodliteResult;

use crate::engine::{ProcessRuntime, RuncRuntime};
use crate::images::{ImagePuller, ImageStore, ImageUnpacker, SkopeoPuller, UmociUnpacker};
use crate::metrics::{RuntimeMetrics, RuntimeMetricsStorage};
use crate::registry::{KeyedLock, StateRegistry};
use crate::runtime::layout::FilesystemLayout;
use crate::runtime::options::PodliteOptions;
use crate::runtime::types::{
    ContainerRecord, ContainerRequest, ContainerState, SandboxRecord, SandboxRequest,
    SandboxState, check_id_component, now_nanos,
};
use crate::util::is_process_alive;
use crate::workflow::{self, WorkflowDeps, WorkflowKind, WorkflowState};

/// Shared runtime state.
pub type RuntimeInner = Arc<RuntimeInnerImpl>;

/// Runtime inner implementation.
///
/// **Locking Strategy**:
/// - `workflow_locks`: one async mutex per sandbox/container id, held across
///   the whole check → pipeline → register sequence of a create
/// - `registry`: per-collection `RwLock`, for individual reads and writes
/// - Immutable fields: no lock needed
/// - Atomic fields: lock-free (`RuntimeMetricsStorage` uses `AtomicU64`)
pub struct RuntimeInnerImpl {
    pub(crate) registry: Arc<StateRegistry>,
    pub(crate) workflow_locks: KeyedLock,

    pub(crate) options: PodliteOptions,
    pub(crate) layout: FilesystemLayout,
    pub(crate) images: Arc<ImageStore>,
    pub(crate) engine: Arc<dyn ProcessRuntime>,
    pub(crate) runtime_metrics: RuntimeMetricsStorage,
}

impl RuntimeInnerImpl {
    /// Build a runtime driving the external tools named in `options`.
    pub fn new(options: PodliteOptions) -> PodliteResult<RuntimeInner> {
        let engine = RuncRuntime::new(&options.tools.runtime)
            .with_state_root(options.tools.runtime_state_root.clone())
            .with_timeout(options.tool_timeout);
        let puller = SkopeoPuller::new(&options.tools.puller).with_timeout(options.tool_timeout);
        let unpacker =
            UmociUnpacker::new(&options.tools.unpacker).with_timeout(options.tool_timeout);

        Self::with_tools(
            options,
            Arc::new(engine),
            Arc::new(puller),
            Arc::new(unpacker),
        )
    }

    /// Build a runtime over arbitrary tool implementations.
    pub fn with_tools(
        options: PodliteOptions,
        engine: Arc<dyn ProcessRuntime>,
        puller: Arc<dyn ImagePuller>,
        unpacker: Arc<dyn ImageUnpacker>,
    ) -> PodliteResult<RuntimeInner> {
        options.sanitize()?;

        let layout = FilesystemLayout::new(options.runtime_root.clone(), options.image_root.clone());
        layout.prepare()?;

        let registry = Arc::new(StateRegistry::new());
        let runtime_metrics = RuntimeMetricsStorage::new();
        let images = Arc::new(ImageStore::new(
            layout.clone(),
            Arc::clone(&registry),
            puller,
            unpacker,
            runtime_metrics.clone(),
        ));

        tracing::debug!(
            runtime_root = %layout.runtime_root().display(),
            image_root = %layout.image_root().display(),
            "Initialized runtime"
        );

        Ok(Arc::new(Self {
            registry,
            workflow_locks: KeyedLock::new(),
            options,
            layout,
            images,
            engine,
            runtime_metrics,
        }))
    }

    fn workflow_deps(&self) -> WorkflowDeps {
        WorkflowDeps {
            images: Arc::clone(&self.images),
            engine: Arc::clone(&self.engine),
            metrics: self.runtime_metrics.clone(),
        }
    }

    pub(crate) fn metrics(&self) -> RuntimeMetrics {
        RuntimeMetrics::new(self.runtime_metrics.clone())
    }

    // ========================================================================
    // CREATE WORKFLOWS
    // ========================================================================

    pub(crate) async fn run_pod_sandbox(&self, request: SandboxRequest) -> PodliteResult<String> {
        check_id_component("sandbox namespace", &request.metadata.namespace)?;
        check_id_component("sandbox name", &request.metadata.name)?;

        let id = request.id();
        let _guard = self.workflow_locks.lock(&id).await;
        if self.registry.sandboxes.contains(&id) {
            tracing::debug!(sandbox_id = %id, "Sandbox already exists");
            return Ok(id);
        }

        let state = WorkflowState::new(
            WorkflowKind::Sandbox,
            &id,
            &self.options.sandbox_image,
            self.workflow_deps(),
        );
        workflow::run(state)
            .await
            .inspect_err(|_| self.runtime_metrics.increment_workflow_failures())?;

        let SandboxRequest {
            metadata,
            labels,
            annotations,
            runtime_handler,
        } = request;
        self.registry.sandboxes.put(
            &id,
            SandboxRecord {
                id: id.clone(),
                metadata,
                state: SandboxState::Ready,
                created_at: now_nanos(),
                labels,
                annotations,
                runtime_handler,
            },
        );
        self.runtime_metrics.increment_sandboxes_created();

        tracing::info!(sandbox_id = %id, "Sandbox ready");
        Ok(id)
    }

    pub(crate) async fn create_container(
        &self,
        request: ContainerRequest,
    ) -> PodliteResult<String> {
        check_id_component("pod_sandbox_id", &request.pod_sandbox_id)?;
        check_id_component("container name", &request.metadata.name)?;

        let id = request.id();
        let _guard = self.workflow_locks.lock(&id).await;
        if self.registry.containers.contains(&id) {
            tracing::debug!(container_id = %id, "Container already exists");
            return Ok(id);
        }

        let state = WorkflowState::new(
            WorkflowKind::Container {
                sandbox_id: request.pod_sandbox_id.clone(),
            },
            &id,
            &request.image,
            self.workflow_deps(),
        );
        workflow::run(state)
            .await
            .inspect_err(|_| self.runtime_metrics.increment_workflow_failures())?;

        let ContainerRequest {
            pod_sandbox_id,
            metadata,
            image,
            labels,
            annotations,
            log_path,
        } = request;
        self.registry.containers.put(
            &id,
            ContainerRecord {
                id: id.clone(),
                pod_sandbox_id,
                metadata,
                image_ref: image.clone(),
                image,
                state: ContainerState::Running,
                created_at: now_nanos(),
                labels,
                annotations,
                log_path,
            },
        );
        self.runtime_metrics.increment_containers_created();

        tracing::info!(container_id = %id, "Container running");
        Ok(id)
    }

    // ========================================================================
    // DRIFT DETECTION
    // ========================================================================

    /// Ids of tracked sandboxes and containers whose instance is gone.
    ///
    /// Records are left as they are; drift is only reported.
    pub(crate) async fn reconcile(&self) -> Vec<String> {
        let mut ids = self.registry.sandboxes.ids();
        ids.extend(self.registry.containers.ids());

        let mut drifted = Vec::new();
        for id in ids {
            self.runtime_metrics.increment_tool_invocations();
            match self.engine.state(&id).await {
                Ok(state) if state.pid != 0 && is_process_alive(state.pid) => {}
                Ok(state) => {
                    tracing::warn!(
                        instance_id = %id,
                        status = %state.status,
                        pid = state.pid,
                        "Tracked instance is no longer running"
                    );
                    drifted.push(id);
                }
                Err(e) => {
                    tracing::warn!(
                        instance_id = %id,
                        error = %e,
                        "Tracked instance unknown to the low-level runtime"
                    );
                    drifted.push(id);
                }
            }
        }

        tracing::debug!(drifted = drifted.len(), "Reconcile finished");
        drifted
    }
}

impl std::fmt::Debug for RuntimeInnerImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeInnerImpl")
            .field("layout", &self.layout)
            .field("sandboxes", &self.registry.sandboxes.len())
            .field("containers", &self.registry.containers.len())
            .field("images", &self.registry.images.len())
            .finish()
    }
}

