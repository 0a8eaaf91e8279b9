//! Idempotent pull and unpack.

use std::path::PathBuf;
use std::sync::Arc;

use podlite_shared::PodliteResult;

use super::{ImagePuller, ImageUnpacker};
use crate::metrics::RuntimeMetricsStorage;
use crate::registry::{KeyedLock, StateRegistry};
use crate::runtime::constants::filenames;
use crate::runtime::layout::FilesystemLayout;
use crate::runtime::types::ImageRecord;
use crate::util::dir_size;

/// Image operations backed by the state registry and the image root.
///
/// - `pull` is keyed by the exact reference string and runs the copy tool
///   at most once per reference, also under concurrent callers.
/// - `unpack` is keyed by instance id and is skipped when the bundle
///   directory already holds a `config.json`. Callers serialize unpacks of
///   the same id.
pub struct ImageStore {
    layout: FilesystemLayout,
    registry: Arc<StateRegistry>,
    puller: Arc<dyn ImagePuller>,
    unpacker: Arc<dyn ImageUnpacker>,
    pull_locks: KeyedLock,
    metrics: RuntimeMetricsStorage,
}

impl ImageStore {
    pub fn new(
        layout: FilesystemLayout,
        registry: Arc<StateRegistry>,
        puller: Arc<dyn ImagePuller>,
        unpacker: Arc<dyn ImageUnpacker>,
        metrics: RuntimeMetricsStorage,
    ) -> Self {
        Self {
            layout,
            registry,
            puller,
            unpacker,
            pull_locks: KeyedLock::new(),
            metrics,
        }
    }

    pub fn layout(&self) -> &FilesystemLayout {
        &self.layout
    }

    /// Copy `reference` into the image root unless it was already pulled.
    ///
    /// A failed copy may leave a partial layout behind; no cleanup is done.
    pub async fn pull(&self, reference: &str) -> PodliteResult<()> {
        let dest = self.layout.image_path(reference)?;
        if self.registry.images.contains(reference) {
            tracing::trace!(image = %reference, "Image already present, skipping pull");
            return Ok(());
        }

        let _guard = self.pull_locks.lock(reference).await;
        if self.registry.images.contains(reference) {
            tracing::debug!(image = %reference, "Image pulled by concurrent request");
            return Ok(());
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tracing::info!(image = %reference, dest = %dest.display(), "Pulling image");
        self.metrics.increment_tool_invocations();
        self.puller.copy(reference, &dest).await?;

        let size = measure(self.layout.image_layout_dir(reference)?).await;
        self.registry.images.put(
            reference,
            ImageRecord {
                id: reference.to_string(),
                spec: reference.to_string(),
                size,
            },
        );
        self.metrics.increment_images_pulled();

        tracing::info!(image = %reference, size, "Image pulled");
        Ok(())
    }

    /// Unpack `reference` into the bundle directory of `instance_id`.
    ///
    /// Returns the existing directory untouched if a complete bundle is
    /// already there, even when the image has changed since. A directory
    /// without `config.json` is what an interrupted unpack leaves behind; it
    /// is removed and unpacked again.
    pub async fn unpack(&self, reference: &str, instance_id: &str) -> PodliteResult<PathBuf> {
        let image_path = self.layout.image_path(reference)?;
        let bundle_path = self.layout.bundle_dir(instance_id);
        if tokio::fs::try_exists(bundle_path.join(filenames::CONFIG_JSON)).await? {
            tracing::debug!(
                instance_id = %instance_id,
                bundle = %bundle_path.display(),
                "Bundle already unpacked"
            );
            return Ok(bundle_path);
        }
        if tokio::fs::try_exists(&bundle_path).await? {
            tracing::warn!(
                instance_id = %instance_id,
                bundle = %bundle_path.display(),
                "Removing incomplete bundle"
            );
            tokio::fs::remove_dir_all(&bundle_path).await?;
        }

        tracing::info!(
            instance_id = %instance_id,
            image = %reference,
            bundle = %bundle_path.display(),
            "Unpacking image"
        );
        self.metrics.increment_tool_invocations();
        self.unpacker.unpack(&image_path, &bundle_path).await?;
        Ok(bundle_path)
    }

    /// Bytes used under the image root.
    pub async fn used_bytes(&self) -> u64 {
        measure(self.layout.image_root().to_path_buf()).await
    }
}

impl std::fmt::Debug for ImageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageStore")
            .field("layout", &self.layout)
            .field("images", &self.registry.images.len())
            .finish()
    }
}

async fn measure(path: PathBuf) -> u64 {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "Image layout missing, reporting size 0");
        return 0;
    }
    let shown = path.display().to_string();
    match tokio::task::spawn_blocking(move || dir_size(&path)).await {
        Ok(size) => size,
        Err(e) => {
            tracing::warn!(path = %shown, error = %e, "Failed to measure image size");
            0
        }
    }
}
