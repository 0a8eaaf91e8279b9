//! Filesystem layout of the image and runtime roots.
//!
//! ```text
//! {image_root}/{local_segment(ref)}   pulled OCI image layout
//! {runtime_root}/{instance_id}/       unpacked bundle (config.json + rootfs/)
//! ```

use std::path::{Path, PathBuf};

use podlite_shared::{PodliteError, PodliteResult};

use crate::runtime::types::image_local_path;

#[derive(Debug, Clone)]
pub struct FilesystemLayout {
    runtime_root: PathBuf,
    image_root: PathBuf,
}

impl FilesystemLayout {
    pub fn new(runtime_root: PathBuf, image_root: PathBuf) -> Self {
        Self {
            runtime_root,
            image_root,
        }
    }

    pub fn runtime_root(&self) -> &Path {
        &self.runtime_root
    }

    pub fn image_root(&self) -> &Path {
        &self.image_root
    }

    /// Create both roots if they don't exist yet.
    pub fn prepare(&self) -> PodliteResult<()> {
        for dir in [&self.runtime_root, &self.image_root] {
            std::fs::create_dir_all(dir).map_err(|e| {
                PodliteError::Storage(format!("Failed to create {}: {}", dir.display(), e))
            })?;
        }
        Ok(())
    }

    /// Destination handed to the image copy and unpack tools for `reference`.
    ///
    /// The last component keeps its `:tag`, which the OCI tools read as
    /// `layout-dir:tag`.
    pub fn image_path(&self, reference: &str) -> PodliteResult<PathBuf> {
        Ok(self.image_root.join(image_local_path(reference)?))
    }

    /// On-disk OCI layout directory for `reference` (the image path without its tag).
    pub fn image_layout_dir(&self, reference: &str) -> PodliteResult<PathBuf> {
        let local = image_local_path(reference)?;
        let name_start = local.rfind('/').map_or(0, |i| i + 1);
        let dir = match local[name_start..].find([':', '@']) {
            Some(i) => &local[..name_start + i],
            None => local,
        };
        Ok(self.image_root.join(dir))
    }

    /// Bundle directory for a sandbox or container id.
    pub fn bundle_dir(&self, instance_id: &str) -> PathBuf {
        self.runtime_root.join(instance_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> FilesystemLayout {
        FilesystemLayout::new(
            PathBuf::from("/var/lib/podlite"),
            PathBuf::from("/var/lib/podlite/images"),
        )
    }

    #[test]
    fn test_image_path_keeps_tag() {
        assert_eq!(
            layout()
                .image_path("registry.example.com/library/foo:tag")
                .unwrap(),
            PathBuf::from("/var/lib/podlite/images/library/foo:tag")
        );
    }

    #[test]
    fn test_image_layout_dir_strips_tag() {
        let layout = layout();
        assert_eq!(
            layout
                .image_layout_dir("registry.example.com/library/foo:tag")
                .unwrap(),
            PathBuf::from("/var/lib/podlite/images/library/foo")
        );
        assert_eq!(
            layout.image_layout_dir("localhost:5000/app").unwrap(),
            PathBuf::from("/var/lib/podlite/images/app")
        );
        assert_eq!(
            layout
                .image_layout_dir("example.com/app@sha256:abcd")
                .unwrap(),
            PathBuf::from("/var/lib/podlite/images/app")
        );
    }

    #[test]
    fn test_bundle_dir() {
        assert_eq!(
            layout().bundle_dir("default-web-sandbox"),
            PathBuf::from("/var/lib/podlite/default-web-sandbox")
        );
    }

    #[test]
    fn test_prepare_creates_roots() {
        let dir = tempfile::tempdir().unwrap();
        let layout = FilesystemLayout::new(dir.path().join("run"), dir.path().join("run/images"));
        layout.prepare().unwrap();
        assert!(layout.runtime_root().is_dir());
        assert!(layout.image_root().is_dir());
    }
}
