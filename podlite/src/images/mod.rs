//! Image pull and unpack.
//!
//! - [`ImagePuller`]: copies a remote image into a local OCI layout (skopeo)
//! - [`ImageUnpacker`]: materializes a local OCI image as a runnable bundle (umoci)
//! - [`ImageStore`]: idempotent pull/unpack on top of the two capabilities

mod skopeo;
mod store;
mod umoci;

use std::path::Path;

use async_trait::async_trait;
use podlite_shared::PodliteResult;

pub use skopeo::SkopeoPuller;
pub use store::ImageStore;
pub use umoci::UmociUnpacker;

/// Capability interface for the image copy tool.
#[async_trait]
pub trait ImagePuller: Send + Sync {
    /// Copy `source_ref` from its registry into the OCI layout at `dest_path`.
    async fn copy(&self, source_ref: &str, dest_path: &Path) -> PodliteResult<()>;
}

/// Capability interface for the image unpack tool.
#[async_trait]
pub trait ImageUnpacker: Send + Sync {
    /// Unpack the OCI image at `image_path` into a bundle at `dest_path`.
    async fn unpack(&self, image_path: &Path, dest_path: &Path) -> PodliteResult<()>;
}
