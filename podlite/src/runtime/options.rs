//! Configuration for the podlite runtime.

use std::path::PathBuf;
use std::time::Duration;

use podlite_shared::{PodliteError, PodliteResult};
use serde::{Deserialize, Serialize};

use crate::runtime::constants::{defaults, tools};
use crate::runtime::types::image_local_path;

/// Runtime-wide options.
///
/// Defaults match a conventional single-node installation:
/// bundles under `/var/lib/podlite`, images under `/var/lib/podlite/images`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodliteOptions {
    /// Directory holding one unpacked bundle per sandbox/container id.
    pub runtime_root: PathBuf,
    /// Directory holding pulled OCI image layouts.
    pub image_root: PathBuf,
    /// Image unpacked for every pod sandbox.
    pub sandbox_image: String,
    /// Unix socket the CRI server listens on.
    pub socket_path: PathBuf,
    /// External tool binaries.
    pub tools: ToolOptions,
    /// Upper bound for a single external tool invocation.
    #[serde(default, with = "optional_duration_secs")]
    pub tool_timeout: Option<Duration>,
    /// How often to compare tracked records with the low-level runtime.
    #[serde(default, with = "optional_duration_secs")]
    pub reconcile_interval: Option<Duration>,
}

/// Paths (or names resolved via `PATH`) of the external OCI tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOptions {
    /// OCI low-level runtime (runc-compatible CLI).
    pub runtime: String,
    /// Optional `--root` state directory for the low-level runtime.
    pub runtime_state_root: Option<PathBuf>,
    /// Image copy tool (skopeo-compatible CLI).
    pub puller: String,
    /// Image unpack tool (umoci-compatible CLI).
    pub unpacker: String,
}

impl Default for ToolOptions {
    fn default() -> Self {
        Self {
            runtime: tools::RUNC.to_string(),
            runtime_state_root: None,
            puller: tools::SKOPEO.to_string(),
            unpacker: tools::UMOCI.to_string(),
        }
    }
}

impl Default for PodliteOptions {
    fn default() -> Self {
        Self {
            runtime_root: PathBuf::from(defaults::RUNTIME_ROOT),
            image_root: PathBuf::from(defaults::IMAGE_ROOT),
            sandbox_image: defaults::SANDBOX_IMAGE.to_string(),
            socket_path: PathBuf::from(defaults::SOCKET_PATH),
            tools: ToolOptions::default(),
            tool_timeout: None,
            reconcile_interval: None,
        }
    }
}

impl PodliteOptions {
    /// Create options rooted at `root`: bundles in `root`, images in `root/images`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let runtime_root = root.into();
        Self {
            image_root: runtime_root.join("images"),
            runtime_root,
            ..Default::default()
        }
    }

    /// Validate options before any work is done with them.
    pub fn sanitize(&self) -> PodliteResult<()> {
        if !self.runtime_root.is_absolute() {
            return Err(PodliteError::InvalidArgument(format!(
                "runtime_root must be an absolute path, got: {}",
                self.runtime_root.display()
            )));
        }
        if !self.image_root.is_absolute() {
            return Err(PodliteError::InvalidArgument(format!(
                "image_root must be an absolute path, got: {}",
                self.image_root.display()
            )));
        }
        image_local_path(&self.sandbox_image)?;
        if self.tool_timeout.is_some_and(|t| t.is_zero()) {
            return Err(PodliteError::InvalidArgument(
                "tool_timeout must be greater than zero".into(),
            ));
        }
        if self.reconcile_interval.is_some_and(|t| t.is_zero()) {
            return Err(PodliteError::InvalidArgument(
                "reconcile_interval must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

mod optional_duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&d.as_secs()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = PodliteOptions::default();
        assert_eq!(opts.runtime_root, PathBuf::from("/var/lib/podlite"));
        assert_eq!(opts.image_root, PathBuf::from("/var/lib/podlite/images"));
        assert_eq!(opts.sandbox_image, "registry.k8s.io/pause:3.9");
        assert_eq!(opts.tools.runtime, "runc");
        assert!(opts.sanitize().is_ok());
    }

    #[test]
    fn test_with_root() {
        let opts = PodliteOptions::with_root("/tmp/podlite");
        assert_eq!(opts.image_root, PathBuf::from("/tmp/podlite/images"));
        assert_eq!(opts.runtime_root, PathBuf::from("/tmp/podlite"));
    }

    #[test]
    fn test_sanitize_rejects_relative_roots() {
        let mut opts = PodliteOptions::default();
        opts.runtime_root = PathBuf::from("relative");
        assert!(matches!(
            opts.sanitize(),
            Err(PodliteError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_sanitize_rejects_malformed_sandbox_image() {
        let mut opts = PodliteOptions::default();
        opts.sandbox_image = "pause".into();
        assert!(matches!(
            opts.sanitize(),
            Err(PodliteError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_sanitize_rejects_zero_timeout() {
        let mut opts = PodliteOptions::default();
        opts.tool_timeout = Some(Duration::ZERO);
        assert!(opts.sanitize().is_err());
    }

    #[test]
    fn test_serde_durations() {
        let mut opts = PodliteOptions::default();
        opts.tool_timeout = Some(Duration::from_secs(30));
        let json = serde_json::to_string(&opts).unwrap();
        let back: PodliteOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back.tool_timeout, Some(Duration::from_secs(30)));
        assert_eq!(back.reconcile_interval, None);
    }
}
