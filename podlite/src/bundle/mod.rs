//! OCI bundle preparation.
//!
//! Loads `{bundle}/config.json`, applies the mutations podlite needs before a
//! bundle is handed to the low-level runtime, and writes it back:
//!
//! 1. Disable terminal allocation (instances run detached).
//! 2. For containers only: join the owning sandbox's network namespace.
//!
//! Everything else in the config is left as the unpack tool produced it.

use std::path::{Path, PathBuf};

use oci_spec::runtime::{LinuxBuilder, LinuxNamespaceBuilder, LinuxNamespaceType, Spec};
use podlite_shared::{PodliteError, PodliteResult};

use crate::runtime::constants::filenames;

/// Path of the network namespace of `pid`.
pub fn netns_path(pid: u32) -> PathBuf {
    PathBuf::from(format!("/proc/{}/ns/net", pid))
}

/// A loaded OCI bundle config, edited in memory until [`OciBundle::save`].
#[derive(Debug)]
pub struct OciBundle {
    config_path: PathBuf,
    spec: Spec,
}

impl OciBundle {
    /// Load the runtime config of the bundle at `bundle_path`.
    pub fn load(bundle_path: &Path) -> PodliteResult<Self> {
        let config_path = bundle_path.join(filenames::CONFIG_JSON);
        let spec = Spec::load(&config_path).map_err(|e| {
            PodliteError::Config(format!(
                "failed to load OCI spec from {}: {}",
                config_path.display(),
                e
            ))
        })?;
        Ok(Self { config_path, spec })
    }

    pub fn spec(&self) -> &Spec {
        &self.spec
    }

    /// Force the process terminal flag off.
    pub fn disable_terminal(&mut self) -> PodliteResult<()> {
        let mut process = self.spec.process().clone().ok_or_else(|| {
            PodliteError::Config(format!(
                "{} has no process section",
                self.config_path.display()
            ))
        })?;
        process.set_terminal(Some(false));
        self.spec.set_process(Some(process));
        Ok(())
    }

    /// Add or replace the `network` namespace entry so it points at `/proc/{pid}/ns/net`.
    pub fn share_network_namespace(&mut self, pid: u32) -> PodliteResult<()> {
        let namespace = LinuxNamespaceBuilder::default()
            .typ(LinuxNamespaceType::Network)
            .path(netns_path(pid))
            .build()
            .map_err(|e| PodliteError::Config(format!("failed to set network namespace: {}", e)))?;

        let mut linux = match self.spec.linux().clone() {
            Some(linux) => linux,
            None => LinuxBuilder::default().build().map_err(|e| {
                PodliteError::Config(format!("failed to initialize linux section: {}", e))
            })?,
        };

        let mut namespaces = linux.namespaces().clone().unwrap_or_default();
        match namespaces
            .iter_mut()
            .find(|ns| ns.typ() == LinuxNamespaceType::Network)
        {
            Some(existing) => *existing = namespace,
            None => namespaces.push(namespace),
        }
        linux.set_namespaces(Some(namespaces));
        self.spec.set_linux(Some(linux));
        Ok(())
    }

    /// Write the config back to `config.json`.
    pub fn save(&self) -> PodliteResult<()> {
        self.spec.save(&self.config_path).map_err(|e| {
            PodliteError::Config(format!(
                "failed to save updated OCI spec to {}: {}",
                self.config_path.display(),
                e
            ))
        })
    }
}

/// Disable terminal allocation in the bundle at `bundle_path`.
pub fn disable_terminal(bundle_path: &Path) -> PodliteResult<()> {
    let mut bundle = OciBundle::load(bundle_path)?;
    bundle.disable_terminal()?;
    bundle.save()
}

/// Point the bundle at `bundle_path` at the network namespace of `pid`.
pub fn share_network_namespace(bundle_path: &Path, pid: u32) -> PodliteResult<()> {
    let mut bundle = OciBundle::load(bundle_path)?;
    bundle.share_network_namespace(pid)?;
    bundle.save()
}

/// Apply the full mutation sequence in a single load/save:
/// terminal off, then (when `netns_pid` is set) network namespace sharing.
pub fn prepare(bundle_path: &Path, netns_pid: Option<u32>) -> PodliteResult<()> {
    let mut bundle = OciBundle::load(bundle_path)?;
    bundle.disable_terminal()?;
    if let Some(pid) = netns_pid {
        bundle.share_network_namespace(pid)?;
    }
    bundle.save()?;

    tracing::debug!(
        bundle = %bundle_path.display(),
        netns_pid = ?netns_pid,
        "Prepared OCI bundle"
    );
    Ok(())
}
