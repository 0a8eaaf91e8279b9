//! Record types held by the state registry and the identity scheme that keys them.
//!
//! Identifiers are derived deterministically from request metadata so that a
//! repeated request for the same pod or container maps onto the same record.

use std::collections::HashMap;

use chrono::Utc;
use podlite_shared::{PodliteError, PodliteResult};
use serde::{Deserialize, Serialize};

// ============================================================================
// IDENTITY SCHEME
// ============================================================================

/// Sandbox id for a pod: `{namespace}-{name}-sandbox`.
pub fn sandbox_id(namespace: &str, name: &str) -> String {
    format!("{}-{}-sandbox", namespace, name)
}

/// Container id within a sandbox: `{pod_sandbox_id}-{container_name}`.
pub fn container_id(pod_sandbox_id: &str, container_name: &str) -> String {
    format!("{}-{}", pod_sandbox_id, container_name)
}

/// Check one request field that becomes part of an instance id.
///
/// Ids name directories under the runtime root, so a field must be non-empty
/// and stay a single path segment.
///
/// # Errors
///
/// Returns `InvalidArgument` naming `field` otherwise.
pub fn check_id_component(field: &str, value: &str) -> PodliteResult<()> {
    if value.is_empty() {
        return Err(PodliteError::InvalidArgument(format!(
            "{} must not be empty",
            field
        )));
    }
    if value.contains(['/', '\0']) || value == "." || value == ".." {
        return Err(PodliteError::InvalidArgument(format!(
            "{} '{}' is not a valid path segment",
            field,
            value.escape_default()
        )));
    }
    Ok(())
}

/// Local storage segment for an image reference.
///
/// Strips the leading registry component, so
/// `registry.example.com/library/foo:tag` becomes `library/foo:tag`.
///
/// # Errors
///
/// Returns `MalformedInput` when the reference has no `/` or nothing after it.
pub fn image_local_path(reference: &str) -> PodliteResult<&str> {
    match reference.split_once('/') {
        Some((_, rest)) if !rest.is_empty() => Ok(rest),
        _ => Err(PodliteError::MalformedInput(format!(
            "image reference '{}' has no registry component",
            reference
        ))),
    }
}

/// Current wall-clock time in nanoseconds since the Unix epoch.
pub fn now_nanos() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or_default()
}

// ============================================================================
// SANDBOXES
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxMetadata {
    pub name: String,
    pub namespace: String,
    pub uid: String,
    pub attempt: u32,
}

/// Lifecycle state of a sandbox. Sandboxes are only ever created `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SandboxState {
    Ready,
    NotReady,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxRecord {
    pub id: String,
    pub metadata: SandboxMetadata,
    pub state: SandboxState,
    /// Nanoseconds since the Unix epoch.
    pub created_at: i64,
    pub labels: HashMap<String, String>,
    pub annotations: HashMap<String, String>,
    pub runtime_handler: String,
}

/// Input to `RunPodSandbox`.
#[derive(Debug, Clone, Default)]
pub struct SandboxRequest {
    pub metadata: SandboxMetadata,
    pub labels: HashMap<String, String>,
    pub annotations: HashMap<String, String>,
    pub runtime_handler: String,
}

impl SandboxRequest {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            metadata: SandboxMetadata {
                name: name.into(),
                namespace: namespace.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn id(&self) -> String {
        sandbox_id(&self.metadata.namespace, &self.metadata.name)
    }
}

// ============================================================================
// CONTAINERS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerMetadata {
    pub name: String,
    pub attempt: u32,
}

/// Lifecycle state of a container. Containers are only ever created `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerState {
    Created,
    Running,
    Exited,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerRecord {
    pub id: String,
    pub pod_sandbox_id: String,
    pub metadata: ContainerMetadata,
    /// Image reference as requested.
    pub image: String,
    /// Resolved image reference (echo of the requested one).
    pub image_ref: String,
    pub state: ContainerState,
    /// Nanoseconds since the Unix epoch.
    pub created_at: i64,
    pub labels: HashMap<String, String>,
    pub annotations: HashMap<String, String>,
    pub log_path: String,
}

/// Input to `CreateContainer`.
#[derive(Debug, Clone, Default)]
pub struct ContainerRequest {
    pub pod_sandbox_id: String,
    pub metadata: ContainerMetadata,
    pub image: String,
    pub labels: HashMap<String, String>,
    pub annotations: HashMap<String, String>,
    pub log_path: String,
}

impl ContainerRequest {
    pub fn new(
        pod_sandbox_id: impl Into<String>,
        name: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        Self {
            pod_sandbox_id: pod_sandbox_id.into(),
            metadata: ContainerMetadata {
                name: name.into(),
                attempt: 0,
            },
            image: image.into(),
            ..Default::default()
        }
    }

    pub fn id(&self) -> String {
        container_id(&self.pod_sandbox_id, &self.metadata.name)
    }
}

// ============================================================================
// IMAGES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// The pull reference exactly as requested.
    pub id: String,
    /// Image spec reference (same as `id`).
    pub spec: String,
    /// On-disk size of the pulled image layout in bytes.
    pub size: u64,
}

// ============================================================================
// FILTERS
// ============================================================================

fn labels_match(labels: &HashMap<String, String>, selector: &HashMap<String, String>) -> bool {
    selector.iter().all(|(k, v)| labels.get(k) == Some(v))
}

#[derive(Debug, Clone, Default)]
pub struct SandboxFilter {
    pub id: Option<String>,
    pub state: Option<SandboxState>,
    pub label_selector: HashMap<String, String>,
}

impl SandboxFilter {
    pub fn matches(&self, record: &SandboxRecord) -> bool {
        self.id.as_deref().is_none_or(|id| record.id == id)
            && self.state.is_none_or(|state| record.state == state)
            && labels_match(&record.labels, &self.label_selector)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContainerFilter {
    pub id: Option<String>,
    pub state: Option<ContainerState>,
    pub pod_sandbox_id: Option<String>,
    pub label_selector: HashMap<String, String>,
}

impl ContainerFilter {
    pub fn matches(&self, record: &ContainerRecord) -> bool {
        self.id.as_deref().is_none_or(|id| record.id == id)
            && self.state.is_none_or(|state| record.state == state)
            && self
                .pod_sandbox_id
                .as_deref()
                .is_none_or(|sandbox| record.pod_sandbox_id == sandbox)
            && labels_match(&record.labels, &self.label_selector)
    }
}
