//! Runtime-wide operational counters.
//!
//! [`RuntimeMetricsStorage`] is owned by the runtime and bumped from the
//! create workflows and the image store. [`RuntimeMetrics`] is a read handle
//! shared with callers; both read the same atomics, so a handle always
//! observes current values.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Monotonic counters. Cloning shares the underlying atomics.
#[derive(Debug, Clone, Default)]
pub struct RuntimeMetricsStorage {
    pub(crate) sandboxes_created: Arc<AtomicU64>,
    pub(crate) containers_created: Arc<AtomicU64>,
    pub(crate) images_pulled: Arc<AtomicU64>,
    pub(crate) workflow_failures: Arc<AtomicU64>,
    pub(crate) tool_invocations: Arc<AtomicU64>,
}

impl RuntimeMetricsStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn increment_sandboxes_created(&self) {
        self.sandboxes_created.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn increment_containers_created(&self) {
        self.containers_created.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn increment_images_pulled(&self) {
        self.images_pulled.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn increment_workflow_failures(&self) {
        self.workflow_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn increment_tool_invocations(&self) {
        self.tool_invocations.fetch_add(1, Ordering::Relaxed);
    }
}

/// Read-only view over [`RuntimeMetricsStorage`].
#[derive(Debug, Clone)]
pub struct RuntimeMetrics {
    storage: RuntimeMetricsStorage,
}

/// Point-in-time copy of all counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RuntimeMetricsSnapshot {
    pub sandboxes_created_total: u64,
    pub containers_created_total: u64,
    pub images_pulled_total: u64,
    pub workflow_failures_total: u64,
    pub tool_invocations_total: u64,
}

impl RuntimeMetrics {
    pub fn new(storage: RuntimeMetricsStorage) -> Self {
        Self { storage }
    }

    /// Sandboxes created since startup (idempotent hits excluded).
    pub fn sandboxes_created_total(&self) -> u64 {
        self.storage.sandboxes_created.load(Ordering::Relaxed)
    }

    /// Containers created since startup (idempotent hits excluded).
    pub fn containers_created_total(&self) -> u64 {
        self.storage.containers_created.load(Ordering::Relaxed)
    }

    /// Images copied from a registry since startup.
    pub fn images_pulled_total(&self) -> u64 {
        self.storage.images_pulled.load(Ordering::Relaxed)
    }

    /// Create workflows that aborted with an error.
    pub fn workflow_failures_total(&self) -> u64 {
        self.storage.workflow_failures.load(Ordering::Relaxed)
    }

    /// External tool invocations issued (copy, unpack, run, state).
    pub fn tool_invocations_total(&self) -> u64 {
        self.storage.tool_invocations.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> RuntimeMetricsSnapshot {
        RuntimeMetricsSnapshot {
            sandboxes_created_total: self.sandboxes_created_total(),
            containers_created_total: self.containers_created_total(),
            images_pulled_total: self.images_pulled_total(),
            workflow_failures_total: self.workflow_failures_total(),
            tool_invocations_total: self.tool_invocations_total(),
        }
    }

    /// Counters as a verbose-status info map (`"metrics"` → JSON object).
    pub fn to_info(&self) -> HashMap<String, String> {
        let mut info = HashMap::new();
        match serde_json::to_string(&self.snapshot()) {
            Ok(json) => {
                info.insert("metrics".to_string(), json);
            }
            Err(e) => tracing::warn!(error = %e, "Failed to serialize runtime metrics"),
        }
        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_observes_storage_updates() {
        let storage = RuntimeMetricsStorage::new();
        let metrics = RuntimeMetrics::new(storage.clone());

        storage.increment_sandboxes_created();
        storage.increment_tool_invocations();
        storage.increment_tool_invocations();

        assert_eq!(metrics.sandboxes_created_total(), 1);
        assert_eq!(metrics.tool_invocations_total(), 2);
        assert_eq!(metrics.containers_created_total(), 0);
    }

    #[test]
    fn test_info_map_is_json() {
        let storage = RuntimeMetricsStorage::new();
        storage.increment_images_pulled();
        let info = RuntimeMetrics::new(storage).to_info();

        let value: serde_json::Value = serde_json::from_str(&info["metrics"]).unwrap();
        assert_eq!(value["images_pulled_total"], 1);
        assert_eq!(value["workflow_failures_total"], 0);
    }
}
