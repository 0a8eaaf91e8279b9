//! A lock-protected map of records keyed by identifier.

use std::collections::HashMap;

use parking_lot::RwLock;
use podlite_shared::{PodliteError, PodliteResult};

/// Thread-safe collection of records of one kind.
///
/// Readers receive clones; no reference into the map escapes the lock.
#[derive(Debug)]
pub struct Collection<T> {
    kind: &'static str,
    entries: RwLock<HashMap<String, T>>,
}

impl<T: Clone> Collection<T> {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Record kind, used in log fields and error messages.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Get a copy of the record for `id`, if present.
    pub fn get(&self, id: &str) -> Option<T> {
        self.entries.read().get(id).cloned()
    }

    /// Get a copy of the record for `id`, or `NotFound`.
    pub fn require(&self, id: &str) -> PodliteResult<T> {
        self.get(id)
            .ok_or_else(|| PodliteError::NotFound(format!("{} {}", self.kind, id)))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.read().contains_key(id)
    }

    /// Insert or overwrite the record for `id`. Last write wins.
    pub fn put(&self, id: impl Into<String>, record: T) {
        let id = id.into();
        tracing::debug!(kind = self.kind, id = %id, "Registering record");
        self.entries.write().insert(id, record);
    }

    /// Unordered snapshot of every record.
    pub fn list(&self) -> Vec<T> {
        self.entries.read().values().cloned().collect()
    }

    /// Unordered snapshot of the identifiers.
    pub fn ids(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_put_and_get() {
        let c: Collection<String> = Collection::new("sandbox");
        c.put("a", "first".to_string());

        assert_eq!(c.get("a").as_deref(), Some("first"));
        assert!(c.contains("a"));
        assert!(c.get("b").is_none());
    }

    #[test]
    fn test_require_missing_is_not_found() {
        let c: Collection<String> = Collection::new("container");
        let err = c.require("ghost").unwrap_err();

        assert!(matches!(err, PodliteError::NotFound(_)));
        assert_eq!(err.to_string(), "container ghost does not exist");
    }

    #[test]
    fn test_put_overwrites() {
        let c: Collection<u32> = Collection::new("image");
        c.put("a", 1);
        c.put("a", 2);

        assert_eq!(c.len(), 1);
        assert_eq!(c.get("a"), Some(2));
    }

    #[test]
    fn test_list_snapshot() {
        let c: Collection<u32> = Collection::new("image");
        assert!(c.is_empty());
        c.put("a", 1);
        c.put("b", 2);
        c.put("c", 3);

        let mut values = c.list();
        values.sort();
        assert_eq!(values, vec![1, 2, 3]);

        let mut ids = c.ids();
        ids.sort();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_concurrent_puts() {
        let c: Arc<Collection<usize>> = Arc::new(Collection::new("container"));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let c = Arc::clone(&c);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        c.put(format!("{}-{}", t, i), i);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(c.len(), 800);
    }
}
