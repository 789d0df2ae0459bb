use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{BackendError, BackendResult};
use crate::traits::KvBackend;

/// In-memory, HashMap-based key-value backend.
///
/// Intended for tests and embedding. Entries are held behind a `RwLock`, so
/// concurrent reads never block each other. Values are cloned on read.
pub struct InMemoryBackend {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryBackend {
    /// Create a new empty backend.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Create a backend pre-populated with `entries`.
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            entries: RwLock::new(map),
        }
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    /// Returns `true` if no keys are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.read().expect("lock poisoned").is_empty()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.entries.write().expect("lock poisoned").clear();
    }

    /// Sorted list of keys starting with `prefix`.
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let map = self.entries.read().expect("lock poisoned");
        let mut keys: Vec<String> = map
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    /// Raw copy of every stored entry, ordered by key.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        let map = self.entries.read().expect("lock poisoned");
        map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    fn poisoned<E: std::fmt::Display>(e: E) -> BackendError {
        BackendError::Unavailable(format!("lock poisoned: {e}"))
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvBackend for InMemoryBackend {
    async fn get(&self, key: &str) -> BackendResult<Option<String>> {
        let map = self.entries.read().map_err(Self::poisoned)?;
        Ok(map.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> BackendResult<()> {
        let mut map = self.entries.write().map_err(Self::poisoned)?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> BackendResult<()> {
        let mut map = self.entries.write().map_err(Self::poisoned)?;
        map.remove(key);
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBackend")
            .field("entry_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Core CRUD
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn set_then_get() {
        let backend = InMemoryBackend::new();
        backend.set("user.name", "alice").await.unwrap();
        assert_eq!(
            backend.get("user.name").await.unwrap().as_deref(),
            Some("alice")
        );
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let backend = InMemoryBackend::new();
        assert!(backend.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_overwrites() {
        let backend = InMemoryBackend::new();
        backend.set("k", "one").await.unwrap();
        backend.set("k", "two").await.unwrap();
        assert_eq!(backend.get("k").await.unwrap().as_deref(), Some("two"));
        assert_eq!(backend.len(), 1);
    }

    #[tokio::test]
    async fn delete_present_and_missing() {
        let backend = InMemoryBackend::with_entries([("k", "v")]);
        backend.delete("k").await.unwrap();
        assert!(backend.get("k").await.unwrap().is_none());
        // Deleting again is still a success.
        backend.delete("k").await.unwrap();
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn empty_string_is_a_stored_value() {
        let backend = InMemoryBackend::new();
        backend.set("k", "").await.unwrap();
        assert_eq!(backend.get("k").await.unwrap().as_deref(), Some(""));
    }

    // -----------------------------------------------------------------------
    // Inspection helpers
    // -----------------------------------------------------------------------

    #[test]
    fn keys_with_prefix_sorted() {
        let backend = InMemoryBackend::with_entries([
            ("user.pts.PROF", "3"),
            ("user.name", "bob"),
            ("user.pts.BRO", "1"),
            ("event.id", "7"),
        ]);
        assert_eq!(
            backend.keys_with_prefix("user.pts."),
            vec!["user.pts.BRO", "user.pts.PROF"]
        );
        assert_eq!(backend.keys_with_prefix("").len(), 4);
    }

    #[test]
    fn snapshot_and_clear() {
        let backend = InMemoryBackend::with_entries([("b", "2"), ("a", "1")]);
        let snap = backend.snapshot();
        assert_eq!(snap.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        backend.clear();
        assert!(backend.is_empty());
        // The snapshot is a copy and is unaffected.
        assert_eq!(snap.len(), 2);
    }

    #[test]
    fn debug_shows_count() {
        let backend = InMemoryBackend::with_entries([("a", "1")]);
        let dbg = format!("{backend:?}");
        assert!(dbg.contains("entry_count: 1"));
    }
}
