use async_trait::async_trait;

use crate::error::BackendResult;

/// Primitive asynchronous string key-value store.
///
/// This is the only capability the namespaced batch store needs. All
/// implementations must satisfy these invariants:
/// - Keys form a flat string space. The backend never interprets dots or any
///   other separator.
/// - Every operation is independent. There are no transactions and no
///   multi-key atomicity; two concurrent writers to one key race and the
///   backend alone decides which value survives.
/// - A missing key is not an error: `get` returns `Ok(None)` and `delete`
///   succeeds.
/// - Failures are reported per call and never poison later calls.
#[async_trait]
pub trait KvBackend: Send + Sync {
    /// Read the raw string stored under `key`.
    ///
    /// Returns `Ok(None)` if nothing is stored there.
    async fn get(&self, key: &str) -> BackendResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> BackendResult<()>;

    /// Remove `key`. Removing an absent key succeeds.
    async fn delete(&self, key: &str) -> BackendResult<()>;
}
