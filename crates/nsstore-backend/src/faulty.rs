//! Failure-injecting backend wrapper.
//!
//! [`FaultyBackend`] forwards to an inner backend except for operations on
//! keys that have been marked as failing, which return
//! [`BackendError::Injected`] without touching the inner store. It is used to
//! exercise partial-failure behaviour of batch operations.

use std::collections::HashSet;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{BackendError, BackendResult};
use crate::traits::KvBackend;

/// The primitive operation a fault applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Get,
    Set,
    Delete,
}

/// Backend wrapper that fails selected `(operation, key)` pairs.
#[derive(Debug)]
pub struct FaultyBackend<B> {
    inner: B,
    faults: RwLock<HashSet<(Operation, String)>>,
}

impl<B: KvBackend> FaultyBackend<B> {
    /// Wrap `inner` with no faults configured.
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            faults: RwLock::new(HashSet::new()),
        }
    }

    /// Make every `op` on `key` fail until [`heal`](Self::heal) is called.
    pub fn fail(&self, op: Operation, key: impl Into<String>) {
        self.faults
            .write()
            .expect("lock poisoned")
            .insert((op, key.into()));
    }

    /// Remove every configured fault.
    pub fn heal(&self) {
        self.faults.write().expect("lock poisoned").clear();
    }

    /// The wrapped backend, for direct inspection.
    pub fn inner(&self) -> &B {
        &self.inner
    }

    fn check(&self, op: Operation, key: &str) -> BackendResult<()> {
        let faults = self
            .faults
            .read()
            .map_err(|e| BackendError::Unavailable(format!("lock poisoned: {e}")))?;
        if faults.contains(&(op, key.to_string())) {
            return Err(BackendError::Injected {
                key: key.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl<B: KvBackend> KvBackend for FaultyBackend<B> {
    async fn get(&self, key: &str) -> BackendResult<Option<String>> {
        self.check(Operation::Get, key)?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> BackendResult<()> {
        self.check(Operation::Set, key)?;
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> BackendResult<()> {
        self.check(Operation::Delete, key)?;
        self.inner.delete(key).await
    }
}
