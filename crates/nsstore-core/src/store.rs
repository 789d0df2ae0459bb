//! [`NamespacedStore`]: the free functions bound to one shared backend.

use std::collections::BTreeMap;
use std::sync::Arc;

use nsstore_backend::KvBackend;
use serde::Serialize;
use serde_json::Value;

use crate::batch::{delete_batch_best_effort, get_batch, set_batch_best_effort};
use crate::error::StorageResult;
use crate::item::{delete_item, get_item, get_json, set_item, set_json, Entry};
use crate::value::{BatchValues, FieldDescriptor, FieldValue};

/// A backend handle with the store operations as methods.
///
/// Cloning is cheap and every clone talks to the same backend. The store
/// keeps no state of its own between calls.
#[derive(Debug)]
pub struct NamespacedStore<B: ?Sized> {
    backend: Arc<B>,
}

impl<B: ?Sized> Clone for NamespacedStore<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: KvBackend> NamespacedStore<B> {
    /// Take ownership of `backend`.
    pub fn new(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }
}

impl<B: KvBackend + ?Sized> NamespacedStore<B> {
    /// Share an existing backend handle.
    pub fn from_arc(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// The underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub async fn set_item(
        &self,
        key: &str,
        value: impl Into<FieldValue>,
    ) -> StorageResult<Entry<FieldValue>> {
        set_item(self.backend.as_ref(), key, value).await
    }

    pub async fn set_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        data: &T,
    ) -> StorageResult<Entry<Value>> {
        set_json(self.backend.as_ref(), key, data).await
    }

    pub async fn get_item(&self, key: &str) -> StorageResult<Entry<Option<String>>> {
        get_item(self.backend.as_ref(), key).await
    }

    pub async fn get_json(&self, key: &str) -> StorageResult<Entry<Option<Value>>> {
        get_json(self.backend.as_ref(), key).await
    }

    pub async fn delete_item(&self, key: &str) -> StorageResult<Entry<()>> {
        delete_item(self.backend.as_ref(), key).await
    }

    pub async fn set_batch_best_effort(
        &self,
        parent: &str,
        fields: &BatchValues,
    ) -> StorageResult<BatchValues> {
        set_batch_best_effort(self.backend.as_ref(), parent, fields).await
    }

    pub async fn get_batch(
        &self,
        parent: &str,
        defaults: &[FieldDescriptor],
        force: bool,
    ) -> StorageResult<BatchValues> {
        get_batch(self.backend.as_ref(), parent, defaults, force).await
    }

    pub async fn delete_batch_best_effort<V: Clone>(
        &self,
        parent: &str,
        fields: &BTreeMap<String, V>,
    ) -> StorageResult<BTreeMap<String, V>> {
        delete_batch_best_effort(self.backend.as_ref(), parent, fields).await
    }

    /// Scope batch calls to `parent`.
    pub fn namespace<'a>(&'a self, parent: &'a str) -> Namespace<'a, B> {
        Namespace {
            store: self,
            parent,
        }
    }
}

/// A [`NamespacedStore`] borrowed together with one parent key.
#[derive(Debug)]
pub struct Namespace<'a, B: ?Sized> {
    store: &'a NamespacedStore<B>,
    parent: &'a str,
}

impl<B: KvBackend + ?Sized> Namespace<'_, B> {
    pub fn parent(&self) -> &str {
        self.parent
    }

    pub async fn save(&self, fields: &BatchValues) -> StorageResult<BatchValues> {
        self.store.set_batch_best_effort(self.parent, fields).await
    }

    pub async fn load(
        &self,
        defaults: &[FieldDescriptor],
        force: bool,
    ) -> StorageResult<BatchValues> {
        self.store.get_batch(self.parent, defaults, force).await
    }

    /// Delete every field named in `fields`.
    pub async fn clear<V: Clone>(
        &self,
        fields: &BTreeMap<String, V>,
    ) -> StorageResult<BTreeMap<String, V>> {
        self.store.delete_batch_best_effort(self.parent, fields).await
    }
}
