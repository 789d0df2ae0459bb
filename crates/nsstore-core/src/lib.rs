//! Namespaced batch store.
//!
//! This crate layers typed values and namespaces on top of a primitive
//! string key-value backend ([`nsstore_backend::KvBackend`]). Related fields
//! are grouped under a parent key and each one is stored independently as
//! `"{parent}.{field}"`.
//!
//! # Operations
//!
//! - Single keys: [`set_item`], [`set_json`], [`get_item`], [`get_json`],
//!   [`delete_item`]
//! - Batches: [`set_batch_best_effort`], [`get_batch`],
//!   [`delete_batch_best_effort`]
//!
//! Every operation takes the backend by reference for one call, so the same
//! code runs against any backend. [`NamespacedStore`] binds the operations to
//! a shared backend handle for convenience.
//!
//! # Batches are not transactions
//!
//! Per-field operations run concurrently and independently. A failed batch
//! may leave some fields written (or deleted) and others not; the error says
//! which. Reads coerce stored strings to the kind of each field's default,
//! and nothing about a value's type is persisted.
//!
//! # Modules
//!
//! - [`error`] — [`StorageError`] and its [`ErrorKind`] classification
//! - [`value`] — [`FieldValue`], [`FieldKind`], [`FieldDescriptor`]
//! - [`names`] — namespace and field name rules
//! - [`item`] — single-key operations
//! - [`batch`] — best-effort batch operations
//! - [`store`] — [`NamespacedStore`] and [`Namespace`]

pub mod batch;
pub mod error;
pub mod item;
pub mod names;
pub mod store;
pub mod value;

pub use batch::{delete_batch_best_effort, get_batch, set_batch_best_effort};
pub use error::{BatchOp, ErrorKind, StorageError, StorageResult};
pub use item::{delete_item, get_item, get_json, set_item, set_json, Entry};
pub use store::{Namespace, NamespacedStore};
pub use value::{descriptors, BatchValues, FieldDescriptor, FieldKind, FieldValue};
