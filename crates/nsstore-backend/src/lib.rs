//! Primitive key-value backends for the namespaced batch store.
//!
//! A backend is a flat asynchronous string map: `get`, `set`, `delete`, each
//! independently failable. Nothing here knows about namespaces, batches, or
//! value types; that logic lives in `nsstore-core`, which takes a backend by
//! reference on every call.
//!
//! # Backends
//!
//! All backends implement the [`KvBackend`] trait:
//!
//! - [`InMemoryBackend`] -- `HashMap`-based store for tests and embedding
//! - [`FileBackend`] -- one file per key under a root directory
//! - [`FaultyBackend`] -- wrapper that fails chosen operations on chosen keys
//!
//! # Design Rules
//!
//! 1. A missing key is `Ok(None)`, never an error.
//! 2. Operations are independent; there is no multi-key atomicity.
//! 3. Backend errors are returned to the caller, never swallowed here.

pub mod error;
pub mod faulty;
pub mod file;
pub mod memory;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{BackendError, BackendResult};
pub use faulty::{FaultyBackend, Operation};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
pub use traits::KvBackend;
