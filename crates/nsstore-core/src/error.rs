//! Error types for namespaced store operations.

use std::fmt;

use nsstore_backend::BackendError;
use thiserror::Error;

use crate::value::FieldKind;

/// Which batch write a [`StorageError::Batch`] came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchOp {
    Set,
    Delete,
}

impl fmt::Display for BatchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Set => f.write_str("set"),
            Self::Delete => f.write_str("delete"),
        }
    }
}

/// Coarse classification of a [`StorageError`], for callers that only need
/// to branch on the failure category.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// A single get/set/delete was rejected by the backend.
    SingleOperation,
    /// One or more per-field backend operations in a batch failed.
    BatchOperation,
    /// A batch read found some fields missing and defaults were not forced.
    PartialBatch,
    /// A stored string could not be read back as the requested kind.
    Coercion,
    /// JSON encoding or decoding failed.
    Codec,
    /// A namespace or field name is unusable.
    InvalidName,
}

/// Errors that can occur during namespaced store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend rejected a write.
    #[error("write failed for {key}: {source}")]
    Write { key: String, source: BackendError },

    /// The backend rejected a read.
    #[error("read failed for {key}: {source}")]
    Read { key: String, source: BackendError },

    /// The backend rejected a delete.
    #[error("delete failed for {key}: {source}")]
    Delete { key: String, source: BackendError },

    /// Some per-field operations of a batch failed. The ones listed in
    /// `succeeded` took effect and were not rolled back.
    #[error(
        "batch {op} on {parent} failed: {} fields failed, {} succeeded",
        .failed.len(),
        .succeeded.len()
    )]
    Batch {
        op: BatchOp,
        parent: String,
        failed: Vec<(String, BackendError)>,
        succeeded: Vec<String>,
    },

    /// A batch read without forced defaults found fields missing.
    #[error("batch read of {parent} is incomplete, missing: {}", .missing.join(", "))]
    PartialBatch { parent: String, missing: Vec<String> },

    /// The stored string does not parse as the kind of the default.
    #[error("cannot read {raw:?} at {key} as {kind}")]
    Coercion {
        key: String,
        kind: FieldKind,
        raw: String,
    },

    /// A value could not be encoded as JSON.
    #[error("JSON encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// A stored value is not valid JSON.
    #[error("JSON decoding failed for {key}: {source}")]
    Decode {
        key: String,
        source: serde_json::Error,
    },

    /// The namespace or a field name cannot be used to build a key.
    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },
}

impl StorageError {
    /// The failure category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Write { .. } | Self::Read { .. } | Self::Delete { .. } => {
                ErrorKind::SingleOperation
            }
            Self::Batch { .. } => ErrorKind::BatchOperation,
            Self::PartialBatch { .. } => ErrorKind::PartialBatch,
            Self::Coercion { .. } => ErrorKind::Coercion,
            Self::Encode(_) | Self::Decode { .. } => ErrorKind::Codec,
            Self::InvalidName { .. } => ErrorKind::InvalidName,
        }
    }
}

/// Convenience type alias for store operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
