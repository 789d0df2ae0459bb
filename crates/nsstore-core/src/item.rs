//! Single-key operations.
//!
//! Each function takes the backend for the duration of one call, performs one
//! backend round trip, and wraps any backend failure with the key it concerns.
//! Failures are logged at `warn` before being returned.

use nsstore_backend::KvBackend;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{StorageError, StorageResult};
use crate::value::FieldValue;

/// A key together with the value an operation wrote, read, or removed.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry<T> {
    pub key: String,
    pub value: T,
}

impl<T> Entry<T> {
    fn new(key: &str, value: T) -> Self {
        Self {
            key: key.to_string(),
            value,
        }
    }
}

/// Store `value` under `key` in its canonical string form.
///
/// Returns the key and the original, unserialized value.
pub async fn set_item<B>(
    backend: &B,
    key: &str,
    value: impl Into<FieldValue>,
) -> StorageResult<Entry<FieldValue>>
where
    B: KvBackend + ?Sized,
{
    let value = value.into();
    match backend.set(key, &value.to_stored()).await {
        Ok(()) => {
            debug!(key, kind = %value.kind(), "item saved");
            Ok(Entry::new(key, value))
        }
        Err(source) => {
            warn!(key, error = %source, "item save failed");
            Err(StorageError::Write {
                key: key.to_string(),
                source,
            })
        }
    }
}

/// JSON-encode `data` and store it under `key`.
///
/// Returns the key and the encoded structure as a [`Value`].
pub async fn set_json<B, T>(backend: &B, key: &str, data: &T) -> StorageResult<Entry<Value>>
where
    B: KvBackend + ?Sized,
    T: Serialize + ?Sized,
{
    let value = serde_json::to_value(data).map_err(|e| {
        warn!(key, error = %e, "JSON encoding failed");
        StorageError::Encode(e)
    })?;
    match backend.set(key, &value.to_string()).await {
        Ok(()) => {
            debug!(key, "JSON saved");
            Ok(Entry::new(key, value))
        }
        Err(source) => {
            warn!(key, error = %source, "JSON save failed");
            Err(StorageError::Write {
                key: key.to_string(),
                source,
            })
        }
    }
}

/// Fetch the raw string stored under `key`, `None` if absent.
pub async fn get_item<B>(backend: &B, key: &str) -> StorageResult<Entry<Option<String>>>
where
    B: KvBackend + ?Sized,
{
    match backend.get(key).await {
        Ok(raw) => {
            debug!(key, found = raw.is_some(), "item retrieved");
            Ok(Entry::new(key, raw))
        }
        Err(source) => {
            warn!(key, error = %source, "item read failed");
            Err(StorageError::Read {
                key: key.to_string(),
                source,
            })
        }
    }
}

/// Fetch and decode the JSON value stored under `key`, `None` if absent.
///
/// The decoded structure is returned as is; it is not re-encoded to text.
pub async fn get_json<B>(backend: &B, key: &str) -> StorageResult<Entry<Option<Value>>>
where
    B: KvBackend + ?Sized,
{
    let Entry { value: raw, .. } = get_item(backend, key).await?;
    let Some(raw) = raw else {
        return Ok(Entry::new(key, None));
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Entry::new(key, Some(value))),
        Err(source) => {
            warn!(key, error = %source, "stored value is not valid JSON");
            Err(StorageError::Decode {
                key: key.to_string(),
                source,
            })
        }
    }
}

/// Remove `key`. Removing an absent key succeeds.
pub async fn delete_item<B>(backend: &B, key: &str) -> StorageResult<Entry<()>>
where
    B: KvBackend + ?Sized,
{
    match backend.delete(key).await {
        Ok(()) => {
            debug!(key, "item deleted");
            Ok(Entry::new(key, ()))
        }
        Err(source) => {
            warn!(key, error = %source, "item delete failed");
            Err(StorageError::Delete {
                key: key.to_string(),
                source,
            })
        }
    }
}
