//! Best-effort batch operations over a namespace.
//!
//! A batch touches one backend key per field, `"{parent}.{field}"`. All
//! per-field operations are created up front and driven concurrently with
//! [`join_all`]; the call returns once every one of them has settled. There
//! is no ordering between fields and no rollback: when a batch reports
//! failure, the fields listed as succeeded in the error did take effect.
//!
//! Two batches racing on the same namespace interleave at field granularity.
//! Callers that need a consistent namespace must serialize their own calls.

use std::collections::{BTreeMap, HashSet};

use futures::future::join_all;
use nsstore_backend::{BackendError, BackendResult, KvBackend};
use tracing::{debug, warn};

use crate::error::{BatchOp, StorageError, StorageResult};
use crate::names::{field_key, validate_field, validate_parent};
use crate::value::{BatchValues, FieldDescriptor, FieldValue};

/// Write every field of `fields` under `parent`.
///
/// Returns `fields` unchanged when every write succeeds. If any write fails
/// the whole batch is reported as failed, but writes that succeeded stay in
/// the backend.
pub async fn set_batch_best_effort<B>(
    backend: &B,
    parent: &str,
    fields: &BatchValues,
) -> StorageResult<BatchValues>
where
    B: KvBackend + ?Sized,
{
    validate_names(parent, fields.keys())?;

    let writes = fields.iter().map(|(name, value)| async move {
        let key = field_key(parent, name);
        (name.as_str(), backend.set(&key, &value.to_stored()).await)
    });
    settle(BatchOp::Set, parent, join_all(writes).await)?;

    debug!(parent, fields = fields.len(), "batch saved");
    Ok(fields.clone())
}

/// Read every field described by `defaults` from `parent`.
///
/// A stored value is coerced to the kind of its descriptor's default. An
/// empty stored string counts as absent, and so does a field whose backend
/// read failed (the failure is logged). An absent field takes its default
/// when `force` is set; otherwise the whole call fails with
/// [`StorageError::PartialBatch`]. Fields that did resolve are logged but not
/// returned in that case.
///
/// A coercion failure is reported before missing fields.
pub async fn get_batch<B>(
    backend: &B,
    parent: &str,
    defaults: &[FieldDescriptor],
    force: bool,
) -> StorageResult<BatchValues>
where
    B: KvBackend + ?Sized,
{
    validate_names(parent, defaults.iter().map(|d| &d.name))?;

    let reads = defaults.iter().map(|descriptor| async move {
        let key = field_key(parent, &descriptor.name);
        (descriptor, backend.get(&key).await)
    });
    let outcomes = join_all(reads).await;

    let mut loaded = BatchValues::new();
    let mut missing = Vec::new();
    let mut uncoercible = None;

    for (descriptor, outcome) in outcomes {
        let name = &descriptor.name;
        let raw = outcome.unwrap_or_else(|e| {
            warn!(parent, field = %name, error = %e, "batch field read failed, treating as absent");
            None
        });

        match raw.filter(|r| !r.is_empty()) {
            Some(raw) => match FieldValue::parse(descriptor.kind(), &raw) {
                Some(value) => {
                    loaded.insert(name.clone(), value);
                }
                None => {
                    uncoercible.get_or_insert(StorageError::Coercion {
                        key: field_key(parent, name),
                        kind: descriptor.kind(),
                        raw,
                    });
                }
            },
            None if force => {
                loaded.insert(name.clone(), descriptor.default.clone());
            }
            None => missing.push(name.clone()),
        }
    }

    if let Some(err) = uncoercible {
        warn!(parent, error = %err, "batch retrieval failed");
        return Err(err);
    }
    if !missing.is_empty() {
        warn!(parent, ?missing, ?loaded, "batch retrieved partial");
        return Err(StorageError::PartialBatch {
            parent: parent.to_string(),
            missing,
        });
    }

    debug!(parent, ?loaded, "batch retrieved full");
    Ok(loaded)
}

/// Delete `"{parent}.{field}"` for every key of `fields`.
///
/// Only the keys matter; the values are ignored and handed back unchanged
/// when every delete succeeds. Deletes that succeeded are not undone when
/// another one fails.
pub async fn delete_batch_best_effort<B, V>(
    backend: &B,
    parent: &str,
    fields: &BTreeMap<String, V>,
) -> StorageResult<BTreeMap<String, V>>
where
    B: KvBackend + ?Sized,
    V: Clone,
{
    validate_names(parent, fields.keys())?;

    let deletes = fields.keys().map(|name| async move {
        let key = field_key(parent, name);
        (name.as_str(), backend.delete(&key).await)
    });
    settle(BatchOp::Delete, parent, join_all(deletes).await)?;

    debug!(parent, fields = fields.len(), "batch deleted");
    Ok(fields.clone())
}

fn validate_names<'a>(
    parent: &str,
    names: impl IntoIterator<Item = &'a String>,
) -> StorageResult<()> {
    validate_parent(parent)?;
    let mut seen = HashSet::new();
    for name in names {
        validate_field(name)?;
        if !seen.insert(name.as_str()) {
            return Err(StorageError::InvalidName {
                name: name.clone(),
                reason: "field listed more than once".into(),
            });
        }
    }
    Ok(())
}

fn settle(
    op: BatchOp,
    parent: &str,
    outcomes: Vec<(&str, BackendResult<()>)>,
) -> StorageResult<()> {
    let mut failed = Vec::new();
    let mut succeeded = Vec::new();
    for (name, outcome) in outcomes {
        match outcome {
            Ok(()) => succeeded.push(name.to_string()),
            Err(e) => failed.push((name.to_string(), e)),
        }
    }
    if failed.is_empty() {
        Ok(())
    } else {
        Err(batch_failure(op, parent, failed, succeeded))
    }
}

fn batch_failure(
    op: BatchOp,
    parent: &str,
    failed: Vec<(String, BackendError)>,
    succeeded: Vec<String>,
) -> StorageError {
    let failed_fields: Vec<&str> = failed.iter().map(|(name, _)| name.as_str()).collect();
    warn!(
        %op,
        parent,
        failed = ?failed_fields,
        ?succeeded,
        "batch failed, completed operations are not rolled back"
    );
    StorageError::Batch {
        op,
        parent: parent.to_string(),
        failed,
        succeeded,
    }
}
