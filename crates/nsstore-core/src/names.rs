//! Namespace and field name rules.
//!
//! Batch operations write each field to the flat backend key
//! `"{parent}.{field}"`. Dots are never escaped, so to keep namespaces
//! collision-free:
//!
//! - A field name must be non-empty and must not contain `.`
//! - A parent must be non-empty, must not start or end with `.`, and must not
//!   contain `..` (every dot-separated component is non-empty)
//!
//! A parent may itself be dotted (`"user.pts"`), which is how nested
//! namespaces are expressed.

use crate::error::{StorageError, StorageResult};

/// Separator between a namespace and a field name.
pub const SEPARATOR: char = '.';

/// Validate a field name, returning `Ok(())` if it can be used in a batch.
///
/// # Examples
///
/// ```
/// use nsstore_core::names::validate_field;
///
/// assert!(validate_field("PROF").is_ok());
/// assert!(validate_field("").is_err());
/// assert!(validate_field("a.b").is_err());
/// ```
pub fn validate_field(name: &str) -> StorageResult<()> {
    if name.is_empty() {
        return Err(invalid(name, "field name must not be empty"));
    }
    if name.contains(SEPARATOR) {
        return Err(invalid(name, "field name must not contain '.'"));
    }
    Ok(())
}

/// Validate a namespace (parent key).
///
/// # Examples
///
/// ```
/// use nsstore_core::names::validate_parent;
///
/// assert!(validate_parent("user").is_ok());
/// assert!(validate_parent("user.pts").is_ok());
/// assert!(validate_parent("user..pts").is_err());
/// ```
pub fn validate_parent(parent: &str) -> StorageResult<()> {
    if parent.is_empty() {
        return Err(invalid(parent, "namespace must not be empty"));
    }
    if parent.starts_with(SEPARATOR) || parent.ends_with(SEPARATOR) {
        return Err(invalid(parent, "namespace must not start or end with '.'"));
    }
    if parent.contains("..") {
        return Err(invalid(parent, "namespace must not contain '..'"));
    }
    Ok(())
}

/// Build the backend key for `field` inside `parent`.
pub fn field_key(parent: &str, field: &str) -> String {
    format!("{parent}{SEPARATOR}{field}")
}

/// Split a backend key into `(parent, field)` at its last separator.
///
/// Returns `None` for keys that were not written by a batch operation.
pub fn split_key(key: &str) -> Option<(&str, &str)> {
    let (parent, field) = key.rsplit_once(SEPARATOR)?;
    if parent.is_empty() || field.is_empty() {
        return None;
    }
    Some((parent, field))
}

fn invalid(name: &str, reason: &str) -> StorageError {
    StorageError::InvalidName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_fields() {
        for name in ["a", "PROF", "snake_case", "with-dash", "ünï"] {
            assert!(validate_field(name).is_ok(), "expected valid: {name}");
        }
    }

    #[test]
    fn invalid_fields() {
        for name in ["", ".", "a.b", ".lead", "trail."] {
            assert!(validate_field(name).is_err(), "expected invalid: {name:?}");
        }
    }

    #[test]
    fn valid_parents() {
        for parent in ["user", "user.pts", "a.b.c"] {
            assert!(validate_parent(parent).is_ok(), "expected valid: {parent}");
        }
    }

    #[test]
    fn invalid_parents() {
        for parent in ["", ".user", "user.", "user..pts"] {
            assert!(
                validate_parent(parent).is_err(),
                "expected invalid: {parent:?}"
            );
        }
    }

    #[test]
    fn invalid_name_reports_reason() {
        match validate_field("a.b") {
            Err(StorageError::InvalidName { name, reason }) => {
                assert_eq!(name, "a.b");
                assert!(reason.contains("'.'"));
            }
            other => panic!("expected InvalidName, got {other:?}"),
        }
    }

    #[test]
    fn key_roundtrip() {
        let key = field_key("user.pts", "PROF");
        assert_eq!(key, "user.pts.PROF");
        assert_eq!(split_key(&key), Some(("user.pts", "PROF")));
    }

    #[test]
    fn split_rejects_undotted_keys() {
        assert_eq!(split_key("token"), None);
        assert_eq!(split_key(".x"), None);
        assert_eq!(split_key("x."), None);
    }
}
