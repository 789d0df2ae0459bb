//! Typed values and their string encoding.
//!
//! The backend stores strings only and no schema is persisted next to a
//! value. A [`FieldValue`] is encoded with [`FieldValue::to_stored`] and read
//! back with [`FieldValue::parse`], which needs the caller to say which
//! [`FieldKind`] to expect. Batch reads take that kind from the default in
//! each [`FieldDescriptor`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The kind of value a field holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    Json,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("string"),
            Self::Number => f.write_str("number"),
            Self::Boolean => f.write_str("boolean"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// A value that can be written to and coerced back from the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Json(Value),
}

impl FieldValue {
    /// The kind of this value.
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::String(_) => FieldKind::String,
            Self::Number(_) => FieldKind::Number,
            Self::Boolean(_) => FieldKind::Boolean,
            Self::Json(_) => FieldKind::Json,
        }
    }

    /// Canonical string form written to the backend.
    ///
    /// Numbers use the shortest text that parses back to the same `f64`, so
    /// `42.0` is stored as `"42"`. Booleans are `"true"` / `"false"`. JSON is
    /// compact.
    pub fn to_stored(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Number(n) => format_number(*n),
            Self::Boolean(b) => b.to_string(),
            Self::Json(v) => v.to_string(),
        }
    }

    /// Read `raw` back as a value of `kind`.
    ///
    /// Returns `None` when `raw` is not a valid encoding of `kind`. Booleans
    /// accept only `"true"` and `"false"`; numbers accept surrounding
    /// whitespace.
    pub fn parse(kind: FieldKind, raw: &str) -> Option<Self> {
        match kind {
            FieldKind::String => Some(Self::String(raw.to_string())),
            FieldKind::Number => raw.trim().parse::<f64>().ok().map(Self::Number),
            FieldKind::Boolean => match raw {
                "true" => Some(Self::Boolean(true)),
                "false" => Some(Self::Boolean(false)),
                _ => None,
            },
            FieldKind::Json => serde_json::from_str(raw).ok().map(Self::Json),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_stored())
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".into()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity".into() } else { "-Infinity".into() }
    } else {
        n.to_string()
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<u32> for FieldValue {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<Value> for FieldValue {
    fn from(v: Value) -> Self {
        Self::Json(v)
    }
}

/// A field name paired with the default used when the field is absent.
///
/// The default's kind also decides how a stored string is coerced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub default: FieldValue,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, default: impl Into<FieldValue>) -> Self {
        Self {
            name: name.into(),
            default: default.into(),
        }
    }

    /// The kind stored values of this field are coerced to.
    pub fn kind(&self) -> FieldKind {
        self.default.kind()
    }
}

/// Field name to value mapping produced and consumed by batch operations.
pub type BatchValues = BTreeMap<String, FieldValue>;

/// Build descriptors for every field of `defaults`.
pub fn descriptors(defaults: &BatchValues) -> Vec<FieldDescriptor> {
    defaults
        .iter()
        .map(|(name, default)| FieldDescriptor::new(name.clone(), default.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn integral_numbers_have_no_fraction() {
        assert_eq!(FieldValue::from(42).to_stored(), "42");
        assert_eq!(FieldValue::from(-3.5).to_stored(), "-3.5");
        assert_eq!(FieldValue::from(0.1).to_stored(), "0.1");
    }

    #[test]
    fn non_finite_numbers() {
        assert_eq!(FieldValue::from(f64::NAN).to_stored(), "NaN");
        assert_eq!(FieldValue::from(f64::INFINITY).to_stored(), "Infinity");
        assert_eq!(
            FieldValue::parse(FieldKind::Number, "-Infinity"),
            Some(FieldValue::Number(f64::NEG_INFINITY))
        );
    }

    #[test]
    fn number_coercion() {
        assert_eq!(
            FieldValue::parse(FieldKind::Number, "42"),
            Some(FieldValue::Number(42.0))
        );
        assert_eq!(
            FieldValue::parse(FieldKind::Number, " 7 "),
            Some(FieldValue::Number(7.0))
        );
        assert_eq!(FieldValue::parse(FieldKind::Number, "seven"), None);
    }

    #[test]
    fn boolean_coercion_is_strict() {
        assert_eq!(
            FieldValue::parse(FieldKind::Boolean, "true"),
            Some(FieldValue::Boolean(true))
        );
        assert_eq!(
            FieldValue::parse(FieldKind::Boolean, "false"),
            Some(FieldValue::Boolean(false))
        );
        assert_eq!(FieldValue::parse(FieldKind::Boolean, "1"), None);
        assert_eq!(FieldValue::parse(FieldKind::Boolean, "TRUE"), None);
    }

    #[test]
    fn string_coercion_keeps_raw() {
        assert_eq!(
            FieldValue::parse(FieldKind::String, "42"),
            Some(FieldValue::String("42".into()))
        );
    }

    #[test]
    fn json_value_is_compact() {
        let v = FieldValue::from(json!({"name": "Ada", "tags": [1, 2]}));
        assert_eq!(v.to_stored(), r#"{"name":"Ada","tags":[1,2]}"#);
        assert_eq!(FieldValue::parse(FieldKind::Json, &v.to_stored()), Some(v));
        assert_eq!(FieldValue::parse(FieldKind::Json, "{oops"), None);
    }

    #[test]
    fn descriptor_kind_follows_default() {
        assert_eq!(FieldDescriptor::new("PROF", 0).kind(), FieldKind::Number);
        assert_eq!(FieldDescriptor::new("name", "").kind(), FieldKind::String);
        assert_eq!(FieldDescriptor::new("admin", false).kind(), FieldKind::Boolean);
    }

    #[test]
    fn descriptors_from_map() {
        let defaults = BatchValues::from([
            ("a".to_string(), FieldValue::from(0)),
            ("b".to_string(), FieldValue::from("x")),
        ]);
        let descs = descriptors(&defaults);
        assert_eq!(descs.len(), 2);
        assert_eq!(descs[1], FieldDescriptor::new("b", "x"));
    }

    #[test]
    fn untagged_serde() {
        let values = BatchValues::from([
            ("n".to_string(), FieldValue::from(3)),
            ("s".to_string(), FieldValue::from("x")),
            ("b".to_string(), FieldValue::from(true)),
        ]);
        let encoded = serde_json::to_value(&values).unwrap();
        assert_eq!(encoded, json!({"n": 3.0, "s": "x", "b": true}));
    }

    proptest! {
        #[test]
        fn finite_numbers_roundtrip(n in -1.0e300f64..1.0e300f64) {
            let stored = FieldValue::Number(n).to_stored();
            prop_assert_eq!(
                FieldValue::parse(FieldKind::Number, &stored),
                Some(FieldValue::Number(n))
            );
        }

        #[test]
        fn strings_roundtrip(s in ".*") {
            let stored = FieldValue::String(s.clone()).to_stored();
            prop_assert_eq!(stored.clone(), s);
            prop_assert_eq!(
                FieldValue::parse(FieldKind::String, &stored),
                Some(FieldValue::String(stored))
            );
        }

        #[test]
        fn json_maps_roundtrip(m in proptest::collection::btree_map("[a-z]{1,8}", any::<i32>(), 0..8)) {
            let value = FieldValue::Json(serde_json::to_value(&m).unwrap());
            let stored = value.to_stored();
            prop_assert_eq!(FieldValue::parse(FieldKind::Json, &stored), Some(value));
        }
    }
}
