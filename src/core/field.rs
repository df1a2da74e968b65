//! Structured key/value fields attached to an entry
//!
//! Fields mostly arrive through the `tracing` bridge, one variant per
//! `tracing::field::Visit` callback.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
}

/// One named field.
pub type Field = (String, FieldValue);

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Str(s) => f.write_str(s),
            FieldValue::I64(v) => fmt::Display::fmt(v, f),
            FieldValue::U64(v) => fmt::Display::fmt(v, f),
            FieldValue::F64(v) => fmt::Display::fmt(v, f),
            FieldValue::Bool(v) => fmt::Display::fmt(v, f),
        }
    }
}

/// Non-finite floats have no JSON form and encode as `null`.
impl From<&FieldValue> for serde_json::Value {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Str(s) => s.as_str().into(),
            FieldValue::I64(v) => (*v).into(),
            FieldValue::U64(v) => (*v).into(),
            FieldValue::F64(v) => serde_json::Number::from_f64(*v).map_or(Self::Null, Self::Number),
            FieldValue::Bool(v) => (*v).into(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Str(s.to_owned())
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::I64(v)
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        FieldValue::U64(v)
    }
}
