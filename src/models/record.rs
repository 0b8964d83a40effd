//! Decoded record types.
//!
//! FogBugz responses carry no schema. Each repeated element becomes a
//! [`Record`] whose field types follow the tag naming convention, and
//! records are collected into a [`RecordSet`] keyed by a designated field.

use indexmap::IndexMap;
use serde::Serialize;

/// Field name to value, in document order.
pub type Record = IndexMap<String, FieldValue>;

/// Record key to record, in first-seen order.
///
/// A later record with the same key replaces the earlier one.
pub type RecordSet = IndexMap<String, Record>;

/// A single decoded field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// String field (CDATA payload or raw inner text).
    Text(String),
    /// `ix*` and `n*` fields.
    Integer(i64),
    /// `f*` fields.
    Boolean(bool),
    /// A compound field re-decoded into its own record set.
    Records(RecordSet),
}

impl FieldValue {
    /// Returns the text, if this is a `Text` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer, if this is an `Integer` value.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the flag, if this is a `Boolean` value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the nested records, if this is a compound field.
    pub fn as_records(&self) -> Option<&RecordSet> {
        match self {
            FieldValue::Records(set) => Some(set),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<RecordSet> for FieldValue {
    fn from(value: RecordSet) -> Self {
        FieldValue::Records(value)
    }
}
