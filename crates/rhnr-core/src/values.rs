use std::cmp::Ordering;
use std::fmt;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// A single cell value lifted out of a frame.
///
/// Ordering is total: booleans, then numbers, then text, with nulls last.
/// Integers and floats compare numerically with each other.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Null,
}

impl FieldValue {
    fn rank(&self) -> u8 {
        match self {
            FieldValue::Bool(_) => 0,
            FieldValue::Int(_) | FieldValue::Float(_) => 1,
            FieldValue::Text(_) => 2,
            FieldValue::Null => 3,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }
}

impl Ord for FieldValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a.cmp(b),
            (FieldValue::Int(a), FieldValue::Int(b)) => a.cmp(b),
            (FieldValue::Float(a), FieldValue::Float(b)) => a.total_cmp(b),
            (FieldValue::Int(a), FieldValue::Float(b)) => (*a as f64).total_cmp(b),
            (FieldValue::Float(a), FieldValue::Int(b)) => a.total_cmp(&(*b as f64)),
            (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for FieldValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FieldValue {}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(value) => write!(f, "{value}"),
            FieldValue::Int(value) => write!(f, "{value}"),
            FieldValue::Float(value) => write!(f, "{value}"),
            FieldValue::Text(value) => f.write_str(value),
            FieldValue::Null => Ok(()),
        }
    }
}

impl From<AnyValue<'_>> for FieldValue {
    fn from(value: AnyValue<'_>) -> Self {
        match value {
            AnyValue::Null => FieldValue::Null,
            AnyValue::Boolean(value) => FieldValue::Bool(value),
            AnyValue::Int8(value) => FieldValue::Int(i64::from(value)),
            AnyValue::Int16(value) => FieldValue::Int(i64::from(value)),
            AnyValue::Int32(value) => FieldValue::Int(i64::from(value)),
            AnyValue::Int64(value) => FieldValue::Int(value),
            AnyValue::UInt8(value) => FieldValue::Int(i64::from(value)),
            AnyValue::UInt16(value) => FieldValue::Int(i64::from(value)),
            AnyValue::UInt32(value) => FieldValue::Int(i64::from(value)),
            AnyValue::UInt64(value) => FieldValue::Int(value as i64),
            AnyValue::Float32(value) => FieldValue::Float(f64::from(value)),
            AnyValue::Float64(value) => FieldValue::Float(value),
            AnyValue::String(value) => FieldValue::Text(value.to_string()),
            AnyValue::StringOwned(value) => FieldValue::Text(value.to_string()),
            other => FieldValue::Text(other.to_string()),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// Parses user-supplied filter text into a value of the column's type.
/// Returns `None` when the text does not fit the type.
pub fn parse_for_dtype(raw: &str, dtype: &DataType) -> Option<FieldValue> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("null") {
        return Some(FieldValue::Null);
    }
    match dtype {
        DataType::Boolean => match trimmed.to_lowercase().as_str() {
            "true" | "1" | "sim" | "yes" => Some(FieldValue::Bool(true)),
            "false" | "0" | "não" | "nao" | "no" => Some(FieldValue::Bool(false)),
            _ => None,
        },
        DataType::Int32 | DataType::Int64 | DataType::UInt32 | DataType::UInt64 => {
            trimmed.parse::<i64>().ok().map(FieldValue::Int)
        }
        DataType::Float32 | DataType::Float64 => trimmed.parse::<f64>().ok().map(FieldValue::Float),
        _ => Some(FieldValue::Text(raw.to_string())),
    }
}
