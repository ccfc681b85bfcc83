// vouch-core/src/domain/batch/value.rs

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::schema::ScalarType;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A single cell. `Null` stands for both SQL NULL and an empty CSV field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Double(f64),
    Boolean(bool),
    Timestamp(NaiveDateTime),
    String(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn scalar_type(&self) -> Option<ScalarType> {
        match self {
            Value::Null => None,
            Value::Integer(_) => Some(ScalarType::Integer),
            Value::Double(_) => Some(ScalarType::Double),
            Value::Boolean(_) => Some(ScalarType::Boolean),
            Value::Timestamp(_) => Some(ScalarType::Timestamp),
            Value::String(_) => Some(ScalarType::String),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Equality that treats `1` and `1.0` as the same value.
    pub fn loosely_eq(&self, other: &Value) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }

    pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
            .ok()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Double(d) => write!(f, "{}", d),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Timestamp(ts) => write!(f, "{}", ts.format(TIMESTAMP_FORMAT)),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loose_numeric_equality() {
        assert!(Value::Integer(1).loosely_eq(&Value::Double(1.0)));
        assert!(!Value::Integer(1).loosely_eq(&Value::String("1".into())));
        assert!(Value::from("a").loosely_eq(&Value::from("a")));
    }

    #[test]
    fn test_timestamp_parsing() {
        let ts = Value::parse_timestamp("2019-01-01 00:46:40");
        assert!(ts.is_some());
        assert!(Value::parse_timestamp("2019-01-01T00:46:40").is_some());
        assert!(Value::parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(4_i64)), Value::Integer(4));
    }
}
