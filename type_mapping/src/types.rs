//! Runtime value definitions
//!
//! This module provides the scalar value model shared by records,
//! the SQL builder and the bulk engine.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// One raw database row keyed by column name
pub type RowMap = HashMap<String, SqlValue>;

/// A single value travelling between a record and PostgreSQL.
///
/// `Null` is the explicit-null sentinel: a caller deliberately asked for
/// "no value". An attribute that was never assigned is represented by the
/// absence of a `SqlValue` (`Option::None`), never by `Null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    Integer(i64),
    Numeric(f64),
    Text(String),
    Binary(Vec<u8>),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
    Interval(#[serde(with = "interval_micros")] TimeDelta),
    Json(serde_json::Value),
    Array(Vec<SqlValue>),
    Null,
}

impl SqlValue {
    /// Whether this is the explicit-null sentinel
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Whether the value survives a JSON round trip. NaN and infinities
    /// serialize as `null` and cannot be read back.
    pub fn is_json_safe(&self) -> bool {
        match self {
            SqlValue::Numeric(f) => f.is_finite(),
            SqlValue::Array(items) => items.iter().all(SqlValue::is_json_safe),
            _ => true,
        }
    }

    /// Short name of the value kind, used in coercion errors
    pub fn kind(&self) -> &'static str {
        match self {
            SqlValue::Integer(_) => "integer",
            SqlValue::Numeric(_) => "numeric",
            SqlValue::Text(_) => "text",
            SqlValue::Binary(_) => "binary",
            SqlValue::Boolean(_) => "boolean",
            SqlValue::Timestamp(_) => "timestamp",
            SqlValue::Date(_) => "date",
            SqlValue::Interval(_) => "time interval",
            SqlValue::Json(_) => "object",
            SqlValue::Array(_) => "array",
            SqlValue::Null => "null",
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Numeric(f) => Some(*f),
            SqlValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SqlValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

mod interval_micros {
    use chrono::TimeDelta;
    use serde::{ser, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error> {
        let micros = value
            .num_microseconds()
            .ok_or_else(|| ser::Error::custom("interval overflows microsecond precision"))?;
        serializer.serialize_i64(micros)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TimeDelta, D::Error> {
        let micros = i64::deserialize(deserializer)?;
        Ok(TimeDelta::microseconds(micros))
    }
}

impl From<String> for SqlValue {
    fn from(val: String) -> Self {
        SqlValue::Text(val)
    }
}

impl From<&str> for SqlValue {
    fn from(val: &str) -> Self {
        SqlValue::Text(val.to_string())
    }
}

impl From<i64> for SqlValue {
    fn from(val: i64) -> Self {
        SqlValue::Integer(val)
    }
}

impl From<i32> for SqlValue {
    fn from(val: i32) -> Self {
        SqlValue::Integer(i64::from(val))
    }
}

impl From<i16> for SqlValue {
    fn from(val: i16) -> Self {
        SqlValue::Integer(i64::from(val))
    }
}

impl From<f64> for SqlValue {
    fn from(val: f64) -> Self {
        SqlValue::Numeric(val)
    }
}

impl From<f32> for SqlValue {
    fn from(val: f32) -> Self {
        SqlValue::Numeric(f64::from(val))
    }
}

impl From<bool> for SqlValue {
    fn from(val: bool) -> Self {
        SqlValue::Boolean(val)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(val: Vec<u8>) -> Self {
        SqlValue::Binary(val)
    }
}

impl From<Uuid> for SqlValue {
    fn from(val: Uuid) -> Self {
        SqlValue::Text(val.to_string())
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(val: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(val)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(val: NaiveDate) -> Self {
        SqlValue::Date(val)
    }
}

impl From<TimeDelta> for SqlValue {
    fn from(val: TimeDelta) -> Self {
        SqlValue::Interval(val)
    }
}

impl From<serde_json::Value> for SqlValue {
    fn from(val: serde_json::Value) -> Self {
        SqlValue::Json(val)
    }
}

impl From<Vec<SqlValue>> for SqlValue {
    fn from(val: Vec<SqlValue>) -> Self {
        SqlValue::Array(val)
    }
}

impl<T> From<Option<T>> for SqlValue
where
    T: Into<SqlValue>,
{
    fn from(val: Option<T>) -> Self {
        match val {
            Some(v) => v.into(),
            None => SqlValue::Null,
        }
    }
}
