//! Value coercion
//!
//! This module converts caller-supplied values into the kind an attribute
//! declares. Temporal types are never parsed from text.

use crate::sql::FieldType;
use crate::types::SqlValue;
use chrono::NaiveTime;
use thiserror::Error;

/// Reason a value could not be coerced to a declared type
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoercionError {
    #[error("cannot convert {found} to {expected}")]
    Incompatible {
        expected: &'static str,
        found: &'static str,
    },

    #[error("'{input}' is not a valid {expected}")]
    Unparsable { expected: &'static str, input: String },

    #[error("{value} is out of range for {expected}")]
    OutOfRange { expected: &'static str, value: String },
}

const TRUE_WORDS: &[&str] = &["true", "1", "yes", "y", "t", "on"];
const FALSE_WORDS: &[&str] = &["false", "0", "no", "n", "f", "off"];

impl FieldType {
    /// Coerce `value` to this type.
    ///
    /// The explicit-null sentinel passes through untouched; nullability is
    /// enforced by the record, not here. Arrays are coerced element-wise so
    /// list-valued filters keep their element type.
    pub fn coerce(&self, value: SqlValue) -> Result<SqlValue, CoercionError> {
        match value {
            SqlValue::Null => Ok(SqlValue::Null),
            SqlValue::Array(items) if !matches!(self, FieldType::Object) => items
                .into_iter()
                .map(|item| self.coerce(item))
                .collect::<Result<Vec<_>, _>>()
                .map(SqlValue::Array),
            value => match self {
                FieldType::Integer => to_integer(value),
                FieldType::Numeric | FieldType::Uom { .. } => to_numeric(self.tag(), value),
                FieldType::Text => match value {
                    SqlValue::Text(s) => Ok(SqlValue::Text(s)),
                    other => Err(incompatible(self, &other)),
                },
                FieldType::Binary => match value {
                    SqlValue::Binary(bytes) => Ok(SqlValue::Binary(bytes)),
                    SqlValue::Text(s) => Ok(SqlValue::Binary(s.into_bytes())),
                    other => Err(incompatible(self, &other)),
                },
                FieldType::Boolean => to_boolean(value),
                FieldType::Timestamp => match value {
                    SqlValue::Timestamp(ts) => Ok(SqlValue::Timestamp(ts)),
                    SqlValue::Date(date) => {
                        Ok(SqlValue::Timestamp(date.and_time(NaiveTime::MIN).and_utc()))
                    }
                    other => Err(incompatible(self, &other)),
                },
                FieldType::Date => match value {
                    SqlValue::Date(date) => Ok(SqlValue::Date(date)),
                    other => Err(incompatible(self, &other)),
                },
                FieldType::Interval => match value {
                    SqlValue::Interval(delta) => Ok(SqlValue::Interval(delta)),
                    other => Err(incompatible(self, &other)),
                },
                FieldType::Object => Ok(value),
            },
        }
    }
}

fn incompatible(field_type: &FieldType, value: &SqlValue) -> CoercionError {
    CoercionError::Incompatible {
        expected: field_type.tag(),
        found: value.kind(),
    }
}

fn to_integer(value: SqlValue) -> Result<SqlValue, CoercionError> {
    const EXPECTED: &str = "integer";
    match value {
        SqlValue::Integer(i) => Ok(SqlValue::Integer(i)),
        SqlValue::Numeric(f) => {
            // i64::MAX is not exactly representable; the upper bound is exclusive
            if f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 {
                Ok(SqlValue::Integer(f.trunc() as i64))
            } else {
                Err(CoercionError::OutOfRange {
                    expected: EXPECTED,
                    value: f.to_string(),
                })
            }
        }
        SqlValue::Text(s) => s
            .trim()
            .parse::<i64>()
            .map(SqlValue::Integer)
            .map_err(|_| CoercionError::Unparsable {
                expected: EXPECTED,
                input: s,
            }),
        SqlValue::Boolean(b) => Ok(SqlValue::Integer(i64::from(b))),
        other => Err(CoercionError::Incompatible {
            expected: EXPECTED,
            found: other.kind(),
        }),
    }
}

fn to_numeric(expected: &'static str, value: SqlValue) -> Result<SqlValue, CoercionError> {
    match value {
        SqlValue::Numeric(f) => Ok(SqlValue::Numeric(f)),
        SqlValue::Integer(i) => Ok(SqlValue::Numeric(i as f64)),
        SqlValue::Text(s) => s
            .trim()
            .parse::<f64>()
            .map(SqlValue::Numeric)
            .map_err(|_| CoercionError::Unparsable { expected, input: s }),
        SqlValue::Boolean(b) => Ok(SqlValue::Numeric(if b { 1.0 } else { 0.0 })),
        other => Err(CoercionError::Incompatible {
            expected,
            found: other.kind(),
        }),
    }
}

fn to_boolean(value: SqlValue) -> Result<SqlValue, CoercionError> {
    const EXPECTED: &str = "boolean";
    match value {
        SqlValue::Boolean(b) => Ok(SqlValue::Boolean(b)),
        SqlValue::Integer(i) => Ok(SqlValue::Boolean(i != 0)),
        SqlValue::Text(s) => {
            let lowered = s.trim().to_ascii_lowercase();
            if TRUE_WORDS.contains(&lowered.as_str()) {
                Ok(SqlValue::Boolean(true))
            } else if FALSE_WORDS.contains(&lowered.as_str()) {
                Ok(SqlValue::Boolean(false))
            } else {
                Err(CoercionError::Unparsable {
                    expected: EXPECTED,
                    input: s,
                })
            }
        }
        other => Err(CoercionError::Incompatible {
            expected: EXPECTED,
            found: other.kind(),
        }),
    }
}
