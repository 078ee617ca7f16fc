//! Serialization utilities
//!
//! This module renders values as inline SQL literals (for bulk statements)
//! and as plain JSON (for API responses).

use crate::types::SqlValue;
use chrono::SecondsFormat;
use std::fmt::Write;

impl SqlValue {
    /// Render this value as a PostgreSQL literal that can be spliced into a
    /// statement. Strings are quoted with doubled single quotes; typed
    /// literals carry an explicit cast.
    pub fn to_sql_literal(&self) -> String {
        match self {
            SqlValue::Integer(i) => i.to_string(),
            SqlValue::Numeric(f) => {
                if f.is_nan() {
                    "'NaN'::float8".to_string()
                } else if f.is_infinite() {
                    if *f > 0.0 {
                        "'Infinity'::float8".to_string()
                    } else {
                        "'-Infinity'::float8".to_string()
                    }
                } else {
                    f.to_string()
                }
            }
            SqlValue::Text(s) => quote(s),
            SqlValue::Binary(bytes) => format!("'\\x{}'::bytea", hex(bytes)),
            SqlValue::Boolean(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
            SqlValue::Timestamp(ts) => {
                format!("'{}'::timestamptz", ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            SqlValue::Date(date) => format!("'{}'::date", date.format("%Y-%m-%d")),
            SqlValue::Interval(delta) => match delta.num_microseconds() {
                Some(micros) => format!("'{} microseconds'::interval", micros),
                None => format!("'{} milliseconds'::interval", delta.num_milliseconds()),
            },
            SqlValue::Json(doc) => format!("{}::jsonb", quote(&doc.to_string())),
            SqlValue::Array(items) => {
                if items.is_empty() {
                    "'{}'".to_string()
                } else {
                    let rendered: Vec<String> = items.iter().map(|v| v.to_sql_literal()).collect();
                    format!("ARRAY[{}]", rendered.join(", "))
                }
            }
            SqlValue::Null => "NULL".to_string(),
        }
    }

    /// Plain JSON view of this value, as returned to API callers
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            SqlValue::Integer(i) => Value::from(*i),
            // NaN and infinities have no JSON form and become null
            SqlValue::Numeric(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            SqlValue::Text(s) => Value::String(s.clone()),
            SqlValue::Binary(bytes) => Value::String(format!("\\x{}", hex(bytes))),
            SqlValue::Boolean(b) => Value::Bool(*b),
            SqlValue::Timestamp(ts) => {
                Value::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            SqlValue::Date(date) => Value::String(date.format("%Y-%m-%d").to_string()),
            SqlValue::Interval(delta) => serde_json::Number::from_f64(
                delta.num_milliseconds() as f64 / 1000.0,
            )
            .map(Value::Number)
            .unwrap_or(Value::Null),
            SqlValue::Json(doc) => doc.clone(),
            SqlValue::Array(items) => Value::Array(items.iter().map(|v| v.to_json()).collect()),
            SqlValue::Null => Value::Null,
        }
    }
}

fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('\'');
    for c in text.chars() {
        if c == '\'' {
            quoted.push('\'');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{:02x}", byte);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, NaiveDate, TimeDelta};
    use serde_json::json;

    #[test]
    fn test_text_literal_escapes_quotes() {
        assert_eq!(SqlValue::from("it's").to_sql_literal(), "'it''s'");
        assert_eq!(
            SqlValue::from("'; DROP TABLE users; --").to_sql_literal(),
            "'''; DROP TABLE users; --'"
        );
    }

    #[test]
    fn test_scalar_literals() {
        assert_eq!(SqlValue::Integer(-3).to_sql_literal(), "-3");
        assert_eq!(SqlValue::Numeric(1.5).to_sql_literal(), "1.5");
        assert_eq!(SqlValue::Numeric(f64::NAN).to_sql_literal(), "'NaN'::float8");
        assert_eq!(SqlValue::Boolean(true).to_sql_literal(), "TRUE");
        assert_eq!(SqlValue::Null.to_sql_literal(), "NULL");
        assert_eq!(
            SqlValue::Binary(vec![0x0a, 0xff]).to_sql_literal(),
            "'\\x0aff'::bytea"
        );
    }

    #[test]
    fn test_temporal_literals() {
        let ts = DateTime::from_timestamp(0, 0).unwrap();
        assert_eq!(
            SqlValue::Timestamp(ts).to_sql_literal(),
            "'1970-01-01T00:00:00Z'::timestamptz"
        );
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(SqlValue::Date(date).to_sql_literal(), "'2024-02-29'::date");
        assert_eq!(
            SqlValue::Interval(TimeDelta::seconds(2)).to_sql_literal(),
            "'2000000 microseconds'::interval"
        );
    }

    #[test]
    fn test_composite_literals() {
        assert_eq!(
            SqlValue::Json(json!({"k": "it's"})).to_sql_literal(),
            r#"'{"k":"it''s"}'::jsonb"#
        );
        assert_eq!(
            SqlValue::Array(vec![SqlValue::Integer(1), SqlValue::Integer(2)]).to_sql_literal(),
            "ARRAY[1, 2]"
        );
        assert_eq!(SqlValue::Array(vec![]).to_sql_literal(), "'{}'");
    }

    #[test]
    fn test_json_view() {
        assert_eq!(SqlValue::Integer(1).to_json(), json!(1));
        assert_eq!(SqlValue::Null.to_json(), json!(null));
        assert_eq!(SqlValue::Numeric(f64::INFINITY).to_json(), json!(null));
        assert_eq!(
            SqlValue::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()).to_json(),
            json!("2024-01-01")
        );
        assert_eq!(
            SqlValue::Interval(TimeDelta::milliseconds(1500)).to_json(),
            json!(1.5)
        );
    }
}
