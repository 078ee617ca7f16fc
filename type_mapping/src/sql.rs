//! Declared attribute types
//!
//! This module maps the closed set of attribute types a record can declare
//! to their PostgreSQL counterparts.

use serde::Serialize;
use std::fmt;

/// Declared type of a record attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    Integer,
    Numeric,
    Text,
    Binary,
    Boolean,
    Timestamp,
    Date,
    Interval,
    /// A numeric quantity expressed in `base_unit`
    Uom { base_unit: &'static str },
    /// Opaque JSON document, stored as-is
    Object,
}

impl FieldType {
    /// Type tag reported by capability listings
    pub fn tag(&self) -> &'static str {
        match self {
            FieldType::Integer => "integer",
            FieldType::Numeric => "numeric",
            FieldType::Text => "text",
            FieldType::Binary => "binary",
            FieldType::Boolean => "boolean",
            FieldType::Timestamp => "timestamp",
            FieldType::Date => "date",
            FieldType::Interval => "time interval",
            FieldType::Uom { .. } => "Uom",
            FieldType::Object => "object",
        }
    }

    /// Base unit for unit-valued attributes
    pub fn base_unit(&self) -> Option<&'static str> {
        match self {
            FieldType::Uom { base_unit } => Some(base_unit),
            _ => None,
        }
    }

    /// PostgreSQL column type this attribute is stored as
    pub fn pg_type(&self) -> &'static str {
        match self {
            FieldType::Integer => "BIGINT",
            FieldType::Numeric | FieldType::Uom { .. } => "DOUBLE PRECISION",
            FieldType::Text => "TEXT",
            FieldType::Binary => "BYTEA",
            FieldType::Boolean => "BOOLEAN",
            FieldType::Timestamp => "TIMESTAMPTZ",
            FieldType::Date => "DATE",
            FieldType::Interval => "INTERVAL",
            FieldType::Object => "JSONB",
        }
    }

    /// Numeric columns may be stored as NUMERIC; they are projected as
    /// float8 so every driver hands back a plain float.
    pub fn projects_as_float(&self) -> bool {
        matches!(self, FieldType::Numeric | FieldType::Uom { .. })
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
