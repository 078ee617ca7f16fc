//! Typed record values

use super::schema::{AttributeDef, Properties, Schema};
use crate::errors::RecordError;
use std::fmt;
use std::marker::PhantomData;
use type_mapping::{RowMap, SqlValue};

/// Closed set of attribute identifiers of one record kind
pub trait FieldId: Copy + fmt::Debug + Send + Sync + 'static {
    /// Declaration index of this attribute
    fn index(self) -> usize;

    fn name(self) -> &'static str;
}

/// A concrete kind of record: its schema plus conversion hooks
pub trait RecordKind: Send + Sync + 'static + Sized {
    type Field: FieldId;

    fn schema() -> &'static Schema;

    /// Applied before a record is turned into a statement
    fn to_db(record: Record<Self>) -> Result<Record<Self>, RecordError> {
        Ok(record)
    }

    /// Applied after a record is rebuilt from a returned row
    fn to_user(record: Record<Self>) -> Result<Record<Self>, RecordError> {
        Ok(record)
    }
}

/// One row of one logical table.
///
/// Each slot is `None` while unset; `Some(SqlValue::Null)` is an explicit
/// null, which is kept distinct from unset.
pub struct Record<K: RecordKind> {
    values: Vec<Option<SqlValue>>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: RecordKind> Record<K> {
    /// A record holding every attribute's declared default
    pub fn new() -> Self {
        Self {
            values: K::schema()
                .attributes()
                .iter()
                .map(|attr| attr.default_value().cloned())
                .collect(),
            _kind: PhantomData,
        }
    }

    /// A fresh record with `values` assigned through [`Record::set`]
    pub fn with_values<I, S, V>(values: I) -> Result<Self, RecordError>
    where
        I: IntoIterator<Item = (S, V)>,
        S: AsRef<str>,
        V: Into<SqlValue>,
    {
        let mut record = Self::new();
        record.update(values)?;
        Ok(record)
    }

    /// Rebuild a record from a database row. Values are trusted and stored
    /// as-is; columns the kind does not declare are ignored.
    pub fn from_row(row: RowMap) -> Self {
        let schema = K::schema();
        let mut record = Self::new();
        for (column, value) in row {
            if let Some(index) = schema.position(&column) {
                record.values[index] = Some(value);
            }
        }
        record
    }

    pub fn schema(&self) -> &'static Schema {
        K::schema()
    }

    /// Assign `value` to the attribute called `name`, coercing it to the
    /// declared type. The record is unchanged when this fails.
    pub fn set(&mut self, name: &str, value: impl Into<SqlValue>) -> Result<(), RecordError> {
        let index = K::schema()
            .position(name)
            .ok_or_else(|| RecordError::UnknownAttribute {
                attribute: name.to_string(),
            })?;
        self.assign(index, value.into())
    }

    pub fn set_field(&mut self, field: K::Field, value: impl Into<SqlValue>) -> Result<(), RecordError> {
        self.assign(field.index(), value.into())
    }

    fn assign(&mut self, index: usize, value: SqlValue) -> Result<(), RecordError> {
        let attr = &K::schema().attributes()[index];
        if holds_null(&value) && !attr.is_nullable() {
            return Err(RecordError::NullValue {
                attribute: attr.name().to_string(),
            });
        }
        let coerced = attr
            .field_type()
            .coerce(value)
            .map_err(|source| RecordError::InvalidValue {
                attribute: attr.name().to_string(),
                source,
            })?;
        self.values[index] = Some(coerced);
        Ok(())
    }

    /// Assign several attributes in order, stopping at the first failure
    pub fn update<I, S, V>(&mut self, values: I) -> Result<(), RecordError>
    where
        I: IntoIterator<Item = (S, V)>,
        S: AsRef<str>,
        V: Into<SqlValue>,
    {
        for (name, value) in values {
            self.set(name.as_ref(), value)?;
        }
        Ok(())
    }

    /// Return an attribute to the unset state
    pub fn unset(&mut self, field: K::Field) {
        self.values[field.index()] = None;
    }

    /// Unset every attribute
    pub fn clear(&mut self) {
        self.values.iter_mut().for_each(|value| *value = None);
    }

    /// Current value of `name`; `None` when unset or undeclared
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        K::schema()
            .position(name)
            .and_then(|index| self.values[index].as_ref())
    }

    pub fn field(&self, field: K::Field) -> Option<&SqlValue> {
        self.values[field.index()].as_ref()
    }

    /// Attributes in declaration order, optionally skipping read-only and
    /// unset ones. The iterator is `Clone`, so it can be restarted.
    pub fn iter(&self, include_read_only: bool, include_none: bool) -> RecordIter<'_> {
        RecordIter {
            attributes: K::schema().attributes().iter(),
            values: self.values.iter(),
            include_read_only,
            include_none,
        }
    }

    pub fn describe(&self) -> Properties {
        K::schema().describe()
    }

    /// True when every attribute still holds its declared default
    pub fn is_empty(&self) -> bool {
        K::schema()
            .attributes()
            .iter()
            .zip(&self.values)
            .all(|(attr, value)| attr.default_value() == value.as_ref())
    }

    /// Reject explicit nulls on non-nullable attributes
    pub fn check_nulls(&self) -> Result<(), RecordError> {
        for (attr, value) in K::schema().attributes().iter().zip(&self.values) {
            if !attr.is_nullable() && value.as_ref().is_some_and(holds_null) {
                return Err(RecordError::NullValue {
                    attribute: attr.name().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Reject non-nullable attributes that have neither a value nor a
    /// database default
    pub fn check_required(&self) -> Result<(), RecordError> {
        for (attr, value) in K::schema().attributes().iter().zip(&self.values) {
            let missing = value.as_ref().is_none_or(SqlValue::is_null);
            if missing && !attr.is_nullable() && !attr.is_defaulted() {
                return Err(RecordError::NullValue {
                    attribute: attr.name().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Set attributes as a JSON object
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .iter(true, false)
            .map(|(name, value)| {
                let json = value.map(SqlValue::to_json).unwrap_or(serde_json::Value::Null);
                (name.to_string(), json)
            })
            .collect();
        serde_json::Value::Object(map)
    }

    /// Set attributes as a row mapping
    pub fn to_row(&self) -> RowMap {
        self.iter(true, false)
            .filter_map(|(name, value)| value.map(|v| (name.to_string(), v.clone())))
            .collect()
    }
}

impl<K: RecordKind> Default for Record<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: RecordKind> Clone for Record<K> {
    fn clone(&self) -> Self {
        Self {
            values: self.values.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K: RecordKind> PartialEq for Record<K> {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl<K: RecordKind> fmt::Debug for Record<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter(true, false).map(|(name, value)| (name, value)))
            .finish()
    }
}

/// Iterator over `(name, value)` pairs of a record
#[derive(Clone)]
pub struct RecordIter<'a> {
    attributes: std::slice::Iter<'a, AttributeDef>,
    values: std::slice::Iter<'a, Option<SqlValue>>,
    include_read_only: bool,
    include_none: bool,
}

impl<'a> Iterator for RecordIter<'a> {
    type Item = (&'static str, Option<&'a SqlValue>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let attr = self.attributes.next()?;
            let value = self.values.next()?.as_ref();
            if !self.include_read_only && attr.is_read_only() {
                continue;
            }
            if !self.include_none && value.is_none() {
                continue;
            }
            return Some((attr.name(), value));
        }
    }
}

/// Explicit null, or a list with a null element
fn holds_null(value: &SqlValue) -> bool {
    match value {
        SqlValue::Array(items) => items.iter().any(SqlValue::is_null),
        other => other.is_null(),
    }
}
