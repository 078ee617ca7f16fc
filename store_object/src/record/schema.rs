//! Attribute declarations
//!
//! A [`Schema`] is the ordered list of typed attributes one record kind
//! declares. It is built once per kind and shared by every record of it.

use crate::validation::{ValidatedFieldName, ValidationError};
use serde::{Serialize, Serializer};
use type_mapping::{FieldType, SqlValue};

/// One declared attribute
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDef {
    name: &'static str,
    field_type: FieldType,
    nullable: bool,
    has_default: bool,
    read_only: bool,
    default: Option<SqlValue>,
}

impl AttributeDef {
    /// A nullable, writable attribute with no default
    pub fn new(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            nullable: true,
            has_default: false,
            read_only: false,
            default: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// The database fills this column when it is omitted
    pub fn has_default(mut self) -> Self {
        self.has_default = true;
        self
    }

    /// Excluded from INSERT and UPDATE column lists
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Initial value a fresh record starts with
    pub fn with_default(mut self, value: impl Into<SqlValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_defaulted(&self) -> bool {
        self.has_default
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn default_value(&self) -> Option<&SqlValue> {
        self.default.as_ref()
    }

    pub fn properties(&self) -> AttributeProperties {
        AttributeProperties {
            name: self.name,
            type_tag: self.field_type.tag(),
            unit: self.field_type.base_unit(),
            nullable: self.nullable,
            has_default: self.has_default,
            read_only: self.read_only,
        }
    }
}

/// Ordered attribute declarations of one record kind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    attributes: Vec<AttributeDef>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attribute. Re-declaring a known name is a no-op.
    pub fn declare(&mut self, attribute: AttributeDef) -> &mut Self {
        if self.position(attribute.name).is_none() {
            self.attributes.push(attribute);
        }
        self
    }

    /// Builder form of [`Schema::declare`]
    pub fn with(mut self, attribute: AttributeDef) -> Self {
        self.declare(attribute);
        self
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|attr| attr.name == name)
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeDef> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    pub fn attributes(&self) -> &[AttributeDef] {
        &self.attributes
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Check every attribute name is a usable column identifier
    pub fn validate(&self) -> Result<(), ValidationError> {
        for attr in &self.attributes {
            ValidatedFieldName::new(attr.name)?;
        }
        Ok(())
    }

    pub fn describe(&self) -> Properties {
        Properties(self.attributes.iter().map(AttributeDef::properties).collect())
    }
}

/// Capability listing of one attribute
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeProperties {
    #[serde(skip)]
    pub name: &'static str,
    #[serde(rename = "type")]
    pub type_tag: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
    pub nullable: bool,
    pub has_default: bool,
    pub read_only: bool,
}

/// Capability listing of a record kind, serialized as a map keyed by
/// attribute name in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct Properties(Vec<AttributeProperties>);

impl Properties {
    pub fn get(&self, name: &str) -> Option<&AttributeProperties> {
        self.0.iter().find(|prop| prop.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeProperties> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Properties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|prop| (prop.name, prop)))
    }
}
