//! Typed record model
//!
//! Each record kind declares its attributes once through [`record_kind!`];
//! a [`Record`] then holds one value slot per declared attribute.
//!
//! [`record_kind!`]: crate::record_kind

mod instance;
mod macros;
pub mod schema;

pub use instance::{FieldId, Record, RecordIter, RecordKind};
pub use schema::{AttributeDef, AttributeProperties, Properties, Schema};
