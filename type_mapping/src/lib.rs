//! Unified value model between records and PostgreSQL
//! This crate provides the scalar values, declared attribute types and
//! coercion rules used across the rowhaus ecosystem

pub mod serialize;
pub mod sql;
pub mod types;
pub mod validate;

pub use sql::FieldType;
pub use types::{RowMap, SqlValue};
pub use validate::CoercionError;
