//! Store Object - Core data-access layer for rowhaus
//!
//! This crate provides typed records, the SQL builder, the generic mapper
//! with its read-through cache, and the chunked bulk engine.

pub mod bulk;
pub mod errors;
pub mod executor;
pub mod mapper;
pub mod prelude;
pub mod record;
pub mod sql_builder;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;

pub use bulk::{Block, BlockList, BlockUpdate, BulkDb, BulkOptions, BulkRow};
pub use cache_system::CacheParams;
pub use errors::{BulkError, RecordError, StoreError};
pub use executor::{DatabaseExecutor, PgExecutor};
pub use mapper::{CachedMapper, Mapper, RecordStore, Statement};
pub use record::{FieldId, Record, RecordKind, Schema};
pub use sql_builder::SqlBuilder;
pub use validation::{ValidatedFieldName, ValidatedTableName, ValidationError};

pub use type_mapping::{FieldType, RowMap, SqlValue};

use sqlx::PgPool;

pub type DbPool = PgPool;
