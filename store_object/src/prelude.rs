//! Convenience re-exports for common store-object usage

// Records
pub use crate::record::{AttributeDef, FieldId, Properties, Record, RecordKind, Schema};
pub use crate::record_kind;

// Mappers
pub use crate::mapper::{CachedMapper, Mapper, RecordStore};

// Bulk engine
pub use crate::bulk::{BulkDb, BulkOptions, BulkRow};

// Database executor
pub use crate::executor::{DatabaseExecutor, PgExecutor};

// Error types
pub use crate::errors::{BulkError, RecordError, StoreError};

// Validation
pub use crate::validation::{ValidatedFieldName, ValidatedTableName, ValidationError};

// Cache params (re-exported from cache_system)
pub use crate::CacheParams;

// Value model
pub use type_mapping::{FieldType, RowMap, SqlValue};

// Common external dependencies that are frequently used
pub use async_trait::async_trait;
pub use sqlx::PgPool;
