use crate::validation::ValidationError;
use thiserror::Error;
use type_mapping::CoercionError;

/// Failure raised while assigning values to a record
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("Unknown attribute: {attribute}")]
    UnknownAttribute { attribute: String },

    #[error("Invalid value for {attribute}: {source}")]
    InvalidValue {
        attribute: String,
        #[source]
        source: CoercionError,
    },

    #[error("Attribute {attribute} cannot be null")]
    NullValue { attribute: String },
}

impl RecordError {
    /// Error kind tag handed to the HTTP boundary
    pub fn error_type(&self) -> &'static str {
        match self {
            RecordError::UnknownAttribute { .. } => "AttributeError",
            RecordError::InvalidValue { .. } => "ValueError",
            RecordError::NullValue { .. } => "NullError",
        }
    }

    /// Name of the offending attribute
    pub fn attribute(&self) -> &str {
        match self {
            RecordError::UnknownAttribute { attribute }
            | RecordError::InvalidValue { attribute, .. }
            | RecordError::NullValue { attribute } => attribute,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BulkError {
    #[error("Block size must be greater than 0")]
    InvalidBlockSize,

    #[error("Rows in one batch must be all positional or all named")]
    MixedRows,

    #[error("Invalid template: {0}")]
    Template(String),

    #[error("Row {row} has {found} values but the template expects {expected}")]
    TemplateMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Row {row} is missing column {column}")]
    MissingColumn { row: usize, column: String },

    #[error("Invalid update key: {0}")]
    InvalidKey(String),

    #[error("Bulk update requires named rows")]
    PositionalUpdate,

    #[error("Statement would bind {count} parameters (limit {limit})")]
    TooManyParameters { count: usize, limit: usize },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Bulk(#[from] BulkError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("No value to filter {table} by {column}")]
    MissingWhereValue { table: String, column: String },

    #[error("Nothing to update in {0}")]
    EmptyUpdate(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}
