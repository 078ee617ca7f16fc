//! Error types for the RowHaus crate
//!
//! This module contains all error types that can be returned by RowHaus operations.

use cache_system::CacheError;
use config::ConfigError;
use store_object::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RowHausError {
    #[error("Database connection error: {0}")]
    DatabaseConnection(#[from] sqlx::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Cache setup error: {0}")]
    Cache(#[from] CacheError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Caching is disabled in the configuration")]
    CacheDisabled,
}
