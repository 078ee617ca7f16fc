//! Cache failures
//!
//! Mappers log these and fall back to the database, so a cache error never
//! fails a select.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    ConnectionError(#[from] redis::RedisError),

    #[error("Cached value is not valid JSON: {0}")]
    InvalidEntry(#[from] serde_json::Error),

    #[error("Cache operation timed out")]
    Timeout,

    #[error("TTL must be positive, got {0}")]
    InvalidTtl(u64),
}
