//! Cache capability
//!
//! The mapper only needs two operations from a cache: fetch a value by key
//! and store a value with a time-to-live. Every backend implements this trait.

use crate::errors::CacheError;
use async_trait::async_trait;
use std::fmt::Debug;

/// Key/value store holding serialized rows
#[async_trait]
pub trait RowCache: Send + Sync + Debug {
    /// Fetch the value stored under `key`, `None` when absent or expired
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value` under `key` for `ttl` seconds
    async fn set(&self, key: &str, value: &str, ttl: u64) -> Result<(), CacheError>;

    /// Remove `key`, returning whether it was present
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;
}

/// Build the cache key for a single-column select.
///
/// `args` is the JSON rendering of the bound argument tuple so that two
/// selects with equal arguments always share a key.
pub fn select_key(prefix: &str, table_name: &str, where_column: &str, args: &str) -> String {
    format!("{}:{}:select:{}:{}", prefix, table_name, where_column, args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_key_layout() {
        assert_eq!(
            select_key("rowhaus", "business", "id", "[1]"),
            "rowhaus:business:select:id:[1]"
        );
    }
}
