//! Cache parameter configuration
//!
//! This module defines the CacheParams struct
//! for configuring cache behavior and TTL settings.

use crate::errors::CacheError;
use crate::manager::CacheManager;
use crate::memory::MemoryCache;
use crate::store::RowCache;
use config::{CacheBackend, CacheConfig};
use std::sync::Arc;

/// Cache parameters for configuring cache behavior per mapper
#[derive(Debug, Clone)]
pub struct CacheParams {
    /// The backing store
    pub cache: Arc<dyn RowCache>,
    /// TTL for cached rows in seconds
    pub ttl: u64,
    /// Prefix for cache keys
    pub prefix: String,
}

impl CacheParams {
    pub fn new(cache: Arc<dyn RowCache>, ttl: u64, prefix: &str) -> Self {
        Self {
            cache,
            ttl,
            prefix: prefix.to_string(),
        }
    }

    /// Build the backend named in `config`; `None` when caching is disabled
    pub fn from_config(config: &CacheConfig) -> Result<Option<Self>, CacheError> {
        let cache: Arc<dyn RowCache> = match config.backend {
            CacheBackend::Disabled => return Ok(None),
            CacheBackend::Memory => Arc::new(MemoryCache::new(config.max_entries)),
            CacheBackend::Redis => Arc::new(CacheManager::new(config.clone())?),
        };
        Ok(Some(Self::new(cache, config.default_ttl, &config.key_prefix)))
    }
}
