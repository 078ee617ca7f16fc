//! Core RowHaus functionality
//!
//! This module contains the main RowHaus struct, which owns the database
//! executor and the optional select cache and hands out mappers and the
//! bulk engine bound to them.

use std::sync::Arc;

use cache_system::CacheParams;
use config::AppConfig;
use store_object::bulk::BulkDb;
use store_object::executor::{DatabaseExecutor, PgExecutor};
use store_object::mapper::{CachedMapper, Mapper, RecordStore};
use store_object::record::RecordKind;

use crate::errors::RowHausError;

/// Main RowHaus coordinator
#[derive(Debug, Clone)]
pub struct RowHaus {
    executor: Arc<dyn DatabaseExecutor>,
    cache: Option<CacheParams>,
    config: AppConfig,
}

impl RowHaus {
    /// Connect to the database and build the cache backend named in `config`
    pub async fn new(config: AppConfig) -> Result<Self, RowHausError> {
        let executor = PgExecutor::connect(&config.database).await?;
        Self::with_executor(Arc::new(executor), config)
    }

    /// Use an existing executor instead of opening a pool
    pub fn with_executor(
        executor: Arc<dyn DatabaseExecutor>,
        config: AppConfig,
    ) -> Result<Self, RowHausError> {
        let cache = CacheParams::from_config(&config.cache)?;
        match &cache {
            Some(params) => tracing::info!(
                "[ROWHAUS] Select cache enabled: {:?}, ttl {}s",
                config.cache.backend,
                params.ttl
            ),
            None => tracing::info!("[ROWHAUS] Select cache disabled"),
        }
        Ok(Self {
            executor,
            cache,
            config,
        })
    }

    pub fn executor(&self) -> &Arc<dyn DatabaseExecutor> {
        &self.executor
    }

    pub fn cache(&self) -> Option<&CacheParams> {
        self.cache.as_ref()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Uncached mapper for `table_name`
    pub fn mapper<K: RecordKind>(&self, table_name: &str) -> Result<Mapper<K>, RowHausError> {
        crate::debug_log!("[ROWHAUS] Mapper for table {}", table_name);
        Ok(Mapper::new(Arc::clone(&self.executor), table_name)?)
    }

    /// Mapper whose selects go through the configured cache
    pub fn cached_mapper<K: RecordKind>(
        &self,
        table_name: &str,
    ) -> Result<CachedMapper<K>, RowHausError> {
        let cache = self.cache.clone().ok_or(RowHausError::CacheDisabled)?;
        Ok(CachedMapper::new(self.mapper(table_name)?, cache))
    }

    /// Cached mapper when a cache is configured, plain mapper otherwise
    pub fn store<K: RecordKind>(
        &self,
        table_name: &str,
    ) -> Result<Box<dyn RecordStore<K>>, RowHausError> {
        Ok(match self.cache {
            Some(_) => Box::new(self.cached_mapper::<K>(table_name)?),
            None => Box::new(self.mapper::<K>(table_name)?),
        })
    }

    /// Bulk engine using the configured block size
    pub fn bulk(&self) -> BulkDb {
        crate::trace_log!("[ROWHAUS] Bulk engine, block size {}", self.config.bulk.block_size);
        BulkDb::from_config(Arc::clone(&self.executor), &self.config.bulk)
    }

    /// Check database connection health
    pub async fn health_check(&self) -> Result<(), RowHausError> {
        self.executor.fetch_one("SELECT 1", &[]).await?;
        Ok(())
    }
}
