use super::{Mapper, RecordStore, Statement};
use crate::errors::StoreError;
use crate::record::{Properties, Record, RecordKind};
use async_trait::async_trait;
use cache_system::{select_key, CacheParams};
use type_mapping::{RowMap, SqlValue};

/// Read-through cache in front of [`Mapper::select`].
///
/// A hit skips the database entirely. Only found rows are stored; cache
/// failures are logged and the call falls through to the database. Writes
/// do not evict cached rows, so a select after an update may return the
/// pre-update row until the entry expires.
#[derive(Debug, Clone)]
pub struct CachedMapper<K: RecordKind> {
    inner: Mapper<K>,
    cache: CacheParams,
}

impl<K: RecordKind> CachedMapper<K> {
    pub fn new(inner: Mapper<K>, cache: CacheParams) -> Self {
        Self { inner, cache }
    }

    pub fn inner(&self) -> &Mapper<K> {
        &self.inner
    }

    pub fn cache_params(&self) -> &CacheParams {
        &self.cache
    }

    /// Cache key for a prepared select
    pub fn cache_key(&self, where_column: &str, statement: &Statement) -> String {
        let args = serde_json::Value::Array(statement.args.iter().map(SqlValue::to_json).collect());
        select_key(
            &self.cache.prefix,
            self.inner.table_name(),
            where_column,
            &args.to_string(),
        )
    }

    async fn cached_row(&self, key: &str) -> Option<RowMap> {
        let text = match self.cache.cache.get(key).await {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("[CACHE] Read failed for {}: {}", key, e);
                return None;
            }
        };
        match serde_json::from_str(&text) {
            Ok(row) => Some(row),
            Err(e) => {
                tracing::warn!("[CACHE] Discarding unreadable entry {}: {}", key, e);
                None
            }
        }
    }

    async fn store_row(&self, key: &str, row: &RowMap) {
        if !row.values().all(SqlValue::is_json_safe) {
            tracing::debug!("[CACHE] Skipping {}: row holds a non-finite number", key);
            return;
        }
        let text = match serde_json::to_string(row) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("[CACHE] Could not serialize row for {}: {}", key, e);
                return;
            }
        };
        if let Err(e) = self.cache.cache.set(key, &text, self.cache.ttl).await {
            tracing::warn!("[CACHE] Write failed for {}: {}", key, e);
        }
    }
}

#[async_trait]
impl<K: RecordKind> RecordStore<K> for CachedMapper<K> {
    fn table_name(&self) -> &str {
        self.inner.table_name()
    }

    async fn insert(
        &self,
        record: Record<K>,
        forced_id: Option<SqlValue>,
    ) -> Result<Option<Record<K>>, StoreError> {
        self.inner.insert(record, forced_id).await
    }

    async fn select(&self, record: Record<K>, where_column: &str) -> Result<Option<Record<K>>, StoreError> {
        let statement = self.inner.prepare_select(record, where_column)?;
        let key = self.cache_key(where_column, &statement);

        if let Some(row) = self.cached_row(&key).await {
            tracing::debug!("[CACHE] Hit: {}", key);
            return Ok(Some(self.inner.rehydrate(row)?));
        }

        tracing::debug!(
            "[SELECT] Table: {}, Column: {}, Args: {}",
            self.inner.table_name(),
            where_column,
            statement.args.len()
        );
        match self.inner.fetch_row(&statement).await? {
            Some(row) => {
                self.store_row(&key, &row).await;
                Ok(Some(self.inner.rehydrate(row)?))
            }
            None => Ok(None),
        }
    }

    async fn select_all(&self, record: Record<K>, where_column: &str) -> Result<Vec<Record<K>>, StoreError> {
        self.inner.select_all(record, where_column).await
    }

    async fn update(&self, record: Record<K>, where_column: &str) -> Result<Option<Record<K>>, StoreError> {
        self.inner.update(record, where_column).await
    }

    async fn delete(&self, record: Record<K>, where_column: &str) -> Result<u64, StoreError> {
        self.inner.delete(record, where_column).await
    }

    fn get_properties(&self) -> Properties {
        self.inner.get_properties()
    }
}
