//! Bulk block engine
//!
//! [`BulkDb`] splits a row list into chunks of at most `block` rows and
//! runs one statement per chunk, strictly in order. There is no atomicity
//! across chunks: when a chunk fails, the chunks before it stay committed
//! and the rest are not issued.

mod block;
mod template;

pub use block::{Block, BlockList, BlockUpdate, BulkStatement, MAX_PARAMETERS};
pub use template::{BulkRow, Fields, RowTemplate};

use crate::errors::{BulkError, StoreError};
use crate::executor::DatabaseExecutor;
use config::BulkConfig;
use std::sync::Arc;
use type_mapping::RowMap;

pub const DEFAULT_BLOCK_SIZE: usize = 3000;

/// Chunk size and whether to collect returned rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkOptions {
    pub block: usize,
    pub ret: bool,
}

impl BulkOptions {
    pub fn new(block: usize) -> Self {
        Self { block, ret: false }
    }

    /// Collect the rows each chunk returns
    pub fn returning(mut self) -> Self {
        self.ret = true;
        self
    }
}

impl Default for BulkOptions {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_SIZE)
    }
}

/// Chunked bulk insert and update runner
#[derive(Debug, Clone)]
pub struct BulkDb {
    executor: Arc<dyn DatabaseExecutor>,
    defaults: BulkOptions,
}

impl BulkDb {
    pub fn new(executor: Arc<dyn DatabaseExecutor>) -> Self {
        Self {
            executor,
            defaults: BulkOptions::default(),
        }
    }

    pub fn from_config(executor: Arc<dyn DatabaseExecutor>, config: &BulkConfig) -> Self {
        Self {
            executor,
            defaults: BulkOptions::new(config.block_size),
        }
    }

    /// Options using the configured block size
    pub fn options(&self) -> BulkOptions {
        self.defaults
    }

    /// Insert `data` through [`Block`] statements
    pub async fn insert(
        &self,
        header: &str,
        template: &str,
        data: &[BulkRow],
        options: BulkOptions,
    ) -> Result<Vec<RowMap>, StoreError> {
        let template = RowTemplate::parse(template)?;
        let blocks = chunk(data, options.block)?
            .map(|rows| Block::with_template(header, template.clone(), rows, options.ret))
            .collect::<Result<Vec<_>, _>>()?;
        self.run("BULK_INSERT", &blocks).await
    }

    /// Insert `data` through parameter-bound [`BlockList`] statements
    pub async fn insert_list(
        &self,
        header: &str,
        template: &str,
        data: &[BulkRow],
        options: BulkOptions,
    ) -> Result<Vec<RowMap>, StoreError> {
        let template = RowTemplate::parse(template)?;
        let blocks = chunk(data, options.block)?
            .map(|rows| BlockList::with_template(header, template.clone(), rows, options.ret))
            .collect::<Result<Vec<_>, _>>()?;
        self.run("BULK_INSERT_LIST", &blocks).await
    }

    /// Update rows matched on `keys` through [`BlockUpdate`] statements
    pub async fn update(
        &self,
        header: &str,
        template: &str,
        data: &[BulkRow],
        keys: &[&str],
        update_cols: Option<&[&str]>,
        options: BulkOptions,
    ) -> Result<Vec<RowMap>, StoreError> {
        let template = RowTemplate::parse(template)?;
        let blocks = chunk(data, options.block)?
            .map(|rows| {
                BlockUpdate::with_template(header, template.clone(), rows, keys, update_cols, options.ret)
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.run("BULK_UPDATE", &blocks).await
    }

    async fn run<B: BulkStatement>(&self, operation: &str, blocks: &[B]) -> Result<Vec<RowMap>, StoreError> {
        let mut returned = Vec::new();
        for (index, block) in blocks.iter().enumerate() {
            tracing::debug!(
                "[{}] Chunk {}/{}: {} rows",
                operation,
                index + 1,
                blocks.len(),
                block.row_count()
            );
            match block.execute(self.executor.as_ref()).await {
                Ok(rows) => returned.extend(rows),
                Err(e) => {
                    tracing::warn!(
                        "[{}] Chunk {}/{} failed, {} chunks committed: {}",
                        operation,
                        index + 1,
                        blocks.len(),
                        index,
                        e
                    );
                    return Err(e);
                }
            }
        }
        Ok(returned)
    }
}

/// Contiguous chunks of at most `block` rows. Every row of the batch must
/// share one shape, not just the rows of each chunk.
fn chunk(data: &[BulkRow], block: usize) -> Result<std::slice::Chunks<'_, BulkRow>, BulkError> {
    if block == 0 {
        return Err(BulkError::InvalidBlockSize);
    }
    if let Some(first) = data.first() {
        if data.iter().any(|row| row.is_named() != first.is_named()) {
            return Err(BulkError::MixedRows);
        }
    }
    Ok(data.chunks(block))
}

#[cfg(test)]
mod tests;
