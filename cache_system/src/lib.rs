//! Cache system for select results
//!
//! This crate provides the cache capability consumed by mappers,
//! with Redis and in-process backends.

pub mod errors;
pub mod manager;
pub mod memory;
pub mod params;
pub mod prelude;
pub mod store;

// Re-export centralized config
pub use config::{CacheBackend, CacheConfig};

pub use errors::CacheError;
pub use manager::CacheManager;
pub use memory::MemoryCache;
pub use params::CacheParams;
pub use store::{select_key, RowCache};
