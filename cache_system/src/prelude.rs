//! Convenience re-exports for common cache-system usage

// Core cache system components
pub use crate::errors::CacheError;
pub use crate::manager::CacheManager;
pub use crate::memory::MemoryCache;
pub use crate::params::CacheParams;
pub use crate::store::RowCache;

// Re-export centralized config
pub use config::{CacheBackend, CacheConfig};
