//! # RowHaus
//!
//! Typed records, a generic mapper with a read-through select cache, and
//! chunked bulk statements for PostgreSQL.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rowhaus::prelude::*;
//!
//! record_kind! {
//!     pub struct Business: BusinessField {
//!         Id("id", FieldType::Integer) [not_null, has_default, read_only];
//!         Username("username", FieldType::Text) [not_null];
//!         Email("email", FieldType::Text) [not_null];
//!         Phone("phone", FieldType::Text);
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let rowhaus = RowHaus::new(config).await?;
//!
//!     let businesses = rowhaus.store::<Business>("business")?;
//!
//!     let record = Record::<Business>::with_values([
//!         ("username", "alice"),
//!         ("email", "alice@example.com"),
//!     ])?;
//!     if let Some(created) = businesses.insert(record, None).await? {
//!         println!("Created business: {:?}", created.get("id"));
//!     }
//!
//!     let lookup = Record::<Business>::with_values([("username", "alice")])?;
//!     let found = businesses.select(lookup, "username").await?;
//!     println!("Found: {:?}", found);
//!
//!     let rows = vec![
//!         BulkRow::positional(["bob", "bob@example.com"]),
//!         BulkRow::positional(["carol", "carol@example.com"]),
//!     ];
//!     rowhaus
//!         .bulk()
//!         .insert("INSERT INTO business (username, email)", "({}, {})", &rows, BulkOptions::default())
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod core;
pub mod errors;
pub mod prelude;

// Re-export the main public types for convenience
pub use core::RowHaus;
pub use errors::RowHausError;

// Re-export centralized config
pub use config::{AppConfig, BulkConfig, CacheBackend, CacheConfig, DatabaseConfig};

// Re-export internal crates used by macros and public API
// These MUST be public for the generated macro code to work correctly
pub use cache_system;
pub use store_object;
pub use type_mapping;

// Re-export external dependencies used in public API
pub use async_trait;
pub use sqlx;
