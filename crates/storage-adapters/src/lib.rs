//! # storage-adapters
//!
//! Implementations of the persistence and media ports.
//!
//! - [`memory::MemoryStore`] is always available and backs tests and local runs.
//! - `postgres::PgStore` is enabled by the `db-postgres` feature.
//! - `media_local::LocalMediaStorage` is enabled by the `media-local` feature.

pub mod memory;

#[cfg(feature = "db-postgres")]
pub mod postgres;

#[cfg(feature = "media-local")]
pub mod media_local;

pub use memory::MemoryStore;

#[cfg(feature = "db-postgres")]
pub use postgres::PgStore;

#[cfg(feature = "media-local")]
pub use media_local::LocalMediaStorage;
