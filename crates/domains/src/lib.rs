//! storytime/crates/domains/src/lib.rs
//!
//! The central domain logic and interface definitions for Storytime.
//! Nothing in here performs I/O; adapters implement the ports.

pub mod access;
pub mod catalog;
pub mod errors;
pub mod media;
pub mod models;
pub mod optimistic;
pub mod ports;
pub mod validation;

// Re-exporting for easier access in other crates
pub use access::*;
pub use catalog::*;
pub use errors::*;
pub use media::*;
pub use models::*;
pub use optimistic::*;
pub use ports::*;
