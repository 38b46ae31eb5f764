//! Route handlers, grouped by resource.

pub mod account;
pub mod admin;
pub mod auth;
pub mod media;
pub mod stories;
pub mod system;
