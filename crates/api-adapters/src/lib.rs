//! # api-adapters
//!
//! The HTTP JSON surface. Handlers resolve the caller into a
//! [`services::Session`] per request and delegate to the services held in
//! [`AppState`].

pub mod metrics;

#[cfg(feature = "web-axum")]
pub mod error;
#[cfg(feature = "web-axum")]
pub mod extract;
#[cfg(feature = "web-axum")]
pub mod handlers;
#[cfg(feature = "web-axum")]
pub mod router;
#[cfg(feature = "web-axum")]
pub mod state;

pub use metrics::Metrics;

#[cfg(feature = "web-axum")]
pub use error::{ApiError, ApiResult};
#[cfg(feature = "web-axum")]
pub use router::{router, RouterSettings};
#[cfg(feature = "web-axum")]
pub use state::{AppState, Ports};
