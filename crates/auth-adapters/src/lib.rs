//! # auth-adapters
//!
//! Password hashing with Argon2id and, behind `auth-jwt`, signed session
//! tokens with an in-process revocation list.

pub mod password;

#[cfg(feature = "auth-jwt")]
pub mod jwt;

pub use password::Argon2Hasher;

#[cfg(feature = "auth-jwt")]
pub use jwt::JwtSessions;
