//! # auth-adapters
//!
//! Identity plumbing behind the domain ports: Argon2 password hashing,
//! HMAC forgery-protection tokens and (feature `auth-jwt`) signed session
//! tokens carried in a cookie.

pub mod csrf;
#[cfg(feature = "auth-jwt")]
pub mod jwt;
pub mod password;

pub use csrf::HmacCsrfGuard;
#[cfg(feature = "auth-jwt")]
pub use jwt::{Claims, JwtSessions};
pub use password::Argon2Hasher;
