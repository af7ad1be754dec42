//! # api-adapters
//!
//! The server-rendered HTTP surface. Handlers translate requests into
//! service calls and service results into pages, redirects and flash
//! messages; they hold no business rules of their own.

pub mod metrics;
pub mod views;

#[cfg(feature = "web-axum")]
pub mod cookies;
#[cfg(feature = "web-axum")]
pub mod error;
#[cfg(feature = "web-axum")]
pub mod extractors;
#[cfg(feature = "web-axum")]
pub mod handlers;
#[cfg(feature = "web-axum")]
pub mod router;
#[cfg(feature = "web-axum")]
pub mod state;

pub use metrics::{Action, Metrics};

#[cfg(feature = "web-axum")]
pub use router::build_router;
#[cfg(feature = "web-axum")]
pub use state::AppState;
