//! Route handlers, grouped by area.

pub mod account;
pub mod admin;
pub mod feed;
pub mod health;
pub mod notices;
pub mod posts;

use crate::error::ApiError;
use domains::DomainError;

/// Fallback for unmatched routes.
pub async fn not_found() -> ApiError {
    DomainError::not_found("Page", "requested").into()
}
