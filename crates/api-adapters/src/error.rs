//! # ApiError
//!
//! The single error type returned by handlers. Domain failures map onto
//! status codes and a rendered error page; a missing session becomes a
//! redirect to the relevant login page.

use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use thiserror::Error;
use tracing::{error, warn};

use domains::DomainError;

use crate::views::{ErrorTemplate, PageMeta};

pub const LOGIN_PATH: &str = "/account/login";
pub const ADMIN_LOGIN_PATH: &str = "/admin/login";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("template rendering failed: {0}")]
    Render(#[from] askama::Error),

    #[error("missing or invalid form token")]
    Csrf,

    #[error("malformed form submission: {0}")]
    BadForm(String),

    #[error("login required")]
    LoginRequired { login_path: &'static str },
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::Domain(DomainError::Validation(msg)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, msg.clone())
            }
            ApiError::Domain(DomainError::NotFound { entity, .. }) => {
                (StatusCode::NOT_FOUND, format!("{entity} not found."))
            }
            ApiError::Domain(DomainError::Forbidden(_)) => (
                StatusCode::FORBIDDEN,
                "You are not allowed to do that.".to_string(),
            ),
            ApiError::Domain(DomainError::Conflict(msg)) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::Domain(DomainError::Unauthenticated) | ApiError::LoginRequired { .. } => (
                StatusCode::UNAUTHORIZED,
                "Please log in to continue.".to_string(),
            ),
            ApiError::Csrf => (
                StatusCode::FORBIDDEN,
                "Your form expired. Go back, reload the page and try again.".to_string(),
            ),
            ApiError::BadForm(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Domain(DomainError::Persistence(_))
            | ApiError::Domain(DomainError::Internal(_))
            | ApiError::Render(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong on our side.".to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::LoginRequired { login_path } => {
                return Redirect::to(login_path).into_response();
            }
            ApiError::Domain(DomainError::Unauthenticated) => {
                return Redirect::to(LOGIN_PATH).into_response();
            }
            ApiError::Domain(DomainError::Persistence(_))
            | ApiError::Domain(DomainError::Internal(_))
            | ApiError::Render(_) => error!(error = %self, "request failed"),
            _ => warn!(error = %self, "request rejected"),
        }

        let (status, message) = self.status_and_message();
        let page = ErrorTemplate {
            page: PageMeta::bare(status.canonical_reason().unwrap_or("Error")),
            status: status.as_u16(),
            message: message.clone(),
        };
        match page.render() {
            Ok(html) => (status, Html(html)).into_response(),
            Err(e) => {
                error!(error = %e, "failed to render error page");
                (status, message).into_response()
            }
        }
    }
}
