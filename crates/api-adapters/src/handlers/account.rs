//! Registration, login and logout for regular users.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use serde::Deserialize;
use tracing::{info, warn};

use domains::{ActionOutcome, DomainError, Principal};
use services::Registration;

use crate::cookies::{self, SESSION_COOKIE};
use crate::error::{ApiError, LOGIN_PATH};
use crate::extractors::{CsrfForm, NoFields, Page};
use crate::metrics::Action;
use crate::state::AppState;
use crate::views::{LoginTemplate, RegisterTemplate};

#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    /// Username or email
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
}

/// Issues a session for `principal` and redirects with a welcome flash.
pub(crate) fn sign_in(
    state: &AppState,
    mut page: Page,
    principal: &Principal,
    to: &str,
    greeting: String,
) -> Result<Response, ApiError> {
    let (token, session_id) = state.services.accounts.start_session(principal)?;
    info!(user_id = %principal.user_id, %session_id, "session started");
    page.jar = page
        .jar
        .add(cookies::session(token, state.secure_cookies));
    Ok(page.redirect(to, &ActionOutcome::ok(greeting), state.secure_cookies))
}

/// Drops the session cookie and redirects with a goodbye flash.
pub(crate) fn sign_out(state: &AppState, mut page: Page, to: &str, message: &str) -> Response {
    if let Some(session) = &page.session {
        info!(user_id = %session.principal.user_id, "session ended");
    }
    page.jar = page.jar.remove(cookies::removal(SESSION_COOKIE));
    page.redirect(to, &ActionOutcome::ok(message), state.secure_cookies)
}

fn register_page(page: Page, form: &RegisterForm, error: Option<String>) -> Result<Response, ApiError> {
    let status = if error.is_some() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::OK
    };
    let template = RegisterTemplate {
        page: page.meta("Register"),
        username: form.username.clone(),
        email: form.email.clone(),
        error,
    };
    page.render(status, &template)
}

pub async fn register_form(page: Page) -> Result<Response, ApiError> {
    register_page(page, &RegisterForm::default(), None)
}

pub async fn register(
    State(state): State<AppState>,
    page: Page,
    CsrfForm(form): CsrfForm<RegisterForm>,
) -> Result<Response, ApiError> {
    if form.password != form.confirm_password {
        return register_page(page, &form, Some("Passwords do not match".to_string()));
    }

    let registration = Registration {
        username: form.username.clone(),
        email: form.email.clone(),
        password: form.password.clone(),
    };
    match state.services.accounts.register(&registration).await {
        Ok(user) => {
            state.metrics.record(Action::Register);
            sign_in(
                &state,
                page,
                &user.principal(),
                "/posts",
                format!("Welcome to Inkwell, {}!", user.username),
            )
        }
        Err(DomainError::Validation(msg)) | Err(DomainError::Conflict(msg)) => {
            register_page(page, &form, Some(msg))
        }
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn login_page(
    page: Page,
    heading: &str,
    action: &str,
    login: String,
    error: Option<&str>,
) -> Result<Response, ApiError> {
    let status = if error.is_some() {
        StatusCode::UNAUTHORIZED
    } else {
        StatusCode::OK
    };
    let template = LoginTemplate {
        page: page.meta(heading),
        heading: heading.to_string(),
        action: action.to_string(),
        login,
        error: error.map(str::to_string),
    };
    page.render(status, &template)
}

pub async fn login_form(page: Page) -> Result<Response, ApiError> {
    login_page(page, "Log in", LOGIN_PATH, String::new(), None)
}

pub async fn login(
    State(state): State<AppState>,
    page: Page,
    CsrfForm(form): CsrfForm<LoginForm>,
) -> Result<Response, ApiError> {
    match state.services.accounts.login(&form.login, &form.password).await {
        Ok(principal) => {
            state.metrics.record(Action::Login);
            let greeting = format!("Welcome back, {}!", principal.username);
            sign_in(&state, page, &principal, "/posts", greeting)
        }
        Err(DomainError::Unauthenticated) => {
            warn!("failed login attempt");
            login_page(
                page,
                "Log in",
                LOGIN_PATH,
                form.login,
                Some("Invalid login attempt."),
            )
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn logout(
    State(state): State<AppState>,
    page: Page,
    CsrfForm(_): CsrfForm<NoFields>,
) -> Response {
    sign_out(&state, page, "/", "You have been logged out.")
}
