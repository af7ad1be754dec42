//! Request extractors: session resolution, role gates, page context and
//! forgery-checked forms.

use std::convert::Infallible;

use askama::Template;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::CookieJar;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use domains::{ActionOutcome, DomainError, Principal, Session};

use crate::cookies::{self, ANON_COOKIE, SESSION_COOKIE};
use crate::error::{ApiError, ADMIN_LOGIN_PATH, LOGIN_PATH};
use crate::state::AppState;
use crate::views::PageMeta;

/// Cached in request extensions so the token is verified once per request.
#[derive(Clone)]
struct ResolvedSession(Option<Session>);

async fn resolve_session(parts: &mut Parts, state: &AppState) -> Option<Session> {
    if let Some(ResolvedSession(session)) = parts.extensions.get::<ResolvedSession>() {
        return session.clone();
    }

    let jar = CookieJar::from_headers(&parts.headers);
    let session = match jar.get(SESSION_COOKIE) {
        Some(cookie) => match state.services.accounts.authenticate(cookie.value()).await {
            Ok(session) => Some(session),
            Err(DomainError::Unauthenticated) => {
                debug!("ignoring invalid session cookie");
                None
            }
            Err(e) => {
                warn!(error = %e, "could not resolve session");
                None
            }
        },
        None => None,
    };

    parts.extensions.insert(ResolvedSession(session.clone()));
    session
}

/// The key forgery tokens are bound to: the session id when logged in,
/// otherwise the anonymous cookie.
fn csrf_key(session: Option<&Session>, jar: &CookieJar) -> Option<String> {
    match session {
        Some(session) => Some(session.session_id.to_string()),
        None => jar.get(ANON_COOKIE).map(|c| c.value().to_string()),
    }
}

/// Any logged-in user. Anonymous requests are sent to the login page.
pub struct CurrentUser(pub Session);

impl CurrentUser {
    pub fn principal(&self) -> &Principal {
        &self.0.principal
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve_session(parts, state)
            .await
            .map(CurrentUser)
            .ok_or(ApiError::LoginRequired {
                login_path: LOGIN_PATH,
            })
    }
}

/// A logged-in administrator.
pub struct AdminUser(pub Session);

impl AdminUser {
    pub fn principal(&self) -> &Principal {
        &self.0.principal
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = resolve_session(parts, state).await.ok_or(ApiError::LoginRequired {
            login_path: ADMIN_LOGIN_PATH,
        })?;
        if !session.principal.is_admin() {
            warn!(user_id = %session.principal.user_id, "non-admin hit an admin route");
            return Err(DomainError::Forbidden("admin role required".into()).into());
        }
        Ok(AdminUser(session))
    }
}

/// Everything a rendered page needs besides its own data: the viewer, a
/// pending flash message, a forgery token and the cookie jar to send back.
pub struct Page {
    pub session: Option<Session>,
    pub flash: Option<ActionOutcome>,
    pub csrf_token: String,
    pub jar: CookieJar,
}

impl FromRequestParts<AppState> for Page {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = resolve_session(parts, state).await;
        let (mut jar, flash) = cookies::take_flash(CookieJar::from_headers(&parts.headers));

        let key = match csrf_key(session.as_ref(), &jar) {
            Some(key) => key,
            None => {
                let id = Uuid::new_v4().to_string();
                jar = jar.add(cookies::anonymous(id.clone(), state.secure_cookies));
                id
            }
        };

        Ok(Page {
            csrf_token: state.csrf.issue(&key),
            session,
            flash,
            jar,
        })
    }
}

impl Page {
    pub fn principal(&self) -> Option<&Principal> {
        self.session.as_ref().map(|s| &s.principal)
    }

    pub fn meta(&self, title: impl Into<String>) -> PageMeta {
        PageMeta::new(
            title,
            self.principal(),
            self.csrf_token.clone(),
            self.flash.clone(),
        )
    }

    /// Renders `template` with `status`, sending back any cookie changes.
    pub fn render<T: Template>(self, status: StatusCode, template: &T) -> Result<Response, ApiError> {
        let html = template.render()?;
        Ok((status, self.jar, Html(html)).into_response())
    }

    /// Redirects to `to`, carrying `outcome` as the next page's flash.
    pub fn redirect(self, to: &str, outcome: &ActionOutcome, secure: bool) -> Response {
        let jar = cookies::set_flash(self.jar, outcome, secure);
        (jar, Redirect::to(to)).into_response()
    }
}

/// Form with the `_csrf` field every state-changing form carries.
#[derive(Deserialize)]
struct CsrfFields<T> {
    #[serde(rename = "_csrf", default)]
    csrf: String,
    #[serde(flatten)]
    data: T,
}

/// For forms that carry nothing but the forgery token.
#[derive(Debug, Default, Deserialize)]
pub struct NoFields {}

/// A url-encoded form whose `_csrf` field has been verified against the
/// requester's session (or anonymous cookie). Rejects with 403 otherwise.
pub struct CsrfForm<T>(pub T);

impl<T> FromRequest<AppState> for CsrfForm<T>
where
    T: DeserializeOwned + Send + 'static,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let (mut parts, body) = req.into_parts();
        let session = resolve_session(&mut parts, state).await;
        let key = csrf_key(session.as_ref(), &CookieJar::from_headers(&parts.headers));
        let req = Request::from_parts(parts, body);

        let Form(fields) = Form::<CsrfFields<T>>::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadForm(e.body_text()))?;

        match key {
            Some(key) if state.csrf.verify(&key, &fields.csrf) => Ok(CsrfForm(fields.data)),
            _ => {
                warn!("rejected form with a missing or invalid forgery token");
                Err(ApiError::Csrf)
            }
        }
    }
}
