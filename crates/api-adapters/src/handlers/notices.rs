use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;

use crate::error::ApiError;
use crate::extractors::{CsrfForm, CurrentUser, NoFields, Page};
use crate::metrics::Action;
use crate::state::AppState;
use crate::views::{NoticeRow, NoticesTemplate};

/// The viewer's mailbox. The global notice is shown above it, not mixed in.
pub async fn mailbox(
    State(state): State<AppState>,
    user: CurrentUser,
    page: Page,
) -> Result<Response, ApiError> {
    let notices = state.services.notices.list(user.principal()).await?;
    let global = state.services.notices.current_global().await?;
    let template = NoticesTemplate {
        page: page.meta("Notices"),
        notices: notices.iter().map(NoticeRow::from).collect(),
        global: global.as_ref().map(NoticeRow::from),
    };
    page.render(StatusCode::OK, &template)
}

pub async fn clear(
    State(state): State<AppState>,
    user: CurrentUser,
    page: Page,
    CsrfForm(_): CsrfForm<NoFields>,
) -> Result<Response, ApiError> {
    let outcome = state.services.notices.clear(user.principal()).await?;
    state.metrics.record(Action::NoticesClear);
    Ok(page.redirect("/notices", &outcome, state.secure_cookies))
}
