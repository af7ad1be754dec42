//! Post lifecycle pages and the like toggle.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use tracing::{info, warn};

use domains::{ActionOutcome, DomainError, PostDraft, ToggleOutcome};

use crate::error::ApiError;
use crate::extractors::{CsrfForm, CurrentUser, NoFields, Page};
use crate::metrics::Action;
use crate::state::AppState;
use crate::views::{ConfirmTemplate, PostDetailTemplate, PostFormTemplate, PostView};

const FEED_PATH: &str = "/posts";

/// Renders the post form, optionally with the validation message from a
/// rejected submission.
pub(crate) async fn render_form(
    state: &AppState,
    page: Page,
    heading: &str,
    action: String,
    cancel: &str,
    draft: PostDraft,
    error: Option<String>,
) -> Result<Response, ApiError> {
    let categories = state
        .services
        .feed
        .categories()
        .await?
        .into_iter()
        .map(|c| c.name)
        .collect();
    let status = if error.is_some() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::OK
    };
    let template = PostFormTemplate {
        page: page.meta(heading),
        heading: heading.to_string(),
        action,
        cancel: cancel.to_string(),
        draft,
        categories,
        error,
    };
    page.render(status, &template)
}

pub async fn new_form(
    State(state): State<AppState>,
    _user: CurrentUser,
    page: Page,
) -> Result<Response, ApiError> {
    render_form(
        &state,
        page,
        "New post",
        FEED_PATH.to_string(),
        FEED_PATH,
        PostDraft::default(),
        None,
    )
    .await
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    page: Page,
    CsrfForm(draft): CsrfForm<PostDraft>,
) -> Result<Response, ApiError> {
    match state.services.posts.create(user.principal(), &draft).await {
        Ok(_) => {
            state.metrics.record(Action::PostCreate);
            Ok(page.redirect(
                FEED_PATH,
                &ActionOutcome::ok("Post published."),
                state.secure_cookies,
            ))
        }
        Err(DomainError::Validation(msg)) => {
            render_form(
                &state,
                page,
                "New post",
                FEED_PATH.to_string(),
                FEED_PATH,
                draft,
                Some(msg),
            )
            .await
        }
        Err(e) => Err(e.into()),
    }
}

/// Counts a view on every request.
pub async fn detail(
    State(state): State<AppState>,
    _user: CurrentUser,
    page: Page,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let detail = state.services.posts.detail(id).await?;
    let template = PostDetailTemplate {
        page: page.meta(detail.post.title.clone()),
        post: PostView::new(&detail.post, detail.like_count, page.principal()),
        admin: false,
    };
    page.render(StatusCode::OK, &template)
}

pub async fn edit_form(
    State(state): State<AppState>,
    user: CurrentUser,
    page: Page,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let post = state.services.posts.owned(id, user.principal()).await?;
    render_form(
        &state,
        page,
        "Edit post",
        format!("/posts/{id}/edit"),
        FEED_PATH,
        PostDraft::from(&post),
        None,
    )
    .await
}

pub async fn edit(
    State(state): State<AppState>,
    user: CurrentUser,
    page: Page,
    Path(id): Path<i64>,
    CsrfForm(draft): CsrfForm<PostDraft>,
) -> Result<Response, ApiError> {
    match state.services.posts.edit(id, user.principal(), &draft).await {
        Ok(_) => {
            state.metrics.record(Action::PostEdit);
            Ok(page.redirect(
                FEED_PATH,
                &ActionOutcome::ok("Post updated."),
                state.secure_cookies,
            ))
        }
        Err(DomainError::Validation(msg)) => {
            render_form(
                &state,
                page,
                "Edit post",
                format!("/posts/{id}/edit"),
                FEED_PATH,
                draft,
                Some(msg),
            )
            .await
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn delete_confirm(
    State(state): State<AppState>,
    user: CurrentUser,
    page: Page,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let post = state.services.posts.owned(id, user.principal()).await?;
    let template = ConfirmTemplate {
        page: page.meta("Delete post"),
        heading: "Delete post".to_string(),
        message: format!("Delete \"{}\"? This cannot be undone.", post.title),
        action: format!("/posts/{id}/delete"),
        cancel: FEED_PATH.to_string(),
    };
    page.render(StatusCode::OK, &template)
}

pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    page: Page,
    Path(id): Path<i64>,
    CsrfForm(_): CsrfForm<NoFields>,
) -> Result<Response, ApiError> {
    state.services.posts.delete(id, user.principal()).await?;
    state.metrics.record(Action::PostDelete);
    Ok(page.redirect(
        FEED_PATH,
        &ActionOutcome::ok("Post deleted."),
        state.secure_cookies,
    ))
}

/// Toggles the viewer's like. A vanished post is ignored and the viewer
/// lands back on the feed either way.
pub async fn react(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    CsrfForm(_): CsrfForm<NoFields>,
) -> Result<Response, ApiError> {
    match state.services.reactions.toggle(id, user.principal()).await {
        Ok(outcome) => {
            state.metrics.record(Action::React);
            match outcome {
                ToggleOutcome::Liked { notified } => {
                    info!(post_id = id, user_id = %user.principal().user_id, notified, "post liked")
                }
                ToggleOutcome::Unliked => {
                    info!(post_id = id, user_id = %user.principal().user_id, "post unliked")
                }
            }
        }
        Err(DomainError::NotFound { .. }) => {
            warn!(post_id = id, "reaction to a missing post ignored");
        }
        Err(e) => return Err(e.into()),
    }
    Ok(Redirect::to(FEED_PATH).into_response())
}
