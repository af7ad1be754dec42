//! # router
//!
//! Route table and the middleware stack every request passes through.

use std::path::Path;

use axum::body::Body;
use axum::http::Request;
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info_span;

use crate::handlers::{account, admin, feed, health, not_found, notices, posts};
use crate::state::AppState;

fn post_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(feed::index).post(posts::create))
        .route("/posts/trending", get(feed::trending))
        .route("/posts/latest", get(feed::latest))
        .route("/posts/mine", get(feed::mine))
        .route("/posts/new", get(posts::new_form))
        .route("/posts/{id}", get(posts::detail))
        .route("/posts/{id}/edit", get(posts::edit_form).post(posts::edit))
        .route(
            "/posts/{id}/delete",
            get(posts::delete_confirm).post(posts::delete),
        )
        .route("/posts/{id}/react", post(posts::react))
        .route("/notices", get(notices::mailbox))
        .route("/notices/clear", post(notices::clear))
}

fn account_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/account/register",
            get(account::register_form).post(account::register),
        )
        .route(
            "/account/login",
            get(account::login_form).post(account::login),
        )
        .route("/account/logout", post(account::logout))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin::dashboard))
        .route("/admin/login", get(admin::login_form).post(admin::login))
        .route("/admin/logout", post(admin::logout))
        .route("/admin/notice", post(admin::broadcast))
        .route("/admin/users", get(admin::users))
        .route("/admin/users/{id}/delete", post(admin::delete_user))
        .route("/admin/posts", get(admin::posts))
        .route("/admin/posts/{id}", get(admin::post_detail))
        .route(
            "/admin/posts/{id}/edit",
            get(admin::post_edit_form).post(admin::post_edit),
        )
        .route(
            "/admin/posts/{id}/delete",
            get(admin::post_delete_confirm).post(admin::post_delete),
        )
        .route("/admin/categories", get(admin::categories))
        .route(
            "/admin/categories/new",
            get(admin::category_new_form).post(admin::category_create),
        )
        .route(
            "/admin/categories/{id}/edit",
            get(admin::category_edit_form).post(admin::category_rename),
        )
        .route(
            "/admin/categories/{id}/delete",
            get(admin::category_delete_confirm).post(admin::category_delete),
        )
}

/// Builds the application. Static assets are served from `static_dir`
/// under `/static` when given.
pub fn build_router(state: AppState, static_dir: Option<&Path>) -> Router {
    let mut router = Router::new()
        .route("/", get(feed::home))
        .route("/health", get(health::health))
        .route("/metrics", get(health::metrics))
        .merge(post_routes())
        .merge(account_routes())
        .merge(admin_routes())
        .fallback(not_found)
        .with_state(state);

    if let Some(dir) = static_dir {
        router = router.nest_service("/static", ServeDir::new(dir));
    }

    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                    let request_id = req
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");
                    info_span!(
                        "http",
                        method = %req.method(),
                        uri = %req.uri(),
                        request_id
                    )
                }),
            )
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(CompressionLayer::new()),
    )
}
