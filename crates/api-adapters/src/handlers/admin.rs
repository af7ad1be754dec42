//! The admin area: dashboard, users, posts and categories.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use domains::{ActionOutcome, DomainError, PostDraft};

use crate::error::{ApiError, ADMIN_LOGIN_PATH};
use crate::extractors::{AdminUser, CsrfForm, NoFields, Page};
use crate::handlers::account::{login_page, sign_in, sign_out, LoginForm};
use crate::handlers::posts::render_form;
use crate::metrics::Action;
use crate::state::AppState;
use crate::views::{
    AdminCategoriesTemplate, AdminDashboardTemplate, AdminPostsTemplate, AdminUsersTemplate,
    CategoryFormTemplate, CategoryRow, ConfirmTemplate, NoticeRow, PostDetailTemplate, PostRow,
    PostView, UserRow,
};

const POSTS_PATH: &str = "/admin/posts";
const CATEGORIES_PATH: &str = "/admin/categories";

#[derive(Debug, Default, Deserialize)]
pub struct BroadcastForm {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CategoryForm {
    #[serde(default)]
    pub name: String,
}

// Session

pub async fn login_form(page: Page) -> Result<Response, ApiError> {
    login_page(page, "Admin login", ADMIN_LOGIN_PATH, String::new(), None)
}

pub async fn login(
    State(state): State<AppState>,
    page: Page,
    CsrfForm(form): CsrfForm<LoginForm>,
) -> Result<Response, ApiError> {
    match state
        .services
        .accounts
        .admin_login(&form.login, &form.password)
        .await
    {
        Ok(principal) => {
            state.metrics.record(Action::Login);
            let greeting = format!("Signed in as {}.", principal.username);
            sign_in(&state, page, &principal, "/admin", greeting)
        }
        Err(DomainError::Unauthenticated) => {
            warn!("failed admin login attempt");
            login_page(
                page,
                "Admin login",
                ADMIN_LOGIN_PATH,
                form.login,
                Some("Invalid login attempt or not an admin user."),
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
    sign_out(&state, page, ADMIN_LOGIN_PATH, "You have been logged out.")
}

// Dashboard and users

pub async fn dashboard(
    State(state): State<AppState>,
    admin: AdminUser,
    page: Page,
) -> Result<Response, ApiError> {
    let services = &state.services;
    let users = services.admin.list_users(admin.principal()).await?;
    let posts = services.admin.list_posts(admin.principal()).await?;
    let categories = services.admin.list_categories(admin.principal()).await?;
    let global = services.notices.current_global().await?;

    let template = AdminDashboardTemplate {
        page: page.meta("Admin"),
        user_count: users.len(),
        post_count: posts.len(),
        category_count: categories.len(),
        global: global.as_ref().map(NoticeRow::from),
    };
    page.render(StatusCode::OK, &template)
}

pub async fn broadcast(
    State(state): State<AppState>,
    admin: AdminUser,
    page: Page,
    CsrfForm(form): CsrfForm<BroadcastForm>,
) -> Result<Response, ApiError> {
    let outcome = state
        .services
        .notices
        .broadcast(admin.principal(), &form.message)
        .await?;
    if outcome.success {
        state.metrics.record(Action::Broadcast);
    }
    Ok(page.redirect("/admin", &outcome, state.secure_cookies))
}

pub async fn users(
    State(state): State<AppState>,
    admin: AdminUser,
    page: Page,
) -> Result<Response, ApiError> {
    let users = state.services.admin.list_users(admin.principal()).await?;
    let template = AdminUsersTemplate {
        page: page.meta("Users"),
        users: users
            .iter()
            .map(|u| UserRow::new(u, admin.principal()))
            .collect(),
    };
    page.render(StatusCode::OK, &template)
}

pub async fn delete_user(
    State(state): State<AppState>,
    admin: AdminUser,
    page: Page,
    Path(id): Path<Uuid>,
    CsrfForm(_): CsrfForm<NoFields>,
) -> Result<Response, ApiError> {
    let outcome = state
        .services
        .admin
        .delete_user(admin.principal(), id)
        .await?;
    if outcome.success {
        state.metrics.record(Action::UserDelete);
    }
    Ok(page.redirect("/admin/users", &outcome, state.secure_cookies))
}

// Posts

pub async fn posts(
    State(state): State<AppState>,
    admin: AdminUser,
    page: Page,
) -> Result<Response, ApiError> {
    let posts = state.services.admin.list_posts(admin.principal()).await?;
    let template = AdminPostsTemplate {
        page: page.meta("Manage posts"),
        posts: PostRow::plain(&posts),
    };
    page.render(StatusCode::OK, &template)
}

pub async fn post_detail(
    State(state): State<AppState>,
    admin: AdminUser,
    page: Page,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let post = state.services.admin.post(admin.principal(), id).await?;
    let template = PostDetailTemplate {
        page: page.meta(post.title.clone()),
        post: PostView::new(&post, 0, page.principal()),
        admin: true,
    };
    page.render(StatusCode::OK, &template)
}

pub async fn post_edit_form(
    State(state): State<AppState>,
    admin: AdminUser,
    page: Page,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let post = state.services.admin.post(admin.principal(), id).await?;
    render_form(
        &state,
        page,
        "Edit post",
        format!("{POSTS_PATH}/{id}/edit"),
        POSTS_PATH,
        PostDraft::from(&post),
        None,
    )
    .await
}

pub async fn post_edit(
    State(state): State<AppState>,
    admin: AdminUser,
    page: Page,
    Path(id): Path<i64>,
    CsrfForm(draft): CsrfForm<PostDraft>,
) -> Result<Response, ApiError> {
    match state
        .services
        .admin
        .edit_post(admin.principal(), id, &draft)
        .await
    {
        Ok(_) => {
            state.metrics.record(Action::PostEdit);
            Ok(page.redirect(
                POSTS_PATH,
                &ActionOutcome::ok("Post updated."),
                state.secure_cookies,
            ))
        }
        Err(DomainError::Validation(msg)) => {
            render_form(
                &state,
                page,
                "Edit post",
                format!("{POSTS_PATH}/{id}/edit"),
                POSTS_PATH,
                draft,
                Some(msg),
            )
            .await
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn post_delete_confirm(
    State(state): State<AppState>,
    admin: AdminUser,
    page: Page,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let post = state.services.admin.post(admin.principal(), id).await?;
    let template = ConfirmTemplate {
        page: page.meta("Delete post"),
        heading: "Delete post".to_string(),
        message: format!(
            "Delete \"{}\" by {}? This cannot be undone.",
            post.title, post.username
        ),
        action: format!("{POSTS_PATH}/{id}/delete"),
        cancel: POSTS_PATH.to_string(),
    };
    page.render(StatusCode::OK, &template)
}

pub async fn post_delete(
    State(state): State<AppState>,
    admin: AdminUser,
    page: Page,
    Path(id): Path<i64>,
    CsrfForm(_): CsrfForm<NoFields>,
) -> Result<Response, ApiError> {
    let outcome = if state
        .services
        .admin
        .delete_post(admin.principal(), id)
        .await?
    {
        state.metrics.record(Action::PostDelete);
        ActionOutcome::ok("Post deleted.")
    } else {
        ActionOutcome::err("Post not found.")
    };
    Ok(page.redirect(POSTS_PATH, &outcome, state.secure_cookies))
}

// Categories

fn category_page(
    page: Page,
    heading: &str,
    action: String,
    name: String,
    error: Option<(StatusCode, String)>,
) -> Result<Response, ApiError> {
    let (status, error) = match error {
        Some((status, msg)) => (status, Some(msg)),
        None => (StatusCode::OK, None),
    };
    let template = CategoryFormTemplate {
        page: page.meta(heading),
        heading: heading.to_string(),
        action,
        name,
        error,
    };
    page.render(status, &template)
}

/// Validation and duplicate-name failures re-render the form.
fn rejected_category(e: DomainError) -> Result<(StatusCode, String), ApiError> {
    match e {
        DomainError::Validation(msg) => Ok((StatusCode::UNPROCESSABLE_ENTITY, msg)),
        DomainError::Conflict(msg) => Ok((StatusCode::CONFLICT, msg)),
        e => Err(e.into()),
    }
}

pub async fn categories(
    State(state): State<AppState>,
    admin: AdminUser,
    page: Page,
) -> Result<Response, ApiError> {
    let categories = state
        .services
        .admin
        .list_categories(admin.principal())
        .await?;
    let template = AdminCategoriesTemplate {
        page: page.meta("Categories"),
        categories: categories.iter().map(CategoryRow::from).collect(),
    };
    page.render(StatusCode::OK, &template)
}

pub async fn category_new_form(_admin: AdminUser, page: Page) -> Result<Response, ApiError> {
    category_page(
        page,
        "New category",
        format!("{CATEGORIES_PATH}/new"),
        String::new(),
        None,
    )
}

pub async fn category_create(
    State(state): State<AppState>,
    admin: AdminUser,
    page: Page,
    CsrfForm(form): CsrfForm<CategoryForm>,
) -> Result<Response, ApiError> {
    match state
        .services
        .admin
        .create_category(admin.principal(), &form.name)
        .await
    {
        Ok(category) => {
            state.metrics.record(Action::CategoryCreate);
            let outcome = ActionOutcome::ok(format!("Category '{}' created.", category.name));
            Ok(page.redirect(CATEGORIES_PATH, &outcome, state.secure_cookies))
        }
        Err(e) => {
            let error = rejected_category(e)?;
            category_page(
                page,
                "New category",
                format!("{CATEGORIES_PATH}/new"),
                form.name,
                Some(error),
            )
        }
    }
}

pub async fn category_edit_form(
    State(state): State<AppState>,
    admin: AdminUser,
    page: Page,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let category = state.services.admin.category(admin.principal(), id).await?;
    category_page(
        page,
        "Rename category",
        format!("{CATEGORIES_PATH}/{id}/edit"),
        category.name,
        None,
    )
}

pub async fn category_rename(
    State(state): State<AppState>,
    admin: AdminUser,
    page: Page,
    Path(id): Path<i64>,
    CsrfForm(form): CsrfForm<CategoryForm>,
) -> Result<Response, ApiError> {
    match state
        .services
        .admin
        .rename_category(admin.principal(), id, &form.name)
        .await
    {
        Ok(category) => {
            state.metrics.record(Action::CategoryRename);
            let outcome = ActionOutcome::ok(format!("Category renamed to '{}'.", category.name));
            Ok(page.redirect(CATEGORIES_PATH, &outcome, state.secure_cookies))
        }
        Err(e) => {
            let error = rejected_category(e)?;
            category_page(
                page,
                "Rename category",
                format!("{CATEGORIES_PATH}/{id}/edit"),
                form.name,
                Some(error),
            )
        }
    }
}

pub async fn category_delete_confirm(
    State(state): State<AppState>,
    admin: AdminUser,
    page: Page,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let category = state.services.admin.category(admin.principal(), id).await?;
    let template = ConfirmTemplate {
        page: page.meta("Delete category"),
        heading: "Delete category".to_string(),
        message: format!(
            "Delete the category '{}'? Existing posts keep their category text.",
            category.name
        ),
        action: format!("{CATEGORIES_PATH}/{id}/delete"),
        cancel: CATEGORIES_PATH.to_string(),
    };
    page.render(StatusCode::OK, &template)
}

pub async fn category_delete(
    State(state): State<AppState>,
    admin: AdminUser,
    page: Page,
    Path(id): Path<i64>,
    CsrfForm(_): CsrfForm<NoFields>,
) -> Result<Response, ApiError> {
    state
        .services
        .admin
        .delete_category(admin.principal(), id)
        .await?;
    state.metrics.record(Action::CategoryDelete);
    Ok(page.redirect(
        CATEGORIES_PATH,
        &ActionOutcome::ok("Category deleted."),
        state.secure_cookies,
    ))
}
