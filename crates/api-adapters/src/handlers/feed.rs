use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use serde::Deserialize;

use domains::{FeedQuery, SortOrder};

use crate::error::ApiError;
use crate::extractors::{CurrentUser, Page};
use crate::state::AppState;
use crate::views::{category_options, sort_options, FeedTemplate, HomeTemplate, PostRow};

#[derive(Debug, Default, Deserialize)]
pub struct FeedParams {
    pub category: Option<String>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<String>,
}

pub async fn home(State(state): State<AppState>, page: Page) -> Result<Response, ApiError> {
    let posts = state.services.feed.home().await?;
    let template = HomeTemplate {
        page: page.meta("Home"),
        posts: PostRow::plain(&posts),
    };
    page.render(StatusCode::OK, &template)
}

/// `GET /posts?category=&sortOrder=`
pub async fn index(
    State(state): State<AppState>,
    _user: CurrentUser,
    page: Page,
    Query(params): Query<FeedParams>,
) -> Result<Response, ApiError> {
    let sort = SortOrder::parse(params.sort_order.as_deref());
    let query = FeedQuery::new(params.category, sort);
    let feed = state.services.feed.feed(&query).await?;
    let categories = state.services.feed.categories().await?;

    let template = FeedTemplate {
        page: page.meta("Posts"),
        heading: "All posts".to_string(),
        posts: PostRow::from_feed(&feed),
        show_filters: true,
        categories: category_options(&categories, query.category_filter()),
        sorts: sort_options(sort),
    };
    page.render(StatusCode::OK, &template)
}

fn listing(page: &Page, title: &str, posts: Vec<PostRow>) -> FeedTemplate {
    FeedTemplate {
        page: page.meta(title),
        heading: title.to_string(),
        posts,
        show_filters: false,
        categories: Vec::new(),
        sorts: Vec::new(),
    }
}

pub async fn trending(
    State(state): State<AppState>,
    _user: CurrentUser,
    page: Page,
) -> Result<Response, ApiError> {
    let feed = state.services.feed.trending().await?;
    let template = listing(&page, "Trending", PostRow::from_feed(&feed));
    page.render(StatusCode::OK, &template)
}

pub async fn latest(
    State(state): State<AppState>,
    _user: CurrentUser,
    page: Page,
) -> Result<Response, ApiError> {
    let feed = state.services.feed.latest().await?;
    let template = listing(&page, "Latest", PostRow::from_feed(&feed));
    page.render(StatusCode::OK, &template)
}

pub async fn mine(
    State(state): State<AppState>,
    user: CurrentUser,
    page: Page,
) -> Result<Response, ApiError> {
    let feed = state.services.feed.by_author(user.principal()).await?;
    let template = listing(&page, "My posts", PostRow::from_feed(&feed));
    page.render(StatusCode::OK, &template)
}
