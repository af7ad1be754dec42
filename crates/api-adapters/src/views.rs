//! Askama templates and the flat view rows they render.
//!
//! Templates live in `templates/`. Every page carries a [`PageMeta`] for
//! the shared layout (navigation, flash message, forgery token).

use askama::Template;
use chrono::{DateTime, Utc};

use domains::{
    ActionOutcome, Category, Feed, Notice, Post, PostDraft, Principal, SortOrder, User,
    ALL_CATEGORIES,
};

const EXCERPT_CHARS: usize = 160;

pub fn timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

/// Layout data shared by every page.
#[derive(Debug, Clone, Default)]
pub struct PageMeta {
    pub title: String,
    pub username: Option<String>,
    pub is_admin: bool,
    pub csrf_token: String,
    pub flash: Option<ActionOutcome>,
}

impl PageMeta {
    pub fn new(
        title: impl Into<String>,
        principal: Option<&Principal>,
        csrf_token: String,
        flash: Option<ActionOutcome>,
    ) -> Self {
        Self {
            title: title.into(),
            username: principal.map(|p| p.username.clone()),
            is_admin: principal.is_some_and(Principal::is_admin),
            csrf_token,
            flash,
        }
    }

    /// For pages rendered without request context, such as error pages.
    pub fn bare(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostRow {
    pub id: i64,
    pub title: String,
    pub excerpt: String,
    pub category: String,
    pub username: String,
    pub created_at: String,
    pub view_count: i64,
    pub likes: i64,
}

impl PostRow {
    pub fn new(post: &Post, likes: i64) -> Self {
        let mut excerpt: String = post.content.chars().take(EXCERPT_CHARS).collect();
        if post.content.chars().count() > EXCERPT_CHARS {
            excerpt.push('…');
        }
        Self {
            id: post.id,
            title: post.title.clone(),
            excerpt,
            category: post.category.clone(),
            username: post.username.clone(),
            created_at: timestamp(&post.created_at),
            view_count: post.view_count,
            likes,
        }
    }

    pub fn from_feed(feed: &Feed) -> Vec<Self> {
        feed.posts
            .iter()
            .map(|p| Self::new(p, feed.like_count(p.id)))
            .collect()
    }

    /// Rows for listings that do not show like counts.
    pub fn plain(posts: &[Post]) -> Vec<Self> {
        posts.iter().map(|p| Self::new(p, 0)).collect()
    }
}

#[derive(Debug, Clone)]
pub struct PostView {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub category: String,
    pub username: String,
    pub created_at: String,
    pub view_count: i64,
    pub likes: i64,
    pub is_owner: bool,
}

impl PostView {
    pub fn new(post: &Post, likes: i64, viewer: Option<&Principal>) -> Self {
        Self {
            id: post.id,
            title: post.title.clone(),
            content: post.content.clone(),
            category: post.category.clone(),
            username: post.username.clone(),
            created_at: timestamp(&post.created_at),
            view_count: post.view_count,
            likes,
            is_owner: viewer.is_some_and(|v| v.user_id == post.user_id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NoticeRow {
    pub message: String,
    pub created_at: String,
}

impl From<&Notice> for NoticeRow {
    fn from(notice: &Notice) -> Self {
        Self {
            message: notice.message.clone(),
            created_at: timestamp(&notice.created_at),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub roles: String,
    pub created_at: String,
    pub is_self: bool,
}

impl UserRow {
    pub fn new(user: &User, viewer: &Principal) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            roles: user
                .roles
                .iter()
                .map(|r| r.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            created_at: timestamp(&user.created_at),
            is_self: user.id == viewer.user_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub created_at: String,
}

impl From<&Category> for CategoryRow {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            created_at: timestamp(&category.created_at),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Category filter choices: "All" followed by every managed category.
pub fn category_options(categories: &[Category], current: Option<&str>) -> Vec<SelectOption> {
    let current = current.unwrap_or(ALL_CATEGORIES);
    std::iter::once(ALL_CATEGORIES.to_string())
        .chain(categories.iter().map(|c| c.name.clone()))
        .map(|name| SelectOption {
            selected: name.eq_ignore_ascii_case(current),
            label: name.clone(),
            value: name,
        })
        .collect()
}

pub fn sort_options(current: SortOrder) -> Vec<SelectOption> {
    [
        (SortOrder::Title, "Title"),
        (SortOrder::MostViewed, "Most viewed"),
        (SortOrder::Recent, "Most recent"),
    ]
    .into_iter()
    .map(|(sort, label)| SelectOption {
        value: sort.key().to_string(),
        label: label.to_string(),
        selected: sort == current,
    })
    .collect()
}

// Pages

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: PageMeta,
    pub posts: Vec<PostRow>,
}

#[derive(Template)]
#[template(path = "feed.html")]
pub struct FeedTemplate {
    pub page: PageMeta,
    pub heading: String,
    pub posts: Vec<PostRow>,
    pub show_filters: bool,
    pub categories: Vec<SelectOption>,
    pub sorts: Vec<SelectOption>,
}

#[derive(Template)]
#[template(path = "post_form.html")]
pub struct PostFormTemplate {
    pub page: PageMeta,
    pub heading: String,
    pub action: String,
    pub cancel: String,
    pub draft: PostDraft,
    pub categories: Vec<String>,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "post_detail.html")]
pub struct PostDetailTemplate {
    pub page: PageMeta,
    pub post: PostView,
    /// Admin pages link to the admin actions and hide the like button
    pub admin: bool,
}

#[derive(Template)]
#[template(path = "confirm.html")]
pub struct ConfirmTemplate {
    pub page: PageMeta,
    pub heading: String,
    pub message: String,
    pub action: String,
    pub cancel: String,
}

#[derive(Template)]
#[template(path = "notices.html")]
pub struct NoticesTemplate {
    pub page: PageMeta,
    pub notices: Vec<NoticeRow>,
    pub global: Option<NoticeRow>,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub page: PageMeta,
    pub username: String,
    pub email: String,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub page: PageMeta,
    pub heading: String,
    pub action: String,
    pub login: String,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub page: PageMeta,
    pub status: u16,
    pub message: String,
}

// Admin pages

#[derive(Template)]
#[template(path = "admin/dashboard.html")]
pub struct AdminDashboardTemplate {
    pub page: PageMeta,
    pub user_count: usize,
    pub post_count: usize,
    pub category_count: usize,
    pub global: Option<NoticeRow>,
}

#[derive(Template)]
#[template(path = "admin/users.html")]
pub struct AdminUsersTemplate {
    pub page: PageMeta,
    pub users: Vec<UserRow>,
}

#[derive(Template)]
#[template(path = "admin/posts.html")]
pub struct AdminPostsTemplate {
    pub page: PageMeta,
    pub posts: Vec<PostRow>,
}

#[derive(Template)]
#[template(path = "admin/categories.html")]
pub struct AdminCategoriesTemplate {
    pub page: PageMeta,
    pub categories: Vec<CategoryRow>,
}

#[derive(Template)]
#[template(path = "admin/category_form.html")]
pub struct CategoryFormTemplate {
    pub page: PageMeta,
    pub heading: String,
    pub action: String,
    pub name: String,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn post(content: &str) -> Post {
        Post {
            id: 1,
            title: "<script>alert(1)</script>".into(),
            content: content.into(),
            category: "Tech".into(),
            created_at: Utc::now(),
            view_count: 3,
            user_id: Uuid::new_v4(),
            username: "ada".into(),
        }
    }

    #[test]
    fn excerpt_is_truncated() {
        let row = PostRow::new(&post(&"x".repeat(500)), 0);
        assert_eq!(row.excerpt.chars().count(), EXCERPT_CHARS + 1);
        assert!(row.excerpt.ends_with('…'));
    }

    #[test]
    fn category_options_start_with_all() {
        let categories = vec![Category {
            id: 1,
            name: "Tech".into(),
            created_at: Utc::now(),
        }];
        let options = category_options(&categories, Some("tech"));
        assert_eq!(options[0].value, ALL_CATEGORIES);
        assert!(!options[0].selected);
        assert!(options[1].selected);

        let options = category_options(&categories, None);
        assert!(options[0].selected);
    }

    #[test]
    fn templates_escape_user_content() {
        let html = HomeTemplate {
            page: PageMeta::bare("Home"),
            posts: vec![PostRow::new(&post("body"), 0)],
        }
        .render()
        .unwrap();
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn flash_is_rendered_in_the_layout() {
        let mut page = PageMeta::bare("Notices");
        page.flash = Some(ActionOutcome::ok("Notices cleared."));
        let html = NoticesTemplate {
            page,
            notices: vec![],
            global: None,
        }
        .render()
        .unwrap();
        assert!(html.contains("Notices cleared."));
        assert!(html.contains("flash-success"));
    }
}
