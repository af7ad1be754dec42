//! # Feed
//!
//! Filtering and ordering rules for the post feed. Adapters that can push
//! these into a query language (SQL) do so; the in-memory adapter and the
//! trending projection use the functions here directly.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::Post;

/// The category value that disables filtering.
pub const ALL_CATEGORIES: &str = "All";

/// Feed ordering, parsed from the `sortOrder` query parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    /// Alphabetical by title (the fallback for unknown keys)
    #[default]
    Title,
    /// View count, highest first
    MostViewed,
    /// Creation time, newest first
    Recent,
}

impl SortOrder {
    pub fn parse(key: Option<&str>) -> Self {
        match key {
            Some("mostViewed") => SortOrder::MostViewed,
            Some("recent") => SortOrder::Recent,
            _ => SortOrder::Title,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            SortOrder::Title => "title",
            SortOrder::MostViewed => "mostViewed",
            SortOrder::Recent => "recent",
        }
    }

    /// Total order over posts; ties fall back to the post id.
    pub fn compare(&self, a: &Post, b: &Post) -> Ordering {
        match self {
            SortOrder::Title => a.title.cmp(&b.title).then(a.id.cmp(&b.id)),
            SortOrder::MostViewed => b.view_count.cmp(&a.view_count).then(a.id.cmp(&b.id)),
            SortOrder::Recent => b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)),
        }
    }
}

/// Parameters of a feed listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedQuery {
    pub category: Option<String>,
    pub sort: SortOrder,
}

impl FeedQuery {
    pub fn new(category: Option<String>, sort: SortOrder) -> Self {
        Self { category, sort }
    }

    /// The effective category filter: `None` for absent, empty or "All".
    /// Other values are matched as given, ignoring case only.
    pub fn category_filter(&self) -> Option<&str> {
        match self.category.as_deref() {
            None | Some("") => None,
            Some(c) if c == ALL_CATEGORIES => None,
            Some(c) => Some(c),
        }
    }

    pub fn matches(&self, post: &Post) -> bool {
        match self.category_filter() {
            None => true,
            Some(category) => post.category.to_lowercase() == category.to_lowercase(),
        }
    }

    /// Filters and orders an arbitrary set of posts.
    pub fn apply(&self, posts: impl IntoIterator<Item = Post>) -> Vec<Post> {
        let mut posts: Vec<Post> = posts.into_iter().filter(|p| self.matches(p)).collect();
        posts.sort_by(|a, b| self.sort.compare(a, b));
        posts
    }
}

/// A feed page: ordered posts plus like counts for posts that have any.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Feed {
    pub posts: Vec<Post>,
    pub like_counts: HashMap<i64, i64>,
}

impl Feed {
    /// Missing entries mean zero likes.
    pub fn like_count(&self, post_id: i64) -> i64 {
        self.like_counts.get(&post_id).copied().unwrap_or(0)
    }
}

/// Orders posts by like count, most liked first.
pub fn sort_by_likes(posts: &mut [Post], like_counts: &HashMap<i64, i64>) {
    let likes = |p: &Post| like_counts.get(&p.id).copied().unwrap_or(0);
    posts.sort_by(|a, b| likes(b).cmp(&likes(a)).then(a.id.cmp(&b.id)));
}
