//! # Feed Engine
//!
//! Read-only projections of the post table joined with live like counts.

use std::sync::Arc;

use domains::{
    sort_by_likes, Category, CategoryRepository, DomainResult, Feed, FeedQuery, Post,
    PostRepository, Principal, ReactionRepository, SortOrder,
};

pub struct FeedService {
    posts: Arc<dyn PostRepository>,
    reactions: Arc<dyn ReactionRepository>,
    categories: Arc<dyn CategoryRepository>,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        reactions: Arc<dyn ReactionRepository>,
        categories: Arc<dyn CategoryRepository>,
    ) -> Self {
        Self {
            posts,
            reactions,
            categories,
        }
    }

    /// The filtered, sorted feed with like counts.
    pub async fn feed(&self, query: &FeedQuery) -> DomainResult<Feed> {
        let posts = self.posts.list(query).await?;
        let like_counts = self.reactions.count_by_post().await?;
        Ok(Feed { posts, like_counts })
    }

    /// Every post, most liked first. Counts are computed, never stored.
    pub async fn trending(&self) -> DomainResult<Feed> {
        let mut posts = self.posts.list(&FeedQuery::default()).await?;
        let like_counts = self.reactions.count_by_post().await?;
        sort_by_likes(&mut posts, &like_counts);
        Ok(Feed { posts, like_counts })
    }

    /// Every post, newest first, ignoring categories.
    pub async fn latest(&self) -> DomainResult<Feed> {
        self.feed(&FeedQuery::new(None, SortOrder::Recent)).await
    }

    /// Posts written by `author`, with like counts.
    pub async fn by_author(&self, author: &Principal) -> DomainResult<Feed> {
        let posts = self.posts.list_by_user(author.user_id).await?;
        let like_counts = self.reactions.count_by_post().await?;
        Ok(Feed { posts, like_counts })
    }

    /// The public landing page: every post, newest first.
    pub async fn home(&self) -> DomainResult<Vec<Post>> {
        self.posts
            .list(&FeedQuery::new(None, SortOrder::Recent))
            .await
    }

    /// Category names offered by the feed filter.
    pub async fn categories(&self) -> DomainResult<Vec<Category>> {
        self.categories.list().await
    }
}
