//! # Post Lifecycle
//!
//! Create, read (with view counting), edit and delete of posts by their
//! owners. Admin edits go through [`crate::AdminService`] instead.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use domains::{
    DomainError, DomainResult, NewPost, Post, PostDraft, PostRepository, Principal,
    ReactionRepository,
};

use crate::authz::require_owner;

/// A post as shown on its detail page.
#[derive(Debug, Clone, PartialEq)]
pub struct PostDetail {
    pub post: Post,
    pub like_count: i64,
}

pub struct PostService {
    posts: Arc<dyn PostRepository>,
    reactions: Arc<dyn ReactionRepository>,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostRepository>, reactions: Arc<dyn ReactionRepository>) -> Self {
        Self { posts, reactions }
    }

    pub async fn create(&self, actor: &Principal, draft: &PostDraft) -> DomainResult<Post> {
        let draft = draft.validate()?;
        let post = self
            .posts
            .create(NewPost {
                title: draft.title,
                content: draft.content,
                category: draft.category,
                created_at: Utc::now(),
                user_id: actor.user_id,
                username: actor.username.clone(),
            })
            .await?;
        info!(post_id = post.id, user_id = %actor.user_id, "post created");
        Ok(post)
    }

    /// Fetches a post for display. Every successful call counts one view,
    /// including views by the author.
    pub async fn detail(&self, id: i64) -> DomainResult<PostDetail> {
        let post = self
            .posts
            .increment_views(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", id))?;
        let like_count = self.reactions.count_for_post(id).await?;
        Ok(PostDetail { post, like_count })
    }

    /// Loads a post the actor is about to edit or delete.
    pub async fn owned(&self, id: i64, actor: &Principal) -> DomainResult<Post> {
        let post = self
            .posts
            .find(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", id))?;
        require_owner(&post, actor)?;
        Ok(post)
    }

    /// Ownership is checked before the payload is looked at.
    pub async fn edit(&self, id: i64, actor: &Principal, draft: &PostDraft) -> DomainResult<Post> {
        self.owned(id, actor).await?;
        let draft = draft.validate()?;
        let post = self
            .posts
            .update(id, &draft)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", id))?;
        info!(post_id = id, user_id = %actor.user_id, "post edited");
        Ok(post)
    }

    pub async fn delete(&self, id: i64, actor: &Principal) -> DomainResult<()> {
        self.owned(id, actor).await?;
        if !self.posts.delete(id).await? {
            return Err(DomainError::not_found("Post", id));
        }
        info!(post_id = id, user_id = %actor.user_id, "post deleted");
        Ok(())
    }
}
