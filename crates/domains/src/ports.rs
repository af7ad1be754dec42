//! # Ports
//!
//! Any adapter must implement these traits to be wired into the binary.
//! Storage ports return `DomainError::Persistence` for infrastructure
//! failures and never invent domain errors of their own.

use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::DomainResult;
use crate::feed::FeedQuery;
use crate::models::{
    Category, NewNotice, NewPost, NewUser, Notice, Post, PostDraft, Principal, Reaction,
    ReactionChange, Role, User,
};

/// Post persistence.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: NewPost) -> DomainResult<Post>;
    async fn find(&self, id: i64) -> DomainResult<Option<Post>>;
    /// Filtered and ordered per `query`.
    async fn list(&self, query: &FeedQuery) -> DomainResult<Vec<Post>>;
    async fn list_by_user(&self, user_id: Uuid) -> DomainResult<Vec<Post>>;
    /// Overwrites title, content and category only.
    async fn update(&self, id: i64, draft: &PostDraft) -> DomainResult<Option<Post>>;
    /// Adds exactly one view in a single atomic step and returns the new state.
    async fn increment_views(&self, id: i64) -> DomainResult<Option<Post>>;
    /// Removes the post and its reactions. Returns false when nothing matched.
    async fn delete(&self, id: i64) -> DomainResult<bool>;
}

/// Reaction persistence and aggregation.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ReactionRepository: Send + Sync {
    async fn find(&self, post_id: i64, user_id: Uuid) -> DomainResult<Option<Reaction>>;
    /// Post id → reaction count, for posts with at least one reaction.
    async fn count_by_post(&self) -> DomainResult<HashMap<i64, i64>>;
    async fn count_for_post(&self, post_id: i64) -> DomainResult<i64>;
    /// Commits a toggle (reaction insert/delete plus optional notice) as one unit.
    async fn apply(&self, change: ReactionChange) -> DomainResult<()>;
}

/// Notice mailbox persistence.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait NoticeRepository: Send + Sync {
    /// Notices addressed to `user_id`, newest id first.
    async fn list_for_user(&self, user_id: Uuid) -> DomainResult<Vec<Notice>>;
    /// Deletes every notice addressed to `user_id`; returns how many went.
    async fn clear_for_user(&self, user_id: Uuid) -> DomainResult<u64>;
    /// Deletes all global notices and inserts `notice` in one unit of work.
    async fn replace_global(&self, notice: NewNotice) -> DomainResult<Notice>;
    async fn current_global(&self) -> DomainResult<Option<Notice>>;
}

/// Account storage behind the identity provider.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` on a duplicate username or email.
    async fn create(&self, user: NewUser) -> DomainResult<User>;
    async fn find(&self, id: Uuid) -> DomainResult<Option<User>>;
    /// Matches either the username or the email address.
    async fn find_by_login(&self, login: &str) -> DomainResult<Option<User>>;
    async fn list(&self) -> DomainResult<Vec<User>>;
    async fn grant_role(&self, id: Uuid, role: Role) -> DomainResult<()>;
    /// Removes the user with their posts, reactions and notices.
    async fn delete_cascade(&self, id: Uuid) -> DomainResult<bool>;
}

/// Admin-managed categories.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn list(&self) -> DomainResult<Vec<Category>>;
    async fn find(&self, id: i64) -> DomainResult<Option<Category>>;
    /// Fails with `Conflict` on a duplicate name.
    async fn create(&self, name: &str) -> DomainResult<Category>;
    async fn rename(&self, id: i64, name: &str) -> DomainResult<Option<Category>>;
    async fn delete(&self, id: i64) -> DomainResult<bool>;
}

/// Password hashing supplied by the identity adapter.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> DomainResult<String>;
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Signed session tokens supplied by the identity adapter.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait SessionTokens: Send + Sync {
    fn issue(&self, principal: &Principal, session_id: Uuid) -> DomainResult<String>;
    /// Fails with `Unauthenticated` for malformed, forged or expired tokens.
    fn verify(&self, token: &str) -> DomainResult<(Principal, Uuid)>;
}

/// Forgery-protection tokens bound to a session (or pre-session) id.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait CsrfGuard: Send + Sync {
    fn issue(&self, session_id: &str) -> String;
    fn verify(&self, session_id: &str, token: &str) -> bool;
}
