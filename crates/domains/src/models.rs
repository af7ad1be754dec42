//! # Domain Models
//!
//! These structs represent the core entities of Inkwell.
//! Posts, reactions, notices and categories use store-generated `i64`
//! identifiers; users are identified by UUID v4.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{DomainError, DomainResult};

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_CATEGORY_LEN: usize = 64;
pub const MAX_CONTENT_LEN: usize = 20_000;

/// Membership roles granted by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(DomainError::validation(format!("unknown role '{other}'"))),
        }
    }
}

/// A registered account. Owned by the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn principal(&self) -> Principal {
        Principal {
            user_id: self.id,
            username: self.username.clone(),
            roles: self.roles.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
}

/// The authenticated identity behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub username: String,
    pub roles: Vec<Role>,
}

impl Principal {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}

/// A principal together with the id of the session that carries it.
/// The session id is what forgery-protection tokens are bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub principal: Principal,
    pub session_id: Uuid,
}

/// A blog post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    /// Free-text category; matched case-insensitively by the feed filter
    pub category: String,
    pub created_at: DateTime<Utc>,
    /// Only ever incremented, and only by a detail view
    pub view_count: i64,
    pub user_id: Uuid,
    /// Author's username at the time of creation
    pub username: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub user_id: Uuid,
    pub username: String,
}

/// The user-editable fields of a post, as submitted by a form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub category: String,
}

impl PostDraft {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            category: category.into(),
        }
    }

    /// Trims every field and checks presence and length limits.
    pub fn validate(&self) -> DomainResult<PostDraft> {
        let draft = PostDraft {
            title: self.title.trim().to_string(),
            content: self.content.trim().to_string(),
            category: self.category.trim().to_string(),
        };

        if draft.title.is_empty() {
            return Err(DomainError::validation("Title is required"));
        }
        if draft.title.chars().count() > MAX_TITLE_LEN {
            return Err(DomainError::validation(format!(
                "Title must be at most {MAX_TITLE_LEN} characters"
            )));
        }
        if draft.content.is_empty() {
            return Err(DomainError::validation("Content is required"));
        }
        if draft.content.chars().count() > MAX_CONTENT_LEN {
            return Err(DomainError::validation(format!(
                "Content must be at most {MAX_CONTENT_LEN} characters"
            )));
        }
        if draft.category.is_empty() {
            return Err(DomainError::validation("Category is required"));
        }
        if draft.category.chars().count() > MAX_CATEGORY_LEN {
            return Err(DomainError::validation(format!(
                "Category must be at most {MAX_CATEGORY_LEN} characters"
            )));
        }
        Ok(draft)
    }
}

impl From<&Post> for PostDraft {
    fn from(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            content: post.content.clone(),
            category: post.category.clone(),
        }
    }
}

/// A like linking one user to one post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    pub id: i64,
    pub post_id: i64,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewReaction {
    pub post_id: i64,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A single unit of work produced by the reaction toggler.
/// Adapters must apply every part of a change atomically.
#[derive(Debug, Clone, PartialEq)]
pub enum ReactionChange {
    Add {
        reaction: NewReaction,
        notice: Option<NewNotice>,
    },
    Remove {
        reaction_id: i64,
    },
}

/// What a toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Liked { notified: bool },
    Unliked,
}

/// A mailbox message. `user_id == None` marks the global notice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub id: i64,
    pub user_id: Option<Uuid>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notice {
    pub fn is_global(&self) -> bool {
        self.user_id.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewNotice {
    pub user_id: Option<Uuid>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl NewNotice {
    pub fn personal(user_id: Uuid, message: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id),
            message: message.into(),
            created_at: Utc::now(),
        }
    }

    pub fn global(message: impl Into<String>) -> Self {
        Self {
            user_id: None,
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}

/// An admin-managed post category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Validates and normalises a category name.
pub fn validate_category_name(name: &str) -> DomainResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("Name is required"));
    }
    if name.chars().count() > MAX_CATEGORY_LEN {
        return Err(DomainError::validation(format!(
            "Name must be at most {MAX_CATEGORY_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

/// The result of a user-facing action, reported on the next page render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub success: bool,
    pub message: String,
}

impl ActionOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
