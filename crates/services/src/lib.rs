//! # services
//!
//! Use-case orchestration over the domain ports: the feed engine, the
//! reaction toggler, post lifecycle, the notice mailbox, the admin surface
//! and accounts. No service touches I/O directly.

use std::sync::Arc;

use domains::{
    CategoryRepository, NoticeRepository, PasswordHasher, PostRepository, ReactionRepository,
    SessionTokens, UserRepository,
};

pub mod accounts;
pub mod admin;
pub mod authz;
pub mod feed;
pub mod notices;
pub mod posts;
pub mod reactions;

pub use accounts::{AccountService, Registration};
pub use admin::AdminService;
pub use authz::{require_owner, require_role};
pub use feed::FeedService;
pub use notices::NoticeService;
pub use posts::{PostDetail, PostService};
pub use reactions::ReactionService;

/// Storage ports handed to the service layer. One adapter usually backs
/// all five, but they are kept separate so tests can mock them one by one.
#[derive(Clone)]
pub struct Repositories {
    pub posts: Arc<dyn PostRepository>,
    pub reactions: Arc<dyn ReactionRepository>,
    pub notices: Arc<dyn NoticeRepository>,
    pub users: Arc<dyn UserRepository>,
    pub categories: Arc<dyn CategoryRepository>,
}

impl Repositories {
    /// Uses one store for every repository port.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: PostRepository
            + ReactionRepository
            + NoticeRepository
            + UserRepository
            + CategoryRepository
            + 'static,
    {
        Self {
            posts: store.clone(),
            reactions: store.clone(),
            notices: store.clone(),
            users: store.clone(),
            categories: store,
        }
    }
}

/// Every service, wired once at startup and shared across requests.
#[derive(Clone)]
pub struct AppServices {
    pub feed: Arc<FeedService>,
    pub posts: Arc<PostService>,
    pub reactions: Arc<ReactionService>,
    pub notices: Arc<NoticeService>,
    pub admin: Arc<AdminService>,
    pub accounts: Arc<AccountService>,
}

impl AppServices {
    pub fn new(
        repos: Repositories,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn SessionTokens>,
    ) -> Self {
        Self {
            feed: Arc::new(FeedService::new(
                repos.posts.clone(),
                repos.reactions.clone(),
                repos.categories.clone(),
            )),
            posts: Arc::new(PostService::new(repos.posts.clone(), repos.reactions.clone())),
            reactions: Arc::new(ReactionService::new(
                repos.posts.clone(),
                repos.reactions.clone(),
                repos.users.clone(),
            )),
            notices: Arc::new(NoticeService::new(repos.notices.clone())),
            admin: Arc::new(AdminService::new(
                repos.users.clone(),
                repos.posts.clone(),
                repos.categories.clone(),
            )),
            accounts: Arc::new(AccountService::new(repos.users, hasher, tokens)),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;
    use domains::{Post, Principal, Role};
    use uuid::Uuid;

    pub fn principal(name: &str) -> Principal {
        Principal {
            user_id: Uuid::new_v4(),
            username: name.to_string(),
            roles: vec![Role::User],
        }
    }

    pub fn admin(name: &str) -> Principal {
        Principal {
            roles: vec![Role::User, Role::Admin],
            ..principal(name)
        }
    }

    pub fn post_owned_by(id: i64, owner: &Principal) -> Post {
        Post {
            id,
            title: "Hello".into(),
            content: "World".into(),
            category: "Tech".into(),
            created_at: Utc::now(),
            view_count: 0,
            user_id: owner.user_id,
            username: owner.username.clone(),
        }
    }
}
