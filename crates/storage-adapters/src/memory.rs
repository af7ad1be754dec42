//! In-process store backed by `DashMap`.
//!
//! Single-entity reads and writes go straight to the maps. Anything that
//! touches more than one map (a toggle with its notice, cascading deletes,
//! the global notice swap, uniqueness checks) runs under `write_lock` so
//! readers never see half of it applied.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use domains::{
    Category, CategoryRepository, DomainError, DomainResult, FeedQuery, NewNotice, NewPost,
    NewUser, Notice, NoticeRepository, Post, PostDraft, PostRepository, Reaction, ReactionChange,
    ReactionRepository, Role, User, UserRepository,
};

#[derive(Default)]
pub struct InMemoryStore {
    users: DashMap<Uuid, User>,
    posts: DashMap<i64, Post>,
    reactions: DashMap<i64, Reaction>,
    notices: DashMap<i64, Notice>,
    categories: DashMap<i64, Category>,
    post_seq: AtomicI64,
    reaction_seq: AtomicI64,
    notice_seq: AtomicI64,
    category_seq: AtomicI64,
    write_lock: Mutex<()>,
}

fn next_id(seq: &AtomicI64) -> i64 {
    seq.fetch_add(1, Ordering::SeqCst) + 1
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert_notice(&self, notice: NewNotice) -> Notice {
        let notice = Notice {
            id: next_id(&self.notice_seq),
            user_id: notice.user_id,
            message: notice.message,
            created_at: notice.created_at,
        };
        self.notices.insert(notice.id, notice.clone());
        notice
    }

    /// Drops every reaction matching `pred`. Keys are collected first so no
    /// shard guard is held while removing.
    fn remove_reactions_where(&self, pred: impl Fn(&Reaction) -> bool) -> usize {
        let ids: Vec<i64> = self
            .reactions
            .iter()
            .filter(|r| pred(r.value()))
            .map(|r| *r.key())
            .collect();
        for id in &ids {
            self.reactions.remove(id);
        }
        ids.len()
    }

    fn remove_notices_where(&self, pred: impl Fn(&Notice) -> bool) -> usize {
        let ids: Vec<i64> = self
            .notices
            .iter()
            .filter(|n| pred(n.value()))
            .map(|n| *n.key())
            .collect();
        for id in &ids {
            self.notices.remove(id);
        }
        ids.len()
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn create(&self, post: NewPost) -> DomainResult<Post> {
        let post = Post {
            id: next_id(&self.post_seq),
            title: post.title,
            content: post.content,
            category: post.category,
            created_at: post.created_at,
            view_count: 0,
            user_id: post.user_id,
            username: post.username,
        };
        self.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn find(&self, id: i64) -> DomainResult<Option<Post>> {
        Ok(self.posts.get(&id).map(|p| p.value().clone()))
    }

    async fn list(&self, query: &FeedQuery) -> DomainResult<Vec<Post>> {
        let posts: Vec<Post> = self.posts.iter().map(|p| p.value().clone()).collect();
        Ok(query.apply(posts))
    }

    async fn list_by_user(&self, user_id: Uuid) -> DomainResult<Vec<Post>> {
        let mine = self
            .posts
            .iter()
            .filter(|p| p.user_id == user_id)
            .map(|p| p.value().clone());
        Ok(FeedQuery::new(None, domains::SortOrder::Recent).apply(mine))
    }

    async fn update(&self, id: i64, draft: &PostDraft) -> DomainResult<Option<Post>> {
        Ok(self.posts.get_mut(&id).map(|mut post| {
            post.title = draft.title.clone();
            post.content = draft.content.clone();
            post.category = draft.category.clone();
            post.clone()
        }))
    }

    async fn increment_views(&self, id: i64) -> DomainResult<Option<Post>> {
        // The shard write guard makes the read-modify-write atomic.
        Ok(self.posts.get_mut(&id).map(|mut post| {
            post.view_count += 1;
            post.clone()
        }))
    }

    async fn delete(&self, id: i64) -> DomainResult<bool> {
        let _guard = self.write_lock.lock().await;
        if self.posts.remove(&id).is_none() {
            return Ok(false);
        }
        let dropped = self.remove_reactions_where(|r| r.post_id == id);
        debug!(post_id = id, reactions = dropped, "post removed from memory store");
        Ok(true)
    }
}

#[async_trait]
impl ReactionRepository for InMemoryStore {
    async fn find(&self, post_id: i64, user_id: Uuid) -> DomainResult<Option<Reaction>> {
        Ok(self
            .reactions
            .iter()
            .filter(|r| r.post_id == post_id && r.user_id == user_id)
            .map(|r| r.value().clone())
            .min_by_key(|r| r.id))
    }

    async fn count_by_post(&self) -> DomainResult<HashMap<i64, i64>> {
        let mut counts = HashMap::new();
        for reaction in self.reactions.iter() {
            *counts.entry(reaction.post_id).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn count_for_post(&self, post_id: i64) -> DomainResult<i64> {
        Ok(self.reactions.iter().filter(|r| r.post_id == post_id).count() as i64)
    }

    async fn apply(&self, change: ReactionChange) -> DomainResult<()> {
        let _guard = self.write_lock.lock().await;
        match change {
            ReactionChange::Add { reaction, notice } => {
                if !self.posts.contains_key(&reaction.post_id) {
                    return Err(DomainError::not_found("Post", reaction.post_id));
                }
                let reaction = Reaction {
                    id: next_id(&self.reaction_seq),
                    post_id: reaction.post_id,
                    user_id: reaction.user_id,
                    created_at: reaction.created_at,
                };
                self.reactions.insert(reaction.id, reaction);
                if let Some(notice) = notice {
                    self.insert_notice(notice);
                }
            }
            ReactionChange::Remove { reaction_id } => {
                self.reactions.remove(&reaction_id);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl NoticeRepository for InMemoryStore {
    async fn list_for_user(&self, user_id: Uuid) -> DomainResult<Vec<Notice>> {
        let mut notices: Vec<Notice> = self
            .notices
            .iter()
            .filter(|n| n.user_id == Some(user_id))
            .map(|n| n.value().clone())
            .collect();
        notices.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(notices)
    }

    async fn clear_for_user(&self, user_id: Uuid) -> DomainResult<u64> {
        let _guard = self.write_lock.lock().await;
        Ok(self.remove_notices_where(|n| n.user_id == Some(user_id)) as u64)
    }

    async fn replace_global(&self, notice: NewNotice) -> DomainResult<Notice> {
        let _guard = self.write_lock.lock().await;
        self.remove_notices_where(Notice::is_global);
        Ok(self.insert_notice(NewNotice {
            user_id: None,
            ..notice
        }))
    }

    async fn current_global(&self) -> DomainResult<Option<Notice>> {
        Ok(self
            .notices
            .iter()
            .filter(|n| n.is_global())
            .map(|n| n.value().clone())
            .max_by_key(|n| n.id))
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, user: NewUser) -> DomainResult<User> {
        let _guard = self.write_lock.lock().await;
        let taken = self.users.iter().find_map(|u| {
            if u.username.eq_ignore_ascii_case(&user.username) {
                Some("Username is already taken")
            } else if u.email.eq_ignore_ascii_case(&user.email) {
                Some("Email is already registered")
            } else {
                None
            }
        });
        if let Some(reason) = taken {
            return Err(DomainError::Conflict(reason.to_string()));
        }

        let user = User {
            id: user.id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            roles: user.roles,
            created_at: user.created_at,
        };
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find(&self, id: Uuid) -> DomainResult<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn find_by_login(&self, login: &str) -> DomainResult<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.username.eq_ignore_ascii_case(login) || u.email.eq_ignore_ascii_case(login))
            .map(|u| u.value().clone()))
    }

    async fn list(&self) -> DomainResult<Vec<User>> {
        let mut users: Vec<User> = self.users.iter().map(|u| u.value().clone()).collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn grant_role(&self, id: Uuid, role: Role) -> DomainResult<()> {
        let mut user = self
            .users
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("User", id))?;
        if !user.roles.contains(&role) {
            user.roles.push(role);
        }
        Ok(())
    }

    async fn delete_cascade(&self, id: Uuid) -> DomainResult<bool> {
        let _guard = self.write_lock.lock().await;
        if self.users.remove(&id).is_none() {
            return Ok(false);
        }

        let owned_posts: Vec<i64> = self
            .posts
            .iter()
            .filter(|p| p.user_id == id)
            .map(|p| *p.key())
            .collect();
        for post_id in &owned_posts {
            self.posts.remove(post_id);
        }
        self.remove_reactions_where(|r| r.user_id == id || owned_posts.contains(&r.post_id));
        self.remove_notices_where(|n| n.user_id == Some(id));
        debug!(user_id = %id, posts = owned_posts.len(), "user removed from memory store");
        Ok(true)
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn list(&self) -> DomainResult<Vec<Category>> {
        let mut categories: Vec<Category> =
            self.categories.iter().map(|c| c.value().clone()).collect();
        categories.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(categories)
    }

    async fn find(&self, id: i64) -> DomainResult<Option<Category>> {
        Ok(self.categories.get(&id).map(|c| c.value().clone()))
    }

    async fn create(&self, name: &str) -> DomainResult<Category> {
        let _guard = self.write_lock.lock().await;
        if self.categories.iter().any(|c| c.name.eq_ignore_ascii_case(name)) {
            return Err(DomainError::Conflict(format!(
                "Category '{name}' already exists"
            )));
        }
        let category = Category {
            id: next_id(&self.category_seq),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        self.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn rename(&self, id: i64, name: &str) -> DomainResult<Option<Category>> {
        let _guard = self.write_lock.lock().await;
        if self
            .categories
            .iter()
            .any(|c| c.id != id && c.name.eq_ignore_ascii_case(name))
        {
            return Err(DomainError::Conflict(format!(
                "Category '{name}' already exists"
            )));
        }
        Ok(self.categories.get_mut(&id).map(|mut c| {
            c.name = name.to_string();
            c.clone()
        }))
    }

    async fn delete(&self, id: i64) -> DomainResult<bool> {
        Ok(self.categories.remove(&id).is_some())
    }
}
