//! # Admin surface
//!
//! User removal, unrestricted post management and category CRUD. Every
//! entry point starts with the admin role check.

use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use domains::{
    validate_category_name, ActionOutcome, Category, CategoryRepository, DomainError,
    DomainResult, FeedQuery, Post, PostDraft, PostRepository, Principal, Role, SortOrder, User,
    UserRepository,
};

use crate::authz::require_role;

pub struct AdminService {
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
    categories: Arc<dyn CategoryRepository>,
}

impl AdminService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        posts: Arc<dyn PostRepository>,
        categories: Arc<dyn CategoryRepository>,
    ) -> Self {
        Self {
            users,
            posts,
            categories,
        }
    }

    // Users

    pub async fn list_users(&self, admin: &Principal) -> DomainResult<Vec<User>> {
        require_role(admin, Role::Admin)?;
        self.users.list().await
    }

    /// Deletes a user along with everything they own.
    pub async fn delete_user(&self, admin: &Principal, target: Uuid) -> DomainResult<ActionOutcome> {
        require_role(admin, Role::Admin)?;

        if target == admin.user_id {
            return Ok(ActionOutcome::err(
                "You cannot delete your own admin account while logged in.",
            ));
        }
        if self.users.find(target).await?.is_none() {
            return Ok(ActionOutcome::err("User not found."));
        }

        match self.users.delete_cascade(target).await {
            Ok(true) => {
                info!(user_id = %target, admin_id = %admin.user_id, "user deleted");
                Ok(ActionOutcome::ok("User deleted successfully."))
            }
            Ok(false) => Ok(ActionOutcome::err("User not found.")),
            Err(e) => {
                error!(error = %e, user_id = %target, "failed to delete user");
                Ok(ActionOutcome::err(format!("Failed to delete user: {e}")))
            }
        }
    }

    // Posts

    pub async fn list_posts(&self, admin: &Principal) -> DomainResult<Vec<Post>> {
        require_role(admin, Role::Admin)?;
        self.posts.list(&FeedQuery::new(None, SortOrder::Recent)).await
    }

    /// Unlike the public detail page this does not count a view.
    pub async fn post(&self, admin: &Principal, id: i64) -> DomainResult<Post> {
        require_role(admin, Role::Admin)?;
        self.posts
            .find(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", id))
    }

    pub async fn edit_post(
        &self,
        admin: &Principal,
        id: i64,
        draft: &PostDraft,
    ) -> DomainResult<Post> {
        require_role(admin, Role::Admin)?;
        let draft = draft.validate()?;
        let post = self
            .posts
            .update(id, &draft)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", id))?;
        info!(post_id = id, admin_id = %admin.user_id, "post edited by admin");
        Ok(post)
    }

    /// Missing posts are not an error here.
    pub async fn delete_post(&self, admin: &Principal, id: i64) -> DomainResult<bool> {
        require_role(admin, Role::Admin)?;
        let deleted = self.posts.delete(id).await?;
        if deleted {
            info!(post_id = id, admin_id = %admin.user_id, "post deleted by admin");
        }
        Ok(deleted)
    }

    // Categories

    pub async fn list_categories(&self, admin: &Principal) -> DomainResult<Vec<Category>> {
        require_role(admin, Role::Admin)?;
        self.categories.list().await
    }

    pub async fn category(&self, admin: &Principal, id: i64) -> DomainResult<Category> {
        require_role(admin, Role::Admin)?;
        self.categories
            .find(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Category", id))
    }

    pub async fn create_category(&self, admin: &Principal, name: &str) -> DomainResult<Category> {
        require_role(admin, Role::Admin)?;
        let name = validate_category_name(name)?;
        let category = self.categories.create(&name).await?;
        info!(category_id = category.id, "category created");
        Ok(category)
    }

    pub async fn rename_category(
        &self,
        admin: &Principal,
        id: i64,
        name: &str,
    ) -> DomainResult<Category> {
        require_role(admin, Role::Admin)?;
        let name = validate_category_name(name)?;
        self.categories
            .rename(id, &name)
            .await?
            .ok_or_else(|| DomainError::not_found("Category", id))
    }

    pub async fn delete_category(&self, admin: &Principal, id: i64) -> DomainResult<()> {
        require_role(admin, Role::Admin)?;
        if !self.categories.delete(id).await? {
            return Err(DomainError::not_found("Category", id));
        }
        info!(category_id = id, "category deleted");
        Ok(())
    }
}
