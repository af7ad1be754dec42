//! Capability checks shared by the services.

use domains::{DomainError, DomainResult, Post, Principal, Role};

/// Entry check of every role-restricted operation.
pub fn require_role(principal: &Principal, role: Role) -> DomainResult<()> {
    if principal.has_role(role) {
        Ok(())
    } else {
        tracing::warn!(user_id = %principal.user_id, role = %role, "role check failed");
        Err(DomainError::Forbidden(format!("requires the {role} role")))
    }
}

/// Ordinary users may only change their own posts.
pub fn require_owner(post: &Post, actor: &Principal) -> DomainResult<()> {
    if post.user_id == actor.user_id {
        Ok(())
    } else {
        tracing::warn!(post_id = post.id, user_id = %actor.user_id, "ownership check failed");
        Err(DomainError::Forbidden("you do not own this post".into()))
    }
}
