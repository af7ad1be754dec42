//! # Reaction Toggler
//!
//! Like/unlike semantics. A like on someone else's post drops a notice in
//! the owner's mailbox; an unlike never does.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use domains::{
    DomainError, DomainResult, NewNotice, NewReaction, PostRepository, Principal,
    ReactionChange, ReactionRepository, ToggleOutcome, UserRepository,
};

/// Label used when the liker's account can no longer be resolved.
pub const UNKNOWN_LIKER: &str = "Someone";

pub struct ReactionService {
    posts: Arc<dyn PostRepository>,
    reactions: Arc<dyn ReactionRepository>,
    users: Arc<dyn UserRepository>,
}

impl ReactionService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        reactions: Arc<dyn ReactionRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            posts,
            reactions,
            users,
        }
    }

    /// Flips the actor's reaction to `post_id`.
    ///
    /// The existence check and the write are not serialised against a
    /// concurrent toggle by the same user.
    pub async fn toggle(&self, post_id: i64, actor: &Principal) -> DomainResult<ToggleOutcome> {
        let post = self
            .posts
            .find(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", post_id))?;

        if let Some(existing) = self.reactions.find(post_id, actor.user_id).await? {
            self.reactions
                .apply(ReactionChange::Remove {
                    reaction_id: existing.id,
                })
                .await?;
            info!(post_id, user_id = %actor.user_id, "reaction removed");
            return Ok(ToggleOutcome::Unliked);
        }

        let notice = if post.user_id != actor.user_id {
            let liker = self
                .users
                .find(actor.user_id)
                .await?
                .map(|u| u.username)
                .unwrap_or_else(|| UNKNOWN_LIKER.to_string());
            Some(NewNotice::personal(
                post.user_id,
                format!("{liker} reacted to your post: {}", post.title),
            ))
        } else {
            None
        };
        let notified = notice.is_some();

        self.reactions
            .apply(ReactionChange::Add {
                reaction: NewReaction {
                    post_id,
                    user_id: actor.user_id,
                    created_at: Utc::now(),
                },
                notice,
            })
            .await?;
        info!(post_id, user_id = %actor.user_id, notified, "reaction added");
        Ok(ToggleOutcome::Liked { notified })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{post_owned_by, principal};
    use domains::{
        MockPostRepository, MockReactionRepository, MockUserRepository, Reaction, Role, User,
    };

    fn user_for(p: &Principal) -> User {
        User {
            id: p.user_id,
            username: p.username.clone(),
            email: format!("{}@example.com", p.username),
            password_hash: String::new(),
            roles: vec![Role::User],
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn first_like_on_foreign_post_notifies_owner() {
        let owner = principal("ada");
        let liker = principal("bob");
        let owner_id = owner.user_id;
        let post = post_owned_by(1, &owner);

        let mut posts = MockPostRepository::new();
        posts.expect_find().returning(move |_| Ok(Some(post.clone())));
        let mut users = MockUserRepository::new();
        let liker_user = user_for(&liker);
        users.expect_find().returning(move |_| Ok(Some(liker_user.clone())));
        let mut reactions = MockReactionRepository::new();
        reactions.expect_find().returning(|_, _| Ok(None));
        reactions
            .expect_apply()
            .withf(move |change: &ReactionChange| match change {
                ReactionChange::Add {
                    notice: Some(notice),
                    ..
                } => {
                    notice.user_id == Some(owner_id)
                        && notice.message == "bob reacted to your post: Hello"
                }
                _ => false,
            })
            .times(1)
            .returning(|_| Ok(()));

        let service = ReactionService::new(Arc::new(posts), Arc::new(reactions), Arc::new(users));
        let outcome = service.toggle(1, &liker).await.unwrap();
        assert_eq!(outcome, ToggleOutcome::Liked { notified: true });
    }

    #[tokio::test]
    async fn unresolvable_liker_is_someone() {
        let owner = principal("ada");
        let post = post_owned_by(1, &owner);

        let mut posts = MockPostRepository::new();
        posts.expect_find().returning(move |_| Ok(Some(post.clone())));
        let mut users = MockUserRepository::new();
        users.expect_find().returning(|_| Ok(None));
        let mut reactions = MockReactionRepository::new();
        reactions.expect_find().returning(|_, _| Ok(None));
        reactions
            .expect_apply()
            .withf(|change: &ReactionChange| {
                matches!(change, ReactionChange::Add { notice: Some(n), .. }
                    if n.message.starts_with("Someone reacted"))
            })
            .returning(|_| Ok(()));

        let service = ReactionService::new(Arc::new(posts), Arc::new(reactions), Arc::new(users));
        service.toggle(1, &principal("ghost")).await.unwrap();
    }

    #[tokio::test]
    async fn liking_own_post_sends_no_notice() {
        let owner = principal("ada");
        let post = post_owned_by(1, &owner);

        let mut posts = MockPostRepository::new();
        posts.expect_find().returning(move |_| Ok(Some(post.clone())));
        let mut reactions = MockReactionRepository::new();
        reactions.expect_find().returning(|_, _| Ok(None));
        reactions
            .expect_apply()
            .withf(|change: &ReactionChange| {
                matches!(change, ReactionChange::Add { notice: None, .. })
            })
            .returning(|_| Ok(()));

        let service = ReactionService::new(
            Arc::new(posts),
            Arc::new(reactions),
            Arc::new(MockUserRepository::new()),
        );
        let outcome = service.toggle(1, &owner).await.unwrap();
        assert_eq!(outcome, ToggleOutcome::Liked { notified: false });
    }

    #[tokio::test]
    async fn second_toggle_removes_without_notice() {
        let owner = principal("ada");
        let liker = principal("bob");
        let liker_id = liker.user_id;
        let post = post_owned_by(1, &owner);

        let mut posts = MockPostRepository::new();
        posts.expect_find().returning(move |_| Ok(Some(post.clone())));
        let mut reactions = MockReactionRepository::new();
        reactions.expect_find().returning(move |post_id, _| {
            Ok(Some(Reaction {
                id: 77,
                post_id,
                user_id: liker_id,
                created_at: Utc::now(),
            }))
        });
        reactions
            .expect_apply()
            .withf(|change: &ReactionChange| *change == ReactionChange::Remove { reaction_id: 77 })
            .times(1)
            .returning(|_| Ok(()));

        let service = ReactionService::new(
            Arc::new(posts),
            Arc::new(reactions),
            Arc::new(MockUserRepository::new()),
        );
        assert_eq!(service.toggle(1, &liker).await.unwrap(), ToggleOutcome::Unliked);
    }

    #[tokio::test]
    async fn missing_post_writes_nothing() {
        let mut posts = MockPostRepository::new();
        posts.expect_find().returning(|_| Ok(None));
        let mut reactions = MockReactionRepository::new();
        reactions.expect_apply().times(0);

        let service = ReactionService::new(
            Arc::new(posts),
            Arc::new(reactions),
            Arc::new(MockUserRepository::new()),
        );
        let result = service.toggle(404, &principal("bob")).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }
}
