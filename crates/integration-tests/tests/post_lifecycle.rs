mod common;

use std::sync::Arc;

use common::TestApp;
use domains::{DomainError, PostDraft, PostRepository, ReactionRepository};
use tokio_test::assert_ok;

#[tokio::test]
async fn new_posts_start_unviewed_and_each_detail_counts_once() {
    let app = TestApp::new();
    let author = app.user().await;
    let post = app.post(&author, "Counting", "Tech").await;
    assert_eq!(post.view_count, 0);

    for expected in 1..=3 {
        let detail = app.services.posts.detail(post.id).await.unwrap();
        assert_eq!(detail.post.view_count, expected);
    }
}

#[tokio::test]
async fn concurrent_views_are_all_counted() {
    let app = TestApp::new();
    let author = app.user().await;
    let post = app.post(&author, "Popular", "Tech").await;
    let posts = app.services.posts.clone();

    let handles: Vec<_> = (0..25)
        .map(|_| {
            let posts = Arc::clone(&posts);
            let id = post.id;
            tokio::spawn(async move { posts.detail(id).await })
        })
        .collect();
    for handle in handles {
        assert_ok!(handle.await.unwrap());
    }

    let stored = PostRepository::find(&*app.store, post.id).await.unwrap().unwrap();
    assert_eq!(stored.view_count, 25);
}

#[tokio::test]
async fn only_the_owner_edits_and_deletes() {
    let app = TestApp::new();
    let owner = app.user().await;
    let stranger = app.user().await;
    let post = app.post(&owner, "Original", "Tech").await;

    let draft = PostDraft::new("Hijacked", "nope", "Tech");
    let result = app
        .services
        .posts
        .edit(post.id, &stranger.principal(), &draft)
        .await;
    assert!(matches!(result, Err(DomainError::Forbidden(_))));

    let result = app.services.posts.delete(post.id, &stranger.principal()).await;
    assert!(matches!(result, Err(DomainError::Forbidden(_))));

    let edited = app
        .services
        .posts
        .edit(post.id, &owner.principal(), &PostDraft::new("Revised", "Better", "Food"))
        .await
        .unwrap();
    assert_eq!(edited.title, "Revised");
    assert_eq!(edited.category, "Food");
    assert_eq!(edited.user_id, owner.id);
    assert_eq!(edited.created_at, post.created_at);
}

#[tokio::test]
async fn invalid_drafts_are_rejected() {
    let app = TestApp::new();
    let author = app.user().await;

    let result = app
        .services
        .posts
        .create(&author.principal(), &PostDraft::new("   ", "body", "Tech"))
        .await;
    assert!(matches!(result, Err(DomainError::Validation(_))));

    let result = app
        .services
        .posts
        .create(&author.principal(), &PostDraft::new("Title", "body", ""))
        .await;
    assert!(matches!(result, Err(DomainError::Validation(_))));
}

#[tokio::test]
async fn deleting_a_post_removes_its_reactions() {
    let app = TestApp::new();
    let owner = app.user().await;
    let fan = app.user().await;
    let post = app.post(&owner, "Short lived", "Tech").await;

    app.services
        .reactions
        .toggle(post.id, &fan.principal())
        .await
        .unwrap();
    assert_eq!(app.store.count_for_post(post.id).await.unwrap(), 1);

    app.services
        .posts
        .delete(post.id, &owner.principal())
        .await
        .unwrap();
    assert_eq!(app.store.count_for_post(post.id).await.unwrap(), 0);

    let result = app.services.posts.detail(post.id).await;
    assert!(matches!(result, Err(DomainError::NotFound { .. })));
}
