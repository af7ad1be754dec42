mod common;

use common::TestApp;
use domains::{DomainError, NoticeRepository};

#[tokio::test]
async fn broadcast_keeps_a_single_global_notice() {
    let app = TestApp::new();
    let admin = app.admin().await;

    for message in ["Maintenance tonight", "Maintenance done", "  Welcome!  "] {
        let outcome = app
            .services
            .notices
            .broadcast(&admin.principal(), message)
            .await
            .unwrap();
        assert!(outcome.success);
    }

    let global = app.services.notices.current_global().await.unwrap().unwrap();
    assert_eq!(global.message, "Welcome!");
    assert!(global.is_global());
}

#[tokio::test]
async fn empty_broadcast_is_reported_and_keeps_the_old_notice() {
    let app = TestApp::new();
    let admin = app.admin().await;
    app.services
        .notices
        .broadcast(&admin.principal(), "Hello")
        .await
        .unwrap();

    let outcome = app
        .services
        .notices
        .broadcast(&admin.principal(), "   ")
        .await
        .unwrap();
    assert!(!outcome.success);
    assert_eq!(outcome.message, "Notice cannot be empty.");

    let global = app.services.notices.current_global().await.unwrap().unwrap();
    assert_eq!(global.message, "Hello");
}

#[tokio::test]
async fn regular_users_cannot_broadcast() {
    let app = TestApp::new();
    let user = app.user().await;

    let result = app
        .services
        .notices
        .broadcast(&user.principal(), "Hi all")
        .await;
    assert!(matches!(result, Err(DomainError::Forbidden(_))));
    assert!(app.store.current_global().await.unwrap().is_none());
}

#[tokio::test]
async fn mailbox_is_private_and_clearing_spares_the_global_notice() {
    let app = TestApp::new();
    let admin = app.admin().await;
    let ada = app.user().await;
    let bob = app.user().await;
    let ada_post = app.post(&ada, "Ada's post", "Tech").await;
    let bob_post = app.post(&bob, "Bob's post", "Tech").await;

    app.services
        .reactions
        .toggle(ada_post.id, &bob.principal())
        .await
        .unwrap();
    app.services
        .reactions
        .toggle(bob_post.id, &ada.principal())
        .await
        .unwrap();
    app.services
        .notices
        .broadcast(&admin.principal(), "Global news")
        .await
        .unwrap();

    let ada_box = app.services.notices.list(&ada.principal()).await.unwrap();
    assert_eq!(ada_box.len(), 1);
    assert!(ada_box.iter().all(|n| n.user_id == Some(ada.id)));

    let outcome = app.services.notices.clear(&ada.principal()).await.unwrap();
    assert!(outcome.success);
    assert!(app.services.notices.list(&ada.principal()).await.unwrap().is_empty());

    assert_eq!(app.services.notices.list(&bob.principal()).await.unwrap().len(), 1);
    assert!(app.services.notices.current_global().await.unwrap().is_some());
}
