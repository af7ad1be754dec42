mod common;

use common::TestApp;
use domains::{DomainError, NoticeRepository, PostDraft, ReactionRepository, Role, UserRepository};

#[tokio::test]
async fn ensure_admin_is_idempotent() {
    let app = TestApp::new();
    let first = app.admin().await;
    let second = app.admin().await;
    assert_eq!(first.id, second.id);
    assert!(second.roles.contains(&Role::Admin));
    assert_eq!(UserRepository::list(&*app.store).await.unwrap().len(), 1);
}

#[tokio::test]
async fn deleting_a_user_removes_everything_they_own() {
    let app = TestApp::new();
    let admin = app.admin().await;
    let doomed = app.user().await;
    let survivor = app.user().await;

    let doomed_post = app.post(&doomed, "Going away", "Tech").await;
    let survivor_post = app.post(&survivor, "Staying", "Tech").await;
    app.services
        .reactions
        .toggle(survivor_post.id, &doomed.principal())
        .await
        .unwrap();
    app.services
        .reactions
        .toggle(doomed_post.id, &survivor.principal())
        .await
        .unwrap();

    let outcome = app
        .services
        .admin
        .delete_user(&admin.principal(), doomed.id)
        .await
        .unwrap();
    assert!(outcome.success, "{}", outcome.message);

    assert!(UserRepository::find(&*app.store, doomed.id).await.unwrap().is_none());
    let posts = app.services.admin.list_posts(&admin.principal()).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].id, survivor_post.id);
    assert!(app.store.count_by_post().await.unwrap().is_empty());
    assert!(app.store.list_for_user(doomed.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn admin_cannot_delete_themselves_or_a_stranger() {
    let app = TestApp::new();
    let admin = app.admin().await;

    let outcome = app
        .services
        .admin
        .delete_user(&admin.principal(), admin.id)
        .await
        .unwrap();
    assert!(!outcome.success);

    let outcome = app
        .services
        .admin
        .delete_user(&admin.principal(), uuid::Uuid::new_v4())
        .await
        .unwrap();
    assert!(!outcome.success);
    assert_eq!(outcome.message, "User not found.");
}

#[tokio::test]
async fn admin_post_edits_skip_ownership_but_not_validation() {
    let app = TestApp::new();
    let admin = app.admin().await;
    let author = app.user().await;
    let post = app.post(&author, "Typo", "Tech").await;

    let edited = app
        .services
        .admin
        .edit_post(&admin.principal(), post.id, &PostDraft::new("Fixed", "Body", "Tech"))
        .await
        .unwrap();
    assert_eq!(edited.title, "Fixed");
    assert_eq!(edited.user_id, author.id);

    let result = app
        .services
        .admin
        .edit_post(&admin.principal(), post.id, &PostDraft::new("", "Body", "Tech"))
        .await;
    assert!(matches!(result, Err(DomainError::Validation(_))));

    assert!(app
        .services
        .admin
        .delete_post(&admin.principal(), post.id)
        .await
        .unwrap());
    assert!(!app
        .services
        .admin
        .delete_post(&admin.principal(), post.id)
        .await
        .unwrap());
}

#[tokio::test]
async fn every_admin_operation_requires_the_role() {
    let app = TestApp::new();
    let user = app.user().await;
    let p = user.principal();
    let admin = &app.services.admin;

    assert!(matches!(admin.list_users(&p).await, Err(DomainError::Forbidden(_))));
    assert!(matches!(admin.list_posts(&p).await, Err(DomainError::Forbidden(_))));
    assert!(matches!(
        admin.delete_user(&p, user.id).await,
        Err(DomainError::Forbidden(_))
    ));
    assert!(matches!(
        admin.create_category(&p, "Tech").await,
        Err(DomainError::Forbidden(_))
    ));
}

#[tokio::test]
async fn category_crud_enforces_unique_names() {
    let app = TestApp::new();
    let admin = app.admin().await;
    let p = admin.principal();
    let admin_service = &app.services.admin;

    let tech = admin_service.create_category(&p, "  Tech ").await.unwrap();
    assert_eq!(tech.name, "Tech");
    let food = admin_service.create_category(&p, "Food").await.unwrap();

    assert!(matches!(
        admin_service.create_category(&p, "tech").await,
        Err(DomainError::Conflict(_))
    ));
    assert!(matches!(
        admin_service.rename_category(&p, food.id, "TECH").await,
        Err(DomainError::Conflict(_))
    ));
    assert!(matches!(
        admin_service.create_category(&p, "").await,
        Err(DomainError::Validation(_))
    ));

    let renamed = admin_service
        .rename_category(&p, food.id, "Cooking")
        .await
        .unwrap();
    assert_eq!(renamed.name, "Cooking");

    admin_service.delete_category(&p, tech.id).await.unwrap();
    assert!(matches!(
        admin_service.delete_category(&p, tech.id).await,
        Err(DomainError::NotFound { .. })
    ));

    let names: Vec<String> = app
        .services
        .feed
        .categories()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Cooking"]);
}
