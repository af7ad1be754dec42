mod common;

use common::TestApp;
use domains::{FeedQuery, SortOrder};

fn titles(posts: &[domains::Post]) -> Vec<&str> {
    posts.iter().map(|p| p.title.as_str()).collect()
}

#[tokio::test]
async fn category_filter_ignores_case_and_all_means_everything() {
    let app = TestApp::new();
    let author = app.user().await;
    app.post(&author, "Rust tips", "Tech").await;
    app.post(&author, "Sourdough", "Food").await;
    app.post(&author, "Async deep dive", "tech").await;

    let feed = app.services.feed.clone();

    let tech = feed
        .feed(&FeedQuery::new(Some("TECH".into()), SortOrder::Title))
        .await
        .unwrap();
    assert_eq!(titles(&tech.posts), vec!["Async deep dive", "Rust tips"]);

    for everything in [None, Some("All".to_string()), Some(String::new())] {
        let all = feed
            .feed(&FeedQuery::new(everything, SortOrder::Title))
            .await
            .unwrap();
        assert_eq!(all.posts.len(), 3);
    }

    let none = feed
        .feed(&FeedQuery::new(Some("Travel".into()), SortOrder::Title))
        .await
        .unwrap();
    assert!(none.posts.is_empty());
}

#[tokio::test]
async fn most_viewed_follows_detail_views() {
    let app = TestApp::new();
    let author = app.user().await;
    let quiet = app.post(&author, "Quiet", "Tech").await;
    let busy = app.post(&author, "Busy", "Tech").await;
    let medium = app.post(&author, "Medium", "Tech").await;

    for _ in 0..5 {
        app.services.posts.detail(busy.id).await.unwrap();
    }
    for _ in 0..2 {
        app.services.posts.detail(medium.id).await.unwrap();
    }

    let feed = app
        .services
        .feed
        .feed(&FeedQuery::new(None, SortOrder::parse(Some("mostViewed"))))
        .await
        .unwrap();
    let ids: Vec<i64> = feed.posts.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![busy.id, medium.id, quiet.id]);
    assert_eq!(feed.posts[0].view_count, 5);
}

#[tokio::test]
async fn unknown_sort_key_falls_back_to_title() {
    let app = TestApp::new();
    let author = app.user().await;
    app.post(&author, "Zebra", "Animals").await;
    app.post(&author, "Aardvark", "Animals").await;

    let feed = app
        .services
        .feed
        .feed(&FeedQuery::new(None, SortOrder::parse(Some("bogus"))))
        .await
        .unwrap();
    assert_eq!(titles(&feed.posts), vec!["Aardvark", "Zebra"]);
}

#[tokio::test]
async fn trending_ranks_by_likes_and_latest_by_creation() {
    let app = TestApp::new();
    let author = app.user().await;
    let fans = [app.user().await, app.user().await];

    let first = app.post(&author, "First", "Tech").await;
    let second = app.post(&author, "Second", "Tech").await;
    let third = app.post(&author, "Third", "Tech").await;

    for fan in &fans {
        app.services
            .reactions
            .toggle(second.id, &fan.principal())
            .await
            .unwrap();
    }
    app.services
        .reactions
        .toggle(third.id, &fans[0].principal())
        .await
        .unwrap();

    let trending = app.services.feed.trending().await.unwrap();
    let ids: Vec<i64> = trending.posts.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![second.id, third.id, first.id]);
    assert_eq!(trending.like_count(second.id), 2);

    let latest = app.services.feed.latest().await.unwrap();
    let ids: Vec<i64> = latest.posts.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![third.id, second.id, first.id]);
}

#[tokio::test]
async fn by_author_only_lists_own_posts() {
    let app = TestApp::new();
    let ada = app.user().await;
    let bob = app.user().await;
    app.post(&ada, "Mine", "Tech").await;
    app.post(&bob, "Theirs", "Tech").await;

    let mine = app.services.feed.by_author(&ada.principal()).await.unwrap();
    assert_eq!(titles(&mine.posts), vec!["Mine"]);
}
