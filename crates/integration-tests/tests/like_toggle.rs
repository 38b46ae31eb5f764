use std::sync::Arc;

use domains::{Actor, DomainError, LikeRepository, LikeToggle, LikeView, StoryCategory};
use integration_tests::TestApp;
use tokio_test::assert_ok;
use uuid::Uuid;

#[tokio::test]
async fn toggling_twice_restores_state() {
    let app = TestApp::new();
    let author = app.member().await;
    let fan = app.member().await;
    let story = app.story(&author, StoryCategory::Friendship).await;

    let before = app.state.likes.status(&fan.actor(), story.id).await.unwrap();
    app.state.likes.toggle(&fan.actor(), story.id).await.unwrap();
    app.state.likes.toggle(&fan.actor(), story.id).await.unwrap();
    let after = app.state.likes.status(&fan.actor(), story.id).await.unwrap();

    assert_eq!(before, after);
    assert!(app.state.likes.likes_for_story(story.id).await.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn distinct_users_toggling_concurrently_all_count() {
    let app = TestApp::new();
    let author = app.member().await;
    let story = app.story(&author, StoryCategory::Adventure).await;
    let store = app.store.clone();

    let handles: Vec<_> = (0..50)
        .map(|_| {
            let store = store.clone();
            let story_id = story.id;
            tokio::spawn(async move { store.toggle_like(story_id, Uuid::now_v7()).await })
        })
        .collect();
    for handle in handles {
        let outcome = handle.await.unwrap().unwrap();
        assert!(outcome.liked);
    }

    let stored = app.state.stories.get_story(story.id).await.unwrap();
    assert_eq!(stored.like_count, 50);
    assert_eq!(app.state.likes.like_count_for_story(story.id).await, 50);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn one_user_hammering_the_button_ends_consistent() {
    let app = Arc::new(TestApp::new());
    let author = app.member().await;
    let fan = app.member().await;
    let story = app.story(&author, StoryCategory::Adventure).await;

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let app = app.clone();
            let actor = fan.actor();
            tokio::spawn(async move { app.state.likes.toggle(&actor, story.id).await })
        })
        .collect();
    for handle in handles {
        assert_ok!(handle.await.unwrap());
    }

    // an even number of flips lands back where it started
    let status = app.state.likes.status(&fan.actor(), story.id).await.unwrap();
    assert!(!status.liked);
    assert_eq!(status.like_count, 0);
}

#[tokio::test]
async fn optimistic_view_adopts_server_numbers() {
    let app = TestApp::new();
    let author = app.member().await;
    let me = app.member().await;
    let someone_else = app.member().await;
    let story = app.story(&author, StoryCategory::Magical).await;

    let status = app.state.likes.status(&me.actor(), story.id).await.unwrap();
    let view = LikeView::new(status.liked, status.like_count);
    let pending = view.begin_toggle();
    assert_eq!(pending.tentative(), LikeView::new(true, 1));

    // another reader likes it while our request is in flight
    app.state.likes.toggle(&someone_else.actor(), story.id).await.unwrap();
    let response = app.state.likes.toggle(&me.actor(), story.id).await;

    let settled = pending.settle(response);
    assert_eq!(settled, LikeView::new(true, 2));
}

#[tokio::test]
async fn failed_toggle_rolls_back() {
    let app = TestApp::new();
    let me = app.member().await;

    let view = LikeView::new(false, 7);
    let pending = view.begin_toggle();
    let response = app.state.likes.toggle(&me.actor(), Uuid::now_v7()).await;
    assert!(matches!(response, Err(DomainError::NotFound(..))));

    assert_eq!(pending.settle(response), view);
}

#[tokio::test]
async fn anonymous_toggle_is_refused_before_the_store() {
    let app = TestApp::new();
    let author = app.member().await;
    let story = app.story(&author, StoryCategory::Animals).await;

    let result = app.state.likes.toggle(&Actor::Anonymous, story.id).await;
    assert!(matches!(result, Err(DomainError::Unauthorized(_))));
    assert_eq!(
        app.state.stories.get_story(story.id).await.unwrap().like_count,
        0
    );
}

#[tokio::test]
async fn toggle_response_matches_store() {
    let app = TestApp::new();
    let author = app.member().await;
    let story = app.story(&author, StoryCategory::Nature).await;

    let outcome = app.state.likes.toggle(&author.actor(), story.id).await.unwrap();
    assert_eq!(outcome, LikeToggle { liked: true, like_count: 1 });
    assert!(app.store.has_liked(story.id, author.user.id).await.unwrap());
}
