use axum::http::{Method, StatusCode};
use domains::StoryCategory;
use integration_tests::{request, TestApp};
use serde_json::json;

#[tokio::test]
async fn only_admins_see_user_management() {
    let app = TestApp::new();
    let admin = app.admin().await;
    let member = app.member().await;

    let (status, _) = app.send(request(Method::GET, "/admin/users", Some(&member.token), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.send(request(Method::GET, "/admin/likes", Some(&member.token), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.send(request(Method::GET, "/admin/users", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, users) = app.send(request(Method::GET, "/admin/users", Some(&admin.token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 2);

    let (_, dashboard) = app.send(request(Method::GET, "/dashboard", Some(&admin.token), None)).await;
    assert_eq!(dashboard["isAdmin"], true);
    assert_eq!(dashboard["users"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn promotion_applies_on_the_next_request() {
    let app = TestApp::new();
    let admin = app.admin().await;
    let member = app.member().await;

    let (status, user) = app
        .send(request(
            Method::PUT,
            &format!("/admin/users/{}/admin", member.user.id),
            Some(&admin.token),
            Some(json!({ "isAdmin": true })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["isAdmin"], true);

    // same token, reloaded user
    let (status, _) = app.send(request(Method::GET, "/admin/users", Some(&member.token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.state.users.is_admin(member.user.id).await);
}

#[tokio::test]
async fn admin_cannot_demote_themselves() {
    let app = TestApp::new();
    let admin = app.admin().await;

    let (status, body) = app
        .send(request(
            Method::PUT,
            &format!("/admin/users/{}/admin", admin.user.id),
            Some(&admin.token),
            Some(json!({ "isAdmin": false })),
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "conflict");
    assert!(app.state.users.is_admin(admin.user.id).await);
}

#[tokio::test]
async fn admin_edits_and_deletes_any_story() {
    let app = TestApp::new();
    let admin = app.admin().await;
    let author = app.member().await;
    let fan = app.member().await;
    let story = app.story(&author, StoryCategory::Mystery).await;
    app.state.likes.toggle(&fan.actor(), story.id).await.unwrap();

    let (status, edited) = app
        .send(request(
            Method::PATCH,
            &format!("/stories/{}", story.id),
            Some(&admin.token),
            Some(json!({ "title": "The Case of the Missing Pillow", "category": "funny" })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["category"], "funny");
    assert_eq!(edited["likeCount"], 1);
    assert_eq!(edited["authorId"], author.user.id.to_string().as_str());

    let (_, all_likes) = app.send(request(Method::GET, "/admin/likes", Some(&admin.token), None)).await;
    assert_eq!(all_likes.as_array().unwrap().len(), 1);

    let (status, _) = app
        .send(request(Method::DELETE, &format!("/stories/{}", story.id), Some(&admin.token), None))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.send(request(Method::GET, &format!("/stories/{}", story.id), None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, all_likes) = app.send(request(Method::GET, "/admin/likes", Some(&admin.token), None)).await;
    assert!(all_likes.as_array().unwrap().is_empty());
    assert_eq!(app.state.likes.like_count_by_user(fan.user.id).await, 0);
}
