use axum::http::StatusCode;
use integration_tests::{post_body, TestApp};
use serde_json::json;

#[tokio::test]
async fn writing_requires_a_session() {
    let app = TestApp::new();
    let response = app.post_json("/api/post", None, post_body("Hello", &[])).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app.post_json("/api/post/like", None, json!({ "post_id": 1 })).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_post_reports_field_errors() {
    let app = TestApp::new();
    let (_, cookie) = app.signed_in("ann@devpub.test", false).await;

    let response = app
        .post_json("/api/post", Some(&cookie), json!({ "title": "Hi", "text": "short", "active": 1 }))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["result"], false);
    assert_eq!(response.body["errors"]["title"], "Title is too short");
    assert_eq!(response.body["errors"]["text"], "Text is too short");
}

#[tokio::test]
async fn premoderated_post_reaches_the_feed_once_accepted() {
    let app = TestApp::new();
    let (author, cookie) = app.signed_in("ann@devpub.test", false).await;
    let (_, moderator) = app.signed_in("mod@devpub.test", true).await;

    let created = app.post_json("/api/post", Some(&cookie), post_body("Borrowing", &["Rust"])).await;
    assert_eq!(created.body, json!({ "result": true }));

    let feed = app.get("/api/post", None).await;
    assert_eq!(feed.body, json!({ "count": 0, "posts": [] }));

    let pending = app.get("/api/post/my?status=pending", Some(&cookie)).await;
    assert_eq!(pending.body["count"], 1);
    let id = pending.body["posts"][0]["id"].as_i64().unwrap();

    let hidden = app.get(&format!("/api/post/{id}"), None).await;
    assert_eq!(hidden.status, StatusCode::NOT_FOUND);

    let accepted = app
        .post_json("/api/moderation", Some(&moderator), json!({ "post_id": id, "decision": "accept" }))
        .await;
    assert_eq!(accepted.body["result"], true);

    let feed = app.get("/api/post?mode=recent", None).await;
    assert_eq!(feed.body["count"], 1);
    let preview = &feed.body["posts"][0];
    assert_eq!(preview["id"], id);
    assert_eq!(preview["user"]["id"], author.id);
    assert_eq!(preview["title"], "Borrowing");
    assert!(preview["announce"].as_str().unwrap().starts_with("A body long enough"));

    let page = app.get(&format!("/api/post/{id}"), None).await;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.body["viewCount"], 1);
    assert_eq!(page.body["tags"], json!(["rust"]));
    assert_eq!(page.body["active"], true);

    // the author's own visits are not counted
    let own = app.get(&format!("/api/post/{id}"), Some(&cookie)).await;
    assert_eq!(own.body["viewCount"], 1);
}

#[tokio::test]
async fn search_tag_and_date_listings() {
    let app = TestApp::new();
    let (_, cookie) = app.signed_in("ann@devpub.test", false).await;
    let (_, moderator) = app.signed_in("mod@devpub.test", true).await;
    app.published_post(&cookie, &moderator, "Async traits", &["rust", "async"]).await;
    app.published_post(&cookie, &moderator, "Borrow checker", &["rust"]).await;

    let by_tag = app.get("/api/post/byTag?tag=ASYNC", None).await;
    assert_eq!(by_tag.body["count"], 1);
    assert_eq!(by_tag.body["posts"][0]["title"], "Async traits");

    let found = app.get("/api/post/search?query=checker", None).await;
    assert_eq!(found.body["count"], 1);

    let blank = app.get("/api/post/search?query=", None).await;
    assert_eq!(blank.body["count"], 2);

    let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
    let by_date = app.get(&format!("/api/post/byDate?date={today}"), None).await;
    assert_eq!(by_date.body["count"], 2);

    let bad_date = app.get("/api/post/byDate?date=yesterday", None).await;
    assert_eq!(bad_date.status, StatusCode::BAD_REQUEST);

    let paged = app.get("/api/post?offset=1&limit=1", None).await;
    assert_eq!(paged.body["count"], 2);
    assert_eq!(paged.body["posts"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn votes_toggle_and_flip() {
    let app = TestApp::new();
    let (_, author) = app.signed_in("ann@devpub.test", false).await;
    let (_, moderator) = app.signed_in("mod@devpub.test", true).await;
    let (_, reader) = app.signed_in("bob@devpub.test", false).await;
    let id = app.published_post(&author, &moderator, "Lifetimes", &[]).await;
    let vote = json!({ "post_id": id });

    let like = app.post_json("/api/post/like", Some(&reader), vote.clone()).await;
    assert_eq!(like.body, json!({ "result": true }));
    let page = app.get(&format!("/api/post/{id}"), Some(&moderator)).await;
    assert_eq!((page.body["likeCount"].clone(), page.body["dislikeCount"].clone()), (json!(1), json!(0)));

    let flip = app.post_json("/api/post/dislike", Some(&reader), vote.clone()).await;
    assert_eq!(flip.body, json!({ "result": true }));
    let page = app.get(&format!("/api/post/{id}"), Some(&moderator)).await;
    assert_eq!((page.body["likeCount"].clone(), page.body["dislikeCount"].clone()), (json!(0), json!(1)));

    let withdraw = app.post_json("/api/post/dislike", Some(&reader), vote).await;
    assert_eq!(withdraw.body, json!({ "result": false }));
    let page = app.get(&format!("/api/post/{id}"), Some(&moderator)).await;
    assert_eq!(page.body["dislikeCount"], 0);

    let missing = app.post_json("/api/post/like", Some(&reader), json!({ "post_id": 9999 })).await;
    assert_eq!(missing.body, json!({ "result": false }));
}

#[tokio::test]
async fn only_author_or_moderator_may_edit() {
    let app = TestApp::new();
    let (_, author) = app.signed_in("ann@devpub.test", false).await;
    let (_, moderator) = app.signed_in("mod@devpub.test", true).await;
    let (_, stranger) = app.signed_in("bob@devpub.test", false).await;
    let id = app.published_post(&author, &moderator, "Traits", &[]).await;

    let denied = app.put_json(&format!("/api/post/{id}"), Some(&stranger), post_body("Hijacked", &[])).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    // a moderator's edit keeps the post accepted
    let edited = app.put_json(&format!("/api/post/{id}"), Some(&moderator), post_body("Traits, fixed", &[])).await;
    assert_eq!(edited.body, json!({ "result": true }));
    let feed = app.get("/api/post", None).await;
    assert_eq!(feed.body["posts"][0]["title"], "Traits, fixed");

    // the author's edit goes back to premoderation
    let edited = app.put_json(&format!("/api/post/{id}"), Some(&author), post_body("Traits v2", &[])).await;
    assert_eq!(edited.body, json!({ "result": true }));
    let feed = app.get("/api/post", None).await;
    assert_eq!(feed.body["count"], 0);

    let missing = app.put_json("/api/post/9999", Some(&author), post_body("Nope", &[])).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}
