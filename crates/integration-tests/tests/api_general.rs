use std::io::Cursor;

use axum::http::StatusCode;
use image::{ImageFormat, Rgb, RgbImage};
use integration_tests::TestApp;
use serde_json::json;
use services::MediaLimits;

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([200, 40, 40]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

#[tokio::test]
async fn init_health_and_metrics() {
    let app = TestApp::new();

    let init = app.get("/api/init", None).await;
    assert_eq!(init.body["title"], "DevPub");
    assert_eq!(init.body["copyrightFrom"], "2005");

    let health = app.get("/health", None).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body["status"], "ok");

    let metrics = app.get("/metrics", None).await;
    assert_eq!(metrics.status, StatusCode::OK);
    assert!(metrics.text.contains(r#"devpub_http_responses_total{method="GET",status="200"}"#));
}

#[tokio::test]
async fn comments_and_replies() {
    let app = TestApp::new();
    let (_, author) = app.signed_in("ann@devpub.test", false).await;
    let (_, moderator) = app.signed_in("mod@devpub.test", true).await;
    let first = app.published_post(&author, &moderator, "Commented", &[]).await;
    let second = app.published_post(&author, &moderator, "Other", &[]).await;

    let anonymous = app.post_json("/api/comment", None, json!({ "post_id": first, "text": "hello" })).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let short = app
        .post_json("/api/comment", Some(&moderator), json!({ "post_id": first, "parent_id": "", "text": "hi" }))
        .await;
    assert_eq!(short.status, StatusCode::BAD_REQUEST);
    assert_eq!(short.body["result"], false);
    assert!(short.body["errors"]["text"].is_string());

    let created = app
        .post_json("/api/comment", Some(&moderator), json!({ "post_id": first, "parent_id": null, "text": "Nice post" }))
        .await;
    assert_eq!(created.status, StatusCode::OK);
    let comment_id = created.body["id"].as_i64().unwrap();

    let reply = app
        .post_json("/api/comment", Some(&author), json!({ "post_id": first, "parent_id": comment_id, "text": "Thanks!" }))
        .await;
    assert_eq!(reply.status, StatusCode::OK);

    let foreign_parent = app
        .post_json("/api/comment", Some(&author), json!({ "post_id": second, "parent_id": comment_id, "text": "Lost" }))
        .await;
    assert_eq!(foreign_parent.status, StatusCode::BAD_REQUEST);

    let missing_post = app
        .post_json("/api/comment", Some(&author), json!({ "post_id": 9999, "text": "Into the void" }))
        .await;
    assert_eq!(missing_post.status, StatusCode::NOT_FOUND);

    let page = app.get(&format!("/api/post/{first}"), None).await;
    let comments = page.body["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 2);
    assert!(comments.iter().any(|c| c["parentId"] == comment_id));

    let feed = app.get("/api/post?mode=popular", None).await;
    assert_eq!(feed.body["posts"][0]["id"], first);
    assert_eq!(feed.body["posts"][0]["commentCount"], 2);
}

#[tokio::test]
async fn tag_cloud_and_calendar() {
    let app = TestApp::new();
    let (_, author) = app.signed_in("ann@devpub.test", false).await;
    let (_, moderator) = app.signed_in("mod@devpub.test", true).await;
    app.published_post(&author, &moderator, "One", &["rust", "web"]).await;
    app.published_post(&author, &moderator, "Two", &["rust"]).await;

    let tags = app.get("/api/tag", None).await;
    let tags = tags.body["tags"].as_array().unwrap().clone();
    let rust = tags.iter().find(|t| t["name"] == "rust").unwrap();
    let web = tags.iter().find(|t| t["name"] == "web").unwrap();
    assert_eq!(rust["weight"], 1.0);
    assert!(web["weight"].as_f64().unwrap() < 1.0);

    let filtered = app.get("/api/tag?query=we", None).await;
    assert_eq!(filtered.body["tags"].as_array().unwrap().len(), 1);

    let now = chrono::Utc::now();
    let calendar = app.get("/api/calendar", None).await;
    assert_eq!(calendar.body["years"], json!([chrono::Datelike::year(&now)]));
    assert_eq!(calendar.body["posts"][now.format("%Y-%m-%d").to_string()], 2);

    let other_year = app.get("/api/calendar?year=1999", None).await;
    assert_eq!(other_year.body["posts"], json!({}));
}

#[tokio::test]
async fn statistics_follow_the_public_flag() {
    let app = TestApp::new();
    let (_, author) = app.signed_in("ann@devpub.test", false).await;
    let (_, moderator) = app.signed_in("mod@devpub.test", true).await;
    let id = app.published_post(&author, &moderator, "Counted", &[]).await;
    app.post_json("/api/post/like", Some(&moderator), json!({ "post_id": id })).await;

    let mine = app.get("/api/statistics/my", Some(&author)).await;
    assert_eq!(mine.body["postsCount"], 1);
    assert_eq!(mine.body["likesCount"], 1);
    assert!(mine.body["firstPublication"].as_i64().unwrap() > 0);

    let all = app.get("/api/statistics/all", None).await;
    assert_eq!(all.status, StatusCode::OK);
    assert_eq!(all.body["postsCount"], 1);

    let denied = app
        .put_json(
            "/api/settings",
            Some(&author),
            json!({ "MULTIUSER_MODE": true, "POST_PREMODERATION": true, "STATISTICS_IS_PUBLIC": false }),
        )
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    app.put_json(
        "/api/settings",
        Some(&moderator),
        json!({ "MULTIUSER_MODE": true, "POST_PREMODERATION": true, "STATISTICS_IS_PUBLIC": false }),
    )
    .await;
    let settings = app.get("/api/settings", None).await;
    assert_eq!(settings.body["STATISTICS_IS_PUBLIC"], false);

    assert_eq!(app.get("/api/statistics/all", None).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.get("/api/statistics/all", Some(&author)).await.status, StatusCode::FORBIDDEN);
    assert_eq!(app.get("/api/statistics/all", Some(&moderator)).await.status, StatusCode::OK);
}

#[tokio::test]
async fn image_upload_is_served_back() {
    let app = TestApp::new();
    let (_, cookie) = app.signed_in("ann@devpub.test", false).await;
    let data = png(8, 8);

    let uploaded = app
        .post_multipart("/api/image", Some(&cookie), &[("image", Some("pic.PNG"), data.as_slice())])
        .await;
    assert_eq!(uploaded.status, StatusCode::OK);
    let path = uploaded.text.clone();
    assert!(path.starts_with("/upload/") && path.ends_with(".png"), "{path}");

    let served = app.get(&path, None).await;
    assert_eq!(served.status, StatusCode::OK);

    let wrong_type = app
        .post_multipart("/api/image", Some(&cookie), &[("image", Some("notes.txt"), &b"plain text"[..])])
        .await;
    assert_eq!(wrong_type.status, StatusCode::BAD_REQUEST);
    assert!(wrong_type.body["errors"]["image"].is_string());

    let disguised = app
        .post_multipart("/api/image", Some(&cookie), &[("image", Some("pic.png"), &b"plain text"[..])])
        .await;
    assert_eq!(disguised.status, StatusCode::BAD_REQUEST);
    assert_eq!(disguised.body["result"], false);

    let no_field = app
        .post_multipart("/api/image", Some(&cookie), &[("file", Some("pic.png"), data.as_slice())])
        .await;
    assert_eq!(no_field.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_image_is_rejected() {
    let app = TestApp::with_limits(MediaLimits { max_image_bytes: 16, max_photo_bytes: 1024 * 1024 });
    let (_, cookie) = app.signed_in("ann@devpub.test", false).await;

    let response = app
        .post_multipart("/api/image", Some(&cookie), &[("image", Some("big.png"), png(64, 64).as_slice())])
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["errors"]["image"].is_string());
}

#[tokio::test]
async fn profile_edit_with_json() {
    let app = TestApp::new();
    let (_, cookie) = app.signed_in("ann@devpub.test", false).await;
    app.create_user("bob@devpub.test", "secret-pass", false).await;

    let taken = app
        .post_json("/api/profile/my", Some(&cookie), json!({ "name": "Ann", "email": "bob@devpub.test" }))
        .await;
    assert_eq!(taken.body["result"], false);
    assert!(taken.body["errors"]["email"].is_string());

    let updated = app
        .post_json(
            "/api/profile/my",
            Some(&cookie),
            json!({ "name": "Ann Lee", "email": "ann@devpub.test", "password": "another-pass" }),
        )
        .await;
    assert_eq!(updated.body, json!({ "result": true }));

    let check = app.get("/api/auth/check", Some(&cookie)).await;
    assert_eq!(check.body["user"]["name"], "Ann Lee");
    app.login("ann@devpub.test", "another-pass").await;
}

#[tokio::test]
async fn profile_photo_via_multipart() {
    let app = TestApp::new();
    let (_, cookie) = app.signed_in("ann@devpub.test", false).await;
    let photo = png(120, 80);

    let updated = app
        .post_multipart(
            "/api/profile/my",
            Some(&cookie),
            &[
                ("name", None, &b"Ann"[..]),
                ("email", None, &b"ann@devpub.test"[..]),
                ("removePhoto", None, &b"0"[..]),
                ("photo", Some("me.png"), photo.as_slice()),
            ],
        )
        .await;
    assert_eq!(updated.body, json!({ "result": true }), "{}", updated.text);

    let check = app.get("/api/auth/check", Some(&cookie)).await;
    let avatar = check.body["user"]["photo"].as_str().unwrap().to_string();
    assert!(avatar.starts_with("/upload/avatars/"));
    let served = app.get(&avatar, None).await;
    assert_eq!(served.status, StatusCode::OK);

    let removed = app
        .post_json("/api/profile/my", Some(&cookie), json!({ "name": "Ann", "removePhoto": 1 }))
        .await;
    assert_eq!(removed.body, json!({ "result": true }));
    let check = app.get("/api/auth/check", Some(&cookie)).await;
    assert!(check.body["user"]["photo"].is_null());
}
