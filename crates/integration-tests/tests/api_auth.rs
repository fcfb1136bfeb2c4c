use std::time::Duration;

use axum::http::header::{ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_ORIGIN, SET_COOKIE};
use axum::http::StatusCode;
use integration_tests::{TestApp, TestOptions, BASE_URL, CAPTCHA_CODE};
use serde_json::json;

async fn captcha_secret(app: &TestApp) -> String {
    let response = app.get("/api/auth/captcha", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["image"].as_str().unwrap().starts_with("data:image/png;base64, "));
    response.body["secret"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn wrong_password_does_not_sign_in() {
    let app = TestApp::new();
    app.create_user("ann@devpub.test", "secret-pass", false).await;

    let response = app
        .post_json("/api/auth/login", None, json!({ "e_mail": "ann@devpub.test", "password": "nope-nope" }))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({ "result": false }));
    assert!(response.session_cookie().is_none());
}

#[tokio::test]
async fn login_check_logout_cycle() {
    let app = TestApp::new();
    let user = app.create_user("ann@devpub.test", "secret-pass", true).await;

    let cookie = app.login("ANN@devpub.test", "secret-pass").await;
    let check = app.get("/api/auth/check", Some(&cookie)).await;
    assert_eq!(check.body["result"], true);
    assert_eq!(check.body["user"]["id"], user.id);
    assert_eq!(check.body["user"]["moderation"], true);
    assert_eq!(check.body["user"]["settings"], true);
    assert_eq!(check.body["user"]["moderationCount"], 0);

    let logout = app.get("/api/auth/logout", Some(&cookie)).await;
    assert_eq!(logout.body["result"], true);
    let cleared = logout.headers.get("set-cookie").unwrap().to_str().unwrap();
    assert!(cleared.contains("Max-Age=0"));

    let check = app.get("/api/auth/check", Some(&cookie)).await;
    assert_eq!(check.body, json!({ "result": false }));
}

#[tokio::test]
async fn login_cookie_carries_session_lifetime() {
    let app = TestApp::new();
    app.create_user("ann@devpub.test", "secret-pass", false).await;
    let response = app
        .post_json("/api/auth/login", None, json!({ "e_mail": "ann@devpub.test", "password": "secret-pass" }))
        .await;
    let cookie = response.headers.get(SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.ends_with("Max-Age=3600"));
}

#[tokio::test]
async fn expired_session_is_anonymous() {
    let app = TestApp::with_options(TestOptions { session_ttl: Duration::ZERO, ..TestOptions::default() });
    app.create_user("ann@devpub.test", "secret-pass", false).await;
    let cookie = app.login("ann@devpub.test", "secret-pass").await;

    let check = app.get("/api/auth/check", Some(&cookie)).await;
    assert_eq!(check.body, json!({ "result": false }));
    let posts = app.get("/api/post/my", Some(&cookie)).await;
    assert_eq!(posts.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn cors_is_off_without_configured_origins() {
    let app = TestApp::new();
    let response = app.get_from_origin("/api/auth/check", "https://evil.example").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    assert!(response.headers.get(ACCESS_CONTROL_ALLOW_CREDENTIALS).is_none());
}

#[tokio::test]
async fn cors_admits_only_listed_origins() {
    let app = TestApp::with_options(TestOptions {
        cors_origins: vec!["https://front.devpub.test".into()],
        ..TestOptions::default()
    });

    let allowed = app.get_from_origin("/api/auth/check", "https://front.devpub.test").await;
    assert_eq!(allowed.headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "https://front.devpub.test");
    assert_eq!(allowed.headers.get(ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(), "true");

    let foreign = app.get_from_origin("/api/auth/check", "https://evil.example").await;
    assert!(foreign.headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn anonymous_check_is_negative() {
    let app = TestApp::new();
    let check = app.get("/api/auth/check", None).await;
    assert_eq!(check.status, StatusCode::OK);
    assert_eq!(check.body, json!({ "result": false }));
}

#[tokio::test]
async fn register_requires_the_captcha_code() {
    let app = TestApp::new();
    let secret = captcha_secret(&app).await;

    let body = |captcha: &str| {
        json!({
            "e_mail": "bob@devpub.test",
            "password": "bob-password",
            "name": "Bob",
            "captcha": captcha,
            "captcha_secret": secret,
        })
    };

    let rejected = app.post_json("/api/auth/register", None, body("00000")).await;
    assert_eq!(rejected.status, StatusCode::OK);
    assert_eq!(rejected.body["result"], false);
    assert!(rejected.body["errors"]["captcha"].is_string());

    let accepted = app.post_json("/api/auth/register", None, body(CAPTCHA_CODE)).await;
    assert_eq!(accepted.body, json!({ "result": true }));

    app.login("bob@devpub.test", "bob-password").await;

    let secret = captcha_secret(&app).await;
    let duplicate = app
        .post_json(
            "/api/auth/register",
            None,
            json!({
                "e_mail": "BOB@devpub.test",
                "password": "x",
                "name": "",
                "captcha": CAPTCHA_CODE,
                "captcha_secret": secret,
            }),
        )
        .await;
    let errors = &duplicate.body["errors"];
    assert!(errors["email"].is_string());
    assert!(errors["name"].is_string());
    assert!(errors["password"].is_string());
    assert!(errors.get("captcha").is_none());
}

#[tokio::test]
async fn captcha_code_is_spent_by_a_registration() {
    let app = TestApp::new();
    let secret = captcha_secret(&app).await;
    let body = |email: &str| {
        json!({
            "e_mail": email,
            "password": "some-password",
            "name": "Sam",
            "captcha": CAPTCHA_CODE,
            "captcha_secret": secret,
        })
    };

    let first = app.post_json("/api/auth/register", None, body("sam1@devpub.test")).await;
    assert_eq!(first.body, json!({ "result": true }));

    let second = app.post_json("/api/auth/register", None, body("sam2@devpub.test")).await;
    assert_eq!(second.body["result"], false);
    assert!(second.body["errors"]["captcha"].is_string());
    assert!(second.body["errors"].get("email").is_none());
}

#[tokio::test]
async fn registration_is_closed_in_single_user_mode() {
    let app = TestApp::new();
    let (_, moderator) = app.signed_in("mod@devpub.test", true).await;
    let update = app
        .put_json(
            "/api/settings",
            Some(&moderator),
            json!({ "MULTIUSER_MODE": false, "POST_PREMODERATION": true, "STATISTICS_IS_PUBLIC": true }),
        )
        .await;
    assert_eq!(update.status, StatusCode::OK);

    let secret = captcha_secret(&app).await;
    let response = app
        .post_json(
            "/api/auth/register",
            None,
            json!({
                "e_mail": "eve@devpub.test",
                "password": "eve-password",
                "name": "Eve",
                "captcha": CAPTCHA_CODE,
                "captcha_secret": secret,
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn password_recovery_by_mailed_link() {
    let app = TestApp::new();
    app.create_user("kim@devpub.test", "old-password", false).await;

    let unknown = app.post_json("/api/auth/restore", None, json!({ "email": "nobody@devpub.test" })).await;
    assert_eq!(unknown.body, json!({ "result": false }));

    let restore = app.post_json("/api/auth/restore", None, json!({ "email": "kim@devpub.test" })).await;
    assert_eq!(restore.body, json!({ "result": true }));

    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "kim@devpub.test");
    let link = sent[0]
        .body
        .lines()
        .find(|line| line.starts_with(BASE_URL))
        .unwrap();
    assert!(link.starts_with(&format!("{BASE_URL}/login/change-password/")));
    let code = link.rsplit('/').next().unwrap().to_string();

    let secret = captcha_secret(&app).await;
    let changed = app
        .post_json(
            "/api/auth/password",
            None,
            json!({ "code": code, "password": "new-password", "captcha": CAPTCHA_CODE, "captcha_secret": secret }),
        )
        .await;
    assert_eq!(changed.body, json!({ "result": true }));
    app.login("kim@devpub.test", "new-password").await;

    let secret = captcha_secret(&app).await;
    let reused = app
        .post_json(
            "/api/auth/password",
            None,
            json!({ "code": code, "password": "other-password", "captcha": CAPTCHA_CODE, "captcha_secret": secret }),
        )
        .await;
    assert_eq!(reused.body["result"], false);
    assert!(reused.body["errors"]["code"].is_string());
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = TestApp::new();
    let response = app.post_json("/api/auth/login", None, json!({ "password": "x" })).await;
    assert!(response.status.is_client_error());
    assert_eq!(response.body["result"], false);
}
