//! # integration-tests
//!
//! `TestApp` runs the real router over the in-memory store, with a captcha
//! whose code is always [`CAPTCHA_CODE`] and a mailer that keeps what it sends.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use api_adapters::{build_router, AppState, RouterOptions};
use async_trait::async_trait;
use auth_adapters::{Argon2Hasher, MemorySessionStore};
use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, ORIGIN, SET_COOKIE};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use domains::{CaptchaGenerator, CaptchaImage, Mailer, NewUser, PasswordHasher, Result, User, UserRepository};
use http_body_util::BodyExt;
use serde_json::Value;
use services::dto::BlogInfo;
use services::{AuthOptions, AuthService, GeneralService, MediaLimits, PostService, Repositories};
use storage_adapters::{LocalMediaStore, MemoryStore};
use tempfile::TempDir;
use tower::ServiceExt;

pub const CAPTCHA_CODE: &str = "12345";
pub const BASE_URL: &str = "http://devpub.test";

pub struct FixedCaptcha;

impl CaptchaGenerator for FixedCaptcha {
    fn generate(&self) -> Result<CaptchaImage> {
        Ok(CaptchaImage { code: CAPTCHA_CODE.to_string(), png: b"\x89PNG\r\n\x1a\n".to_vec() })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(SentMail { to: to.into(), subject: subject.into(), body: body.into() });
        }
        Ok(())
    }
}

/// A parsed response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    pub text: String,
}

impl TestResponse {
    /// `DEVPUB_SESSION=<id>` from `Set-Cookie`, ready to send back.
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get(SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
    }
}

/// Knobs that differ between test apps.
#[derive(Debug, Clone)]
pub struct TestOptions {
    pub limits: MediaLimits,
    pub cors_origins: Vec<String>,
    pub session_ttl: Duration,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            limits: MediaLimits::default(),
            cors_origins: Vec::new(),
            session_ttl: Duration::from_secs(60 * 60),
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
    pub upload_dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_options(TestOptions::default())
    }

    pub fn with_limits(limits: MediaLimits) -> Self {
        Self::with_options(TestOptions { limits, ..TestOptions::default() })
    }

    pub fn with_options(options: TestOptions) -> Self {
        let store = Arc::new(MemoryStore::new());
        let repos = Repositories::from_store(store.clone());
        let hasher = Arc::new(Argon2Hasher::new());
        let mailer = Arc::new(RecordingMailer::default());
        let upload_dir = tempfile::tempdir().unwrap();

        let media = Arc::new(LocalMediaStore::new(upload_dir.path(), "/upload"));
        let blog = BlogInfo {
            title: "DevPub".into(),
            subtitle: "Stories of developers".into(),
            phone: "+7 000 000-00-00".into(),
            email: "mail@devpub.test".into(),
            copyright: "DevPub".into(),
            copyright_from: "2005".into(),
        };
        let general = GeneralService::new(repos.clone(), media, hasher.clone(), blog, options.limits);
        let auth = AuthService::new(
            repos.clone(),
            Arc::new(MemorySessionStore::new(options.session_ttl)),
            hasher,
            mailer.clone(),
            Arc::new(FixedCaptcha),
            AuthOptions {
                base_url: BASE_URL.into(),
                session_ttl: chrono::Duration::seconds(options.session_ttl.as_secs() as i64),
                ..AuthOptions::default()
            },
        );
        let state = AppState::new(PostService::new(repos), general, auth);

        let router = build_router(
            state,
            RouterOptions {
                upload_dir: upload_dir.path().to_path_buf(),
                public_prefix: "/upload".into(),
                cors_origins: options.cors_origins,
                ..RouterOptions::default()
            },
        );
        Self { router, store, mailer, upload_dir }
    }

    /// Inserts an account directly into the store.
    pub async fn create_user(&self, email: &str, password: &str, moderator: bool) -> User {
        let hash = Argon2Hasher::new().hash(password).unwrap();
        UserRepository::insert(
            &*self.store,
            NewUser {
                name: email.split('@').next().unwrap_or("user").to_string(),
                email: email.to_string(),
                password_hash: hash,
                reg_time: Utc::now(),
                is_moderator: moderator,
            },
        )
        .await
        .unwrap()
    }

    /// Logs in and returns the session cookie.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(serde_json::json!({ "e_mail": email, "password": password })),
            )
            .await;
        assert_eq!(response.body["result"], true, "login of {email} failed: {}", response.text);
        response.session_cookie().unwrap()
    }

    /// Creates a user and logs them in.
    pub async fn signed_in(&self, email: &str, moderator: bool) -> (User, String) {
        let user = self.create_user(email, "secret-pass", moderator).await;
        let cookie = self.login(email, "secret-pass").await;
        (user, cookie)
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.send(Method::GET, uri, cookie, None).await
    }

    pub async fn post_json(&self, uri: &str, cookie: Option<&str>, body: Value) -> TestResponse {
        self.send(Method::POST, uri, cookie, Some(body)).await
    }

    pub async fn put_json(&self, uri: &str, cookie: Option<&str>, body: Value) -> TestResponse {
        self.send(Method::PUT, uri, cookie, Some(body)).await
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.call(request).await
    }

    /// Multipart request with `(field, file name, bytes)` parts; text fields
    /// pass `None` as file name.
    pub async fn post_multipart(
        &self,
        uri: &str,
        cookie: Option<&str>,
        parts: &[(&str, Option<&str>, &[u8])],
    ) -> TestResponse {
        const BOUNDARY: &str = "devpub-test-boundary";
        let mut body = Vec::new();
        for (name, file_name, data) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match file_name {
                Some(file_name) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                ),
            }
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"));
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        self.call(builder.body(Body::from(body)).unwrap()).await
    }

    /// GET carrying an `Origin` header, as a browser sends cross-site.
    pub async fn get_from_origin(&self, uri: &str, origin: &str) -> TestResponse {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(ORIGIN, origin)
            .body(Body::empty())
            .unwrap();
        self.call(request).await
    }

    pub async fn call(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse { status, headers, body, text }
    }

    /// Publishes a post as `cookie`'s user and lets `moderator_cookie` accept
    /// it. Returns the post id.
    pub async fn published_post(&self, cookie: &str, moderator_cookie: &str, title: &str, tags: &[&str]) -> i64 {
        let created = self.post_json("/api/post", Some(cookie), post_body(title, tags)).await;
        assert_eq!(created.body["result"], true, "{}", created.text);

        let queue = self.get("/api/post/moderation?status=new&limit=100", Some(moderator_cookie)).await;
        let id = queue.body["posts"]
            .as_array()
            .and_then(|posts| posts.iter().find(|p| p["title"] == title))
            .and_then(|p| p["id"].as_i64())
            .unwrap();

        let moderated = self
            .post_json(
                "/api/moderation",
                Some(moderator_cookie),
                serde_json::json!({ "post_id": id, "decision": "accept" }),
            )
            .await;
        assert_eq!(moderated.body["result"], true);
        id
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// A valid post body.
pub fn post_body(title: &str, tags: &[&str]) -> Value {
    serde_json::json!({
        "timestamp": 0,
        "active": 1,
        "title": title,
        "tags": tags,
        "text": "A body long enough to pass validation, describing the topic at length.",
    })
}
