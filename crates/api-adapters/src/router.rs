use std::path::PathBuf;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{middleware as axum_middleware, Json, Router};
use serde::Serialize;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::handlers::{auth, general, post as posts};
use crate::middleware::{cors_layer, track_metrics};
use crate::state::AppState;

/// Outer-surface knobs of the router.
#[derive(Debug, Clone)]
pub struct RouterOptions {
    /// Directory `MediaStorage` writes to, served read-only.
    pub upload_dir: PathBuf,
    /// URL prefix of `upload_dir`, e.g. `/upload`.
    pub public_prefix: String,
    /// Origins granted credentialed CORS; empty sends no CORS headers and
    /// `"*"` mirrors any origin.
    pub cors_origins: Vec<String>,
    /// Largest accepted request body in bytes.
    pub body_limit: usize,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("upload"),
            public_prefix: "/upload".into(),
            cors_origins: Vec::new(),
            body_limit: 12 * 1024 * 1024,
        }
    }
}

pub fn build_router(state: AppState, options: RouterOptions) -> Router {
    let api: Router<AppState> = Router::new()
        .route("/init", get(general::init))
        .route("/image", post(general::upload_image))
        .route("/comment", post(general::send_comment))
        .route("/tag", get(general::tags))
        .route("/moderation", post(general::moderate))
        .route("/calendar", get(general::calendar))
        .route("/profile/my", post(general::edit_profile))
        .route("/statistics/my", get(general::my_statistics))
        .route("/statistics/all", get(general::all_statistics))
        .route("/settings", get(general::settings).put(general::update_settings))
        .route("/post", get(posts::list).post(posts::add_post))
        .route("/post/search", get(posts::search))
        .route("/post/byDate", get(posts::by_date))
        .route("/post/byTag", get(posts::by_tag))
        .route("/post/moderation", get(posts::for_moderation))
        .route("/post/my", get(posts::my_posts))
        .route("/post/like", post(posts::like))
        .route("/post/dislike", post(posts::dislike))
        .route("/post/{id}", get(posts::get_post).put(posts::edit_post))
        .route("/auth/login", post(auth::login))
        .route("/auth/check", get(auth::check))
        .route("/auth/logout", get(auth::logout))
        .route("/auth/restore", post(auth::restore))
        .route("/auth/password", post(auth::change_password))
        .route("/auth/register", post(auth::register))
        .route("/auth/captcha", get(auth::captcha));

    let router: Router<AppState> = Router::new()
        .nest("/api", api)
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .nest_service(&mount_point(&options.public_prefix), ServeDir::new(&options.upload_dir))
        .layer(DefaultBodyLimit::max(options.body_limit))
        .layer(axum_middleware::from_fn_with_state(state.clone(), track_metrics));
    let router = match cors_layer(&options.cors_origins) {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// `upload/` and `/upload/` both mount at `/upload`.
fn mount_point(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        "/upload".to_string()
    } else {
        format!("/{trimmed}")
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok", version: env!("CARGO_PKG_VERSION") })
}

async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            [(CONTENT_TYPE, "application/openmetrics-text; version=1.0.0; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "metrics encoding failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mount_point_is_normalized() {
        assert_eq!(mount_point("/upload"), "/upload");
        assert_eq!(mount_point("upload/"), "/upload");
        assert_eq!(mount_point("/media/files/"), "/media/files");
        assert_eq!(mount_point("/"), "/upload");
    }
}
