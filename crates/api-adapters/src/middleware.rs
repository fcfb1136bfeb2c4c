//! Cross-cutting layers: CORS and response counting.

use axum::extract::{Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::middleware::Next;
use axum::response::Response;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

use crate::state::AppState;

/// Counts every response by method and status.
pub async fn track_metrics(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let response = next.run(request).await;
    state.metrics.record(method.as_str(), response.status().as_u16());
    response
}

/// Entry in `cors_origins` that mirrors any request origin. Meant for local
/// front-end development only.
pub const ANY_ORIGIN: &str = "*";

/// Credentialed CORS for the listed origins. `None` when the list is empty,
/// so browsers fall back to same-origin.
pub fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    if origins.is_empty() {
        return None;
    }
    let allow_origin = if origins.iter().any(|o| o == ANY_ORIGIN) {
        warn!("CORS mirrors every request origin");
        AllowOrigin::mirror_request()
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "ignoring malformed CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    Some(
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
            .allow_headers([CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(60 * 60)),
    )
}
