//! `/api/auth/*`

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Response};
use axum::Json;
use services::dto::{
    AuthResponse, CaptchaResponse, ChangePasswordRequest, LoginRequest, RegisterRequest,
    RestoreRequest, ResultResponse,
};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::{expired_session_cookie, session_cookie, SessionId};
use crate::state::AppState;

/// Signs in under a fresh session id, so a pre-login id is never reused.
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = body?;
    let session_id = Uuid::new_v4().simple().to_string();
    let response = state.auth.login(&session_id, request).await?;
    if response.result {
        let cookie = session_cookie(&session_id, state.auth.session_ttl().num_seconds());
        Ok(([(SET_COOKIE, cookie)], Json(response)).into_response())
    } else {
        Ok(Json(response).into_response())
    }
}

pub async fn check(State(state): State<AppState>, session: SessionId) -> ApiResult<Json<AuthResponse>> {
    Ok(Json(state.auth.check(session.as_deref()).await?))
}

pub async fn logout(State(state): State<AppState>, session: SessionId) -> Response {
    let response = state.auth.logout(session.as_deref());
    ([(SET_COOKIE, expired_session_cookie())], Json(response)).into_response()
}

pub async fn restore(
    State(state): State<AppState>,
    body: Result<Json<RestoreRequest>, JsonRejection>,
) -> ApiResult<Json<ResultResponse>> {
    let Json(request) = body?;
    Ok(Json(state.auth.restore(request).await?))
}

pub async fn change_password(
    State(state): State<AppState>,
    body: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> ApiResult<Json<ResultResponse>> {
    let Json(request) = body?;
    Ok(Json(state.auth.change_password(request).await?))
}

pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<Json<ResultResponse>> {
    let Json(request) = body?;
    Ok(Json(state.auth.register(request).await?))
}

pub async fn captcha(State(state): State<AppState>) -> ApiResult<Json<CaptchaResponse>> {
    Ok(Json(state.auth.captcha().await?))
}
