//! Session cookie handling and the user extractors built on it.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use domains::{DomainError, User};

use crate::error::ApiError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "DEVPUB_SESSION";

/// The raw session id from the request cookie, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(pub Option<String>);

impl SessionId {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

/// The signed-in user or `None` for anonymous visitors.
pub struct Viewer(pub Option<User>);

/// A signed-in user; rejects with 401 otherwise.
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for SessionId {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(SessionId(session_from_headers(&parts.headers)))
    }
}

impl FromRequestParts<AppState> for Viewer {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = session_from_headers(&parts.headers);
        let user = state.auth.current_user(session.as_deref()).await?;
        Ok(Viewer(user))
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Viewer(user) = Viewer::from_request_parts(parts, state).await?;
        user.map(CurrentUser)
            .ok_or_else(|| ApiError(DomainError::Unauthorized("sign in required".into())))
    }
}

pub fn session_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn session_cookie(session_id: &str, max_age_secs: i64) -> String {
    format!("{SESSION_COOKIE}={session_id}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}")
}

pub fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}
