//! Request and response shapes exchanged with the web client.
//!
//! Field names follow the wire format the blog frontend speaks, which mixes
//! snake_case request fields (`e_mail`, `post_id`) with camelCase counters
//! and SCREAMING_CASE settings keys.

use std::collections::BTreeMap;

use domains::GlobalSettings;
use serde::{Deserialize, Serialize};

// ── Generic results ──────────────────────────────────────────────────────────

/// Per-field validation messages. Only populated fields are serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captcha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        *self == FieldErrors::default()
    }
}

/// `{ "result": bool, "errors": {...}? }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultResponse {
    pub result: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl ResultResponse {
    pub fn ok() -> Self {
        Self { result: true, errors: None }
    }

    pub fn fail() -> Self {
        Self { result: false, errors: None }
    }

    /// `ok()` when `errors` is empty, otherwise a failure carrying them.
    pub fn from_errors(errors: FieldErrors) -> Self {
        if errors.is_empty() {
            Self::ok()
        } else {
            Self { result: false, errors: Some(errors) }
        }
    }
}

/// Either a payload or a field-level rejection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outcome<T> {
    Done(T),
    Rejected(ResultResponse),
}

// ── Posts ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserWithPhoto {
    pub id: i64,
    pub name: String,
    pub photo: Option<String>,
}

/// Feed card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPreview {
    pub id: i64,
    /// Unix seconds
    pub timestamp: i64,
    pub user: UserRef,
    pub title: String,
    pub announce: String,
    pub like_count: i64,
    pub dislike_count: i64,
    pub comment_count: i64,
    pub view_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostListResponse {
    pub count: i64,
    pub posts: Vec<PostPreview>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: i64,
    pub timestamp: i64,
    pub text: String,
    pub user: UserWithPhoto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
}

/// Full post page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    pub id: i64,
    pub timestamp: i64,
    pub active: bool,
    pub user: UserRef,
    pub title: String,
    pub text: String,
    pub like_count: i64,
    pub dislike_count: i64,
    pub view_count: i64,
    pub comments: Vec<CommentView>,
    pub tags: Vec<String>,
}

/// Body of `POST /api/post` and `PUT /api/post/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostRequest {
    /// Unix seconds; past values are moved to "now".
    pub timestamp: i64,
    /// 1 publishes, 0 keeps the post hidden
    pub active: i32,
    pub title: String,
    pub tags: Vec<String>,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VoteRequest {
    pub post_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentRequest {
    #[serde(default, deserialize_with = "lenient_id")]
    pub parent_id: Option<i64>,
    pub post_id: i64,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentCreated {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModerationRequest {
    pub post_id: i64,
    pub decision: String,
}

// ── Tags, calendar, statistics ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagWeight {
    pub name: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagsResponse {
    pub tags: Vec<TagWeight>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarResponse {
    pub years: Vec<i32>,
    /// `YYYY-MM-DD` → number of posts
    pub posts: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsResponse {
    pub posts_count: i64,
    pub likes_count: i64,
    pub dislikes_count: i64,
    pub views_count: i64,
    /// Unix seconds of the first publication, 0 when there is none
    pub first_publication: i64,
}

// ── Settings and blog info ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsDto {
    #[serde(rename = "MULTIUSER_MODE", default)]
    pub multiuser_mode: bool,
    #[serde(rename = "POST_PREMODERATION", default)]
    pub post_premoderation: bool,
    #[serde(rename = "STATISTICS_IS_PUBLIC", default)]
    pub statistics_is_public: bool,
}

impl From<GlobalSettings> for SettingsDto {
    fn from(s: GlobalSettings) -> Self {
        Self {
            multiuser_mode: s.multiuser_mode,
            post_premoderation: s.post_premoderation,
            statistics_is_public: s.statistics_is_public,
        }
    }
}

impl From<SettingsDto> for GlobalSettings {
    fn from(s: SettingsDto) -> Self {
        Self {
            multiuser_mode: s.multiuser_mode,
            post_premoderation: s.post_premoderation,
            statistics_is_public: s.statistics_is_public,
        }
    }
}

/// Static blog metadata served by `/api/init`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogInfo {
    pub title: String,
    pub subtitle: String,
    pub phone: String,
    pub email: String,
    pub copyright: String,
    pub copyright_from: String,
}

// ── Profile ──────────────────────────────────────────────────────────────────

/// JSON body of `POST /api/profile/my`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub remove_photo: i32,
}

/// Profile edit, whichever encoding it arrived in.
#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub remove_photo: bool,
    pub photo: Option<Vec<u8>>,
}

impl From<ProfileRequest> for ProfileForm {
    fn from(r: ProfileRequest) -> Self {
        Self {
            name: r.name,
            email: r.email,
            password: r.password,
            remove_photo: r.remove_photo == 1,
            photo: None,
        }
    }
}

// ── Auth ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub e_mail: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub e_mail: String,
    pub password: String,
    pub name: String,
    pub captcha: String,
    pub captcha_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestoreRequest {
    pub email: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChangePasswordRequest {
    pub code: String,
    pub password: String,
    pub captcha: String,
    pub captcha_secret: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: i64,
    pub name: String,
    pub photo: Option<String>,
    pub email: String,
    pub moderation: bool,
    pub moderation_count: i64,
    pub settings: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthResponse {
    pub result: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<AuthUser>,
}

impl AuthResponse {
    pub fn anonymous() -> Self {
        Self { result: false, user: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptchaResponse {
    pub secret: String,
    /// `data:image/png;base64, ...`
    pub image: String,
}

/// Accepts `null`, `""`, a number or a numeric string for optional ids; the
/// frontend sends all of them for "no parent".
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(n)) if n > 0 => Some(n),
        Some(Raw::Text(s)) => s.trim().parse::<i64>().ok().filter(|n| *n > 0),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_response_hides_empty_errors() {
        let json = serde_json::to_value(ResultResponse::ok()).unwrap();
        assert_eq!(json, serde_json::json!({ "result": true }));

        let errors = FieldErrors { title: Some("Title is too short".into()), ..Default::default() };
        let json = serde_json::to_value(ResultResponse::from_errors(errors)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "result": false, "errors": { "title": "Title is too short" } })
        );
    }

    #[test]
    fn comment_request_accepts_loose_parent_ids() {
        let r: CommentRequest =
            serde_json::from_str(r#"{"parent_id": "", "post_id": 3, "text": "hi"}"#).unwrap();
        assert_eq!(r.parent_id, None);
        let r: CommentRequest =
            serde_json::from_str(r#"{"parent_id": "12", "post_id": 3, "text": "hi"}"#).unwrap();
        assert_eq!(r.parent_id, Some(12));
        let r: CommentRequest =
            serde_json::from_str(r#"{"parent_id": null, "post_id": 3}"#).unwrap();
        assert_eq!(r.parent_id, None);
        let r: CommentRequest = serde_json::from_str(r#"{"post_id": 3}"#).unwrap();
        assert_eq!(r.parent_id, None);
    }

    #[test]
    fn settings_use_screaming_keys() {
        let dto: SettingsDto = serde_json::from_str(
            r#"{"MULTIUSER_MODE": true, "POST_PREMODERATION": false, "STATISTICS_IS_PUBLIC": true}"#,
        )
        .unwrap();
        assert!(dto.multiuser_mode && !dto.post_premoderation && dto.statistics_is_public);
        let json = serde_json::to_value(dto).unwrap();
        assert_eq!(json["POST_PREMODERATION"], serde_json::json!(false));
    }
}
