//! Everything under `/api` that is neither a post nor auth.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, Multipart, Query, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use domains::DomainError;
use serde::{Deserialize, Serialize};
use services::dto::{
    BlogInfo, CalendarResponse, CommentRequest, ModerationRequest, Outcome, ProfileForm,
    ProfileRequest, ResultResponse, SettingsDto, StatisticsResponse, TagsResponse,
};
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::extract::{CurrentUser, Viewer};
use crate::state::AppState;

pub async fn init(State(state): State<AppState>) -> Json<BlogInfo> {
    Json(state.general.blog_info())
}

/// Multipart upload of one post image in the `image` field; replies with
/// the public path as plain text.
pub async fn upload_image(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> ApiResult<Response> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("image") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await?.to_vec();
        debug!(user_id = user.id, file_name = %file_name, size = data.len(), "image upload");
        return Ok(match state.general.upload_image(&file_name, data).await? {
            Outcome::Done(path) => path.into_response(),
            Outcome::Rejected(rejection) => rejected(rejection),
        });
    }
    Err(ApiError(DomainError::Validation("multipart field \"image\" is missing".into())))
}

pub async fn send_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<CommentRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = body?;
    Ok(outcome(state.general.send_comment(&user, request).await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TagQuery {
    pub query: Option<String>,
}

pub async fn tags(
    State(state): State<AppState>,
    query: Result<Query<TagQuery>, QueryRejection>,
) -> ApiResult<Json<TagsResponse>> {
    let Query(q) = query?;
    Ok(Json(state.general.tags(q.query.as_deref()).await?))
}

pub async fn moderate(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<ModerationRequest>, JsonRejection>,
) -> ApiResult<Json<ResultResponse>> {
    let Json(request) = body?;
    Ok(Json(state.general.moderate(&user, request).await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CalendarQuery {
    pub year: Option<i32>,
}

pub async fn calendar(
    State(state): State<AppState>,
    query: Result<Query<CalendarQuery>, QueryRejection>,
) -> ApiResult<Json<CalendarResponse>> {
    let Query(q) = query?;
    Ok(Json(state.general.calendar(q.year).await?))
}

/// Accepts either a JSON body or a multipart form carrying a new photo.
pub async fn edit_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    request: Request,
) -> ApiResult<Json<ResultResponse>> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));

    let form = if is_multipart {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| ApiError(DomainError::Validation(e.body_text())))?;
        profile_form(multipart).await?
    } else {
        let Json(body) = Json::<ProfileRequest>::from_request(request, &state).await?;
        ProfileForm::from(body)
    };
    Ok(Json(state.general.edit_profile(&user, form).await?))
}

async fn profile_form(mut multipart: Multipart) -> ApiResult<ProfileForm> {
    let mut form = ProfileForm::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "name" => form.name = Some(field.text().await?),
            "email" => form.email = Some(field.text().await?),
            "password" => form.password = Some(field.text().await?).filter(|p| !p.is_empty()),
            "removePhoto" => form.remove_photo = field.text().await?.trim() == "1",
            "photo" => {
                let data = field.bytes().await?;
                if !data.is_empty() {
                    form.photo = Some(data.to_vec());
                }
            }
            other => debug!(field = %other, "ignoring unknown profile field"),
        }
    }
    Ok(form)
}

pub async fn my_statistics(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<StatisticsResponse>> {
    Ok(Json(state.general.my_statistics(&user).await?))
}

pub async fn all_statistics(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
) -> ApiResult<Json<StatisticsResponse>> {
    Ok(Json(state.general.all_statistics(viewer.as_ref()).await?))
}

pub async fn settings(State(state): State<AppState>) -> ApiResult<Json<SettingsDto>> {
    Ok(Json(state.general.settings().await?))
}

pub async fn update_settings(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<SettingsDto>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(settings) = body?;
    state.general.update_settings(&user, settings).await?;
    Ok(StatusCode::OK)
}

fn outcome<T: Serialize>(outcome: Outcome<T>) -> Response {
    match outcome {
        Outcome::Done(value) => Json(value).into_response(),
        Outcome::Rejected(rejection) => rejected(rejection),
    }
}

fn rejected(rejection: ResultResponse) -> Response {
    (StatusCode::BAD_REQUEST, Json(rejection)).into_response()
}
