//! `/api/post*`: listings, the post page, authoring and votes.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use domains::{Page, PostId};
use serde::Deserialize;
use services::dto::{PostDetail, PostListResponse, PostRequest, ResultResponse, VoteRequest};

use crate::error::ApiResult;
use crate::extract::{CurrentUser, Viewer};
use crate::state::AppState;

/// Query string shared by every listing; each endpoint reads the keys it needs.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
    pub mode: Option<String>,
    pub query: Option<String>,
    pub date: Option<String>,
    pub tag: Option<String>,
    pub status: Option<String>,
}

impl ListQuery {
    fn page(&self) -> Page {
        Page::new(self.offset.unwrap_or(0), self.limit.unwrap_or(Page::DEFAULT_LIMIT))
    }
}

type Listing = ApiResult<Json<PostListResponse>>;

pub async fn list(State(state): State<AppState>, query: Result<Query<ListQuery>, QueryRejection>) -> Listing {
    let Query(q) = query?;
    let mode = q.mode.as_deref().unwrap_or("recent");
    Ok(Json(state.posts.list(q.page(), mode).await?))
}

pub async fn search(State(state): State<AppState>, query: Result<Query<ListQuery>, QueryRejection>) -> Listing {
    let Query(q) = query?;
    Ok(Json(state.posts.search(q.page(), q.query.as_deref().unwrap_or_default()).await?))
}

pub async fn by_date(State(state): State<AppState>, query: Result<Query<ListQuery>, QueryRejection>) -> Listing {
    let Query(q) = query?;
    Ok(Json(state.posts.by_date(q.page(), q.date.as_deref().unwrap_or_default()).await?))
}

pub async fn by_tag(State(state): State<AppState>, query: Result<Query<ListQuery>, QueryRejection>) -> Listing {
    let Query(q) = query?;
    Ok(Json(state.posts.by_tag(q.page(), q.tag.as_deref().unwrap_or_default()).await?))
}

pub async fn for_moderation(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Listing {
    let Query(q) = query?;
    let status = q.status.as_deref().unwrap_or("new");
    Ok(Json(state.posts.for_moderation(&user, q.page(), status).await?))
}

pub async fn my_posts(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Listing {
    let Query(q) = query?;
    let status = q.status.as_deref().unwrap_or("published");
    Ok(Json(state.posts.my_posts(&user, q.page(), status).await?))
}

pub async fn get_post(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
    Path(id): Path<PostId>,
) -> ApiResult<Json<PostDetail>> {
    Ok(Json(state.posts.get(viewer.as_ref(), id).await?))
}

pub async fn add_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<PostRequest>, JsonRejection>,
) -> ApiResult<Json<ResultResponse>> {
    let Json(request) = body?;
    Ok(Json(state.posts.add(&user, request).await?))
}

pub async fn edit_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<PostId>,
    body: Result<Json<PostRequest>, JsonRejection>,
) -> ApiResult<Json<ResultResponse>> {
    let Json(request) = body?;
    Ok(Json(state.posts.edit(&user, id, request).await?))
}

pub async fn like(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<VoteRequest>, JsonRejection>,
) -> ApiResult<Json<ResultResponse>> {
    let Json(request) = body?;
    Ok(Json(state.posts.like(&user, request.post_id).await?))
}

pub async fn dislike(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<VoteRequest>, JsonRejection>,
) -> ApiResult<Json<ResultResponse>> {
    let Json(request) = body?;
    Ok(Json(state.posts.dislike(&user, request.post_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_and_clamps() {
        assert_eq!(ListQuery::default().page(), Page::new(0, Page::DEFAULT_LIMIT));
        let q = ListQuery { offset: Some(-5), limit: Some(1000), ..Default::default() };
        assert_eq!(q.page(), Page::new(0, Page::MAX_LIMIT));
    }
}
