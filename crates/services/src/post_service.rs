//! Post listings, the post page, authoring and voting.

use chrono::{DateTime, NaiveDate, Utc};
use domains::{
    DomainError, ModerationStatus, MyPostsStatus, NewPost, Page, PostEdit, PostFilter, PostId,
    PostOrder, Result, User, VoteValue,
};
use tracing::{debug, info};

use crate::dto::{PostDetail, PostListResponse, PostRequest, ResultResponse};
use crate::{mappers, validation, Repositories};

pub struct PostService {
    repos: Repositories,
}

impl PostService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Main feed. `mode` is one of `recent`, `popular`, `best`, `early`.
    pub async fn list(&self, page: Page, mode: &str) -> Result<PostListResponse> {
        self.listing(&PostFilter::Published, PostOrder::from_mode(mode), page).await
    }

    /// Full-text-ish search over titles and bodies. A blank query is the feed.
    pub async fn search(&self, page: Page, query: &str) -> Result<PostListResponse> {
        let query = query.trim();
        if query.is_empty() {
            return self.list(page, "recent").await;
        }
        self.listing(&PostFilter::Search(query.to_string()), PostOrder::Recent, page).await
    }

    /// Posts of one day, `date` formatted `YYYY-MM-DD`.
    pub async fn by_date(&self, page: Page, date: &str) -> Result<PostListResponse> {
        let day = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .map_err(|_| DomainError::Validation(format!("invalid date {date:?}")))?;
        self.listing(&PostFilter::Date(day), PostOrder::Recent, page).await
    }

    pub async fn by_tag(&self, page: Page, tag: &str) -> Result<PostListResponse> {
        let tag = tag.trim().to_lowercase();
        self.listing(&PostFilter::Tag(tag), PostOrder::Recent, page).await
    }

    /// The moderation queue of `moderator` (`new`, `declined` or `accepted`).
    pub async fn for_moderation(
        &self,
        moderator: &User,
        page: Page,
        status: &str,
    ) -> Result<PostListResponse> {
        if !moderator.is_moderator {
            return Err(DomainError::Forbidden("moderators only".into()));
        }
        let filter = PostFilter::Moderation {
            status: ModerationStatus::from_query(status),
            moderator_id: moderator.id,
        };
        self.listing(&filter, PostOrder::Recent, page).await
    }

    pub async fn my_posts(&self, user: &User, page: Page, status: &str) -> Result<PostListResponse> {
        let filter = PostFilter::Authored {
            author_id: user.id,
            status: MyPostsStatus::from_query(status),
        };
        self.listing(&filter, PostOrder::Recent, page).await
    }

    async fn listing(
        &self,
        filter: &PostFilter,
        order: PostOrder,
        page: Page,
    ) -> Result<PostListResponse> {
        let now = Utc::now();
        let rows = self.repos.posts.list(filter, order, page, now).await?;
        let count = self.repos.posts.count(filter, now).await?;
        Ok(PostListResponse {
            count,
            posts: rows.iter().map(mappers::post_preview).collect(),
        })
    }

    /// The post page. Counts a view unless the viewer wrote the post or
    /// moderates the blog.
    pub async fn get(&self, viewer: Option<&User>, id: PostId) -> Result<PostDetail> {
        let now = Utc::now();
        let mut summary = self
            .repos
            .posts
            .find(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", id))?;

        let is_author = viewer.is_some_and(|u| u.id == summary.post.author_id);
        let is_moderator = viewer.is_some_and(|u| u.is_moderator);

        if !summary.post.is_published(now) && !is_author && !is_moderator {
            return Err(DomainError::not_found("Post", id));
        }

        if !is_author && !is_moderator {
            self.repos.posts.increment_views(id).await?;
            summary.post.view_count += 1;
        }

        let comments = self.repos.comments.list_for_post(id).await?;
        let tags = self.repos.tags.names_for_post(id).await?;
        Ok(mappers::post_detail(&summary, &comments, tags))
    }

    pub async fn add(&self, author: &User, request: PostRequest) -> Result<ResultResponse> {
        let errors = validation::post_errors(&request.title, &request.text);
        if !errors.is_empty() {
            return Ok(ResultResponse::from_errors(errors));
        }

        let settings = self.repos.settings.load().await?;
        let moderation_status = if settings.post_premoderation {
            ModerationStatus::New
        } else {
            ModerationStatus::Accepted
        };

        let id = self
            .repos
            .posts
            .insert(NewPost {
                author_id: author.id,
                is_active: request.active == 1,
                moderation_status,
                time: publication_time(request.timestamp, Utc::now()),
                title: request.title.trim().to_string(),
                text: request.text,
                tags: validation::normalize_tags(&request.tags),
            })
            .await?;

        info!(post_id = id, author_id = author.id, status = %moderation_status, "post created");
        Ok(ResultResponse::ok())
    }

    /// Edits a post. Only the author and moderators may do so; an edit by the
    /// author sends the post back through premoderation.
    pub async fn edit(&self, editor: &User, id: PostId, request: PostRequest) -> Result<ResultResponse> {
        let existing = self
            .repos
            .posts
            .find(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", id))?;

        let is_author = existing.post.author_id == editor.id;
        if !is_author && !editor.is_moderator {
            return Err(DomainError::Forbidden("only the author or a moderator may edit a post".into()));
        }

        let errors = validation::post_errors(&request.title, &request.text);
        if !errors.is_empty() {
            return Ok(ResultResponse::from_errors(errors));
        }

        let moderation_status = if is_author {
            let settings = self.repos.settings.load().await?;
            if settings.post_premoderation {
                ModerationStatus::New
            } else {
                ModerationStatus::Accepted
            }
        } else {
            existing.post.moderation_status
        };

        self.repos
            .posts
            .update(
                id,
                PostEdit {
                    is_active: request.active == 1,
                    moderation_status,
                    time: publication_time(request.timestamp, Utc::now()),
                    title: request.title.trim().to_string(),
                    text: request.text,
                    tags: validation::normalize_tags(&request.tags),
                },
            )
            .await?;

        info!(post_id = id, editor_id = editor.id, status = %moderation_status, "post edited");
        Ok(ResultResponse::ok())
    }

    pub async fn like(&self, user: &User, post_id: PostId) -> Result<ResultResponse> {
        self.vote(user, post_id, VoteValue::Like).await
    }

    pub async fn dislike(&self, user: &User, post_id: PostId) -> Result<ResultResponse> {
        self.vote(user, post_id, VoteValue::Dislike).await
    }

    /// One vote per user and post. Voting the other way flips the vote,
    /// voting the same way again withdraws it.
    async fn vote(&self, user: &User, post_id: PostId, value: VoteValue) -> Result<ResultResponse> {
        let now = Utc::now();
        let published = self
            .repos
            .posts
            .find(post_id)
            .await?
            .is_some_and(|s| s.post.is_published(now));
        if !published {
            debug!(post_id, user_id = user.id, "vote on unpublished post ignored");
            return Ok(ResultResponse::fail());
        }

        match self.repos.votes.find(post_id, user.id).await? {
            None => {
                self.repos.votes.insert(post_id, user.id, value, now).await?;
                debug!(post_id, user_id = user.id, ?value, "vote recorded");
                Ok(ResultResponse::ok())
            }
            Some(vote) if vote.value == value => {
                self.repos.votes.delete(vote.id).await?;
                debug!(post_id, user_id = user.id, ?value, "vote withdrawn");
                Ok(ResultResponse::fail())
            }
            Some(vote) => {
                self.repos.votes.update(vote.id, value, now).await?;
                debug!(post_id, user_id = user.id, ?value, "vote flipped");
                Ok(ResultResponse::ok())
            }
        }
    }
}

/// Posts cannot be back-dated: a timestamp in the past means "now".
fn publication_time(timestamp: i64, now: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(timestamp, 0)
        .filter(|t| *t > now)
        .unwrap_or(now)
}
