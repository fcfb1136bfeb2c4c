use chrono::Utc;
use domains::{DomainError, NewComment, Result, User};
use tracing::info;

use super::GeneralService;
use crate::dto::{CommentCreated, CommentRequest, FieldErrors, Outcome, ResultResponse};
use crate::validation;

impl GeneralService {
    /// Adds a comment, optionally as a reply. Replies must stay within the
    /// post they answer.
    pub async fn send_comment(
        &self,
        user: &User,
        request: CommentRequest,
    ) -> Result<Outcome<CommentCreated>> {
        let now = Utc::now();
        let post = self
            .repos
            .posts
            .find(request.post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", request.post_id))?;

        let visible = post.post.is_published(now)
            || post.post.author_id == user.id
            || user.is_moderator;
        if !visible {
            return Err(DomainError::not_found("Post", request.post_id));
        }

        if let Some(parent_id) = request.parent_id {
            let parent = self.repos.comments.find(parent_id).await?;
            if !parent.is_some_and(|c| c.post_id == request.post_id) {
                return Err(DomainError::Validation(format!(
                    "comment {parent_id} does not belong to post {}",
                    request.post_id
                )));
            }
        }

        if let Some(message) = validation::comment_error(&request.text) {
            let errors = FieldErrors { text: Some(message), ..FieldErrors::default() };
            return Ok(Outcome::Rejected(ResultResponse::from_errors(errors)));
        }

        let id = self
            .repos
            .comments
            .insert(NewComment {
                parent_id: request.parent_id,
                post_id: request.post_id,
                user_id: user.id,
                time: now,
                text: request.text.trim().to_string(),
            })
            .await?;

        info!(comment_id = id, post_id = request.post_id, user_id = user.id, "comment added");
        Ok(Outcome::Done(CommentCreated { id }))
    }
}
