use domains::{Decision, DomainError, Result, User};
use tracing::{debug, info};

use super::GeneralService;
use crate::dto::{ModerationRequest, ResultResponse};

impl GeneralService {
    /// Accepts or declines a post on behalf of a moderator.
    pub async fn moderate(&self, user: &User, request: ModerationRequest) -> Result<ResultResponse> {
        if !user.is_moderator {
            debug!(user_id = user.id, "moderation attempt by regular user");
            return Ok(ResultResponse::fail());
        }
        let Some(decision) = Decision::parse(&request.decision) else {
            return Ok(ResultResponse::fail());
        };
        if self.repos.posts.find(request.post_id).await?.is_none() {
            return Err(DomainError::not_found("Post", request.post_id));
        }

        let status = decision.status();
        self.repos.posts.moderate(request.post_id, status, user.id).await?;
        info!(post_id = request.post_id, moderator_id = user.id, status = %status, "post moderated");
        Ok(ResultResponse::ok())
    }
}
