use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use domains::{DomainError, PostId, PostVote, Result, UserId, VoteRepository, VoteValue};

use super::MemoryStore;

#[async_trait]
impl VoteRepository for MemoryStore {
    async fn find(&self, post_id: PostId, user_id: UserId) -> Result<Option<PostVote>> {
        Ok(self.votes.get(&(post_id, user_id)).map(|v| v.clone()))
    }

    async fn insert(&self, post_id: PostId, user_id: UserId, value: VoteValue, time: DateTime<Utc>) -> Result<()> {
        match self.votes.entry((post_id, user_id)) {
            Entry::Occupied(_) => Err(DomainError::Conflict(format!(
                "user {user_id} already voted on post {post_id}"
            ))),
            Entry::Vacant(slot) => {
                let id = self.vote_ids.next();
                slot.insert(PostVote { id, post_id, user_id, time, value });
                Ok(())
            }
        }
    }

    async fn update(&self, id: i64, value: VoteValue, time: DateTime<Utc>) -> Result<()> {
        let mut vote = self
            .votes
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or_else(|| DomainError::not_found("Vote", id))?;
        vote.value = value;
        vote.time = time;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.votes.retain(|_, v| v.id != id);
        Ok(())
    }
}
