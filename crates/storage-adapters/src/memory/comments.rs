use async_trait::async_trait;
use domains::{CommentId, CommentRepository, DomainError, NewComment, PostComment, PostId, Result};

use super::{CommentRecord, MemoryStore};

impl MemoryStore {
    fn to_comment(&self, record: CommentRecord) -> PostComment {
        PostComment {
            id: record.id,
            parent_id: record.parent_id,
            post_id: record.post_id,
            author: self.author(record.user_id),
            time: record.time,
            text: record.text,
        }
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn list_for_post(&self, post_id: PostId) -> Result<Vec<PostComment>> {
        let mut records: Vec<CommentRecord> = self
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .map(|c| c.value().clone())
            .collect();
        records.sort_by(|a, b| a.time.cmp(&b.time).then(a.id.cmp(&b.id)));
        Ok(records.into_iter().map(|r| self.to_comment(r)).collect())
    }

    async fn find(&self, id: CommentId) -> Result<Option<PostComment>> {
        let record = self.comments.get(&id).map(|c| c.value().clone());
        Ok(record.map(|r| self.to_comment(r)))
    }

    async fn insert(&self, comment: NewComment) -> Result<CommentId> {
        if !self.posts.contains_key(&comment.post_id) {
            return Err(DomainError::not_found("Post", comment.post_id));
        }
        let id = self.comment_ids.next();
        self.comments.insert(
            id,
            CommentRecord {
                id,
                parent_id: comment.parent_id,
                post_id: comment.post_id,
                user_id: comment.user_id,
                time: comment.time,
                text: comment.text,
            },
        );
        Ok(id)
    }
}
