use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{Author, CommentId, CommentRepository, NewComment, PostComment, PostId, Result};

use super::{map_db, PgStore};

const COMMENT_SELECT: &str = "SELECT c.id, c.parent_id, c.post_id, c.time, c.text, \
     u.id AS user_id, u.name AS user_name, u.photo AS user_photo \
     FROM post_comments c JOIN users u ON u.id = c.user_id";

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: i64,
    parent_id: Option<i64>,
    post_id: i64,
    time: DateTime<Utc>,
    text: String,
    user_id: i64,
    user_name: String,
    user_photo: Option<String>,
}

impl From<CommentRow> for PostComment {
    fn from(r: CommentRow) -> Self {
        PostComment {
            id: r.id,
            parent_id: r.parent_id,
            post_id: r.post_id,
            author: Author { id: r.user_id, name: r.user_name, photo: r.user_photo },
            time: r.time,
            text: r.text,
        }
    }
}

#[async_trait]
impl CommentRepository for PgStore {
    async fn list_for_post(&self, post_id: PostId) -> Result<Vec<PostComment>> {
        let sql = format!("{COMMENT_SELECT} WHERE c.post_id = $1 ORDER BY c.time, c.id");
        let rows = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(post_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db)?;
        Ok(rows.into_iter().map(PostComment::from).collect())
    }

    async fn find(&self, id: CommentId) -> Result<Option<PostComment>> {
        let sql = format!("{COMMENT_SELECT} WHERE c.id = $1");
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db)?;
        Ok(row.map(PostComment::from))
    }

    async fn insert(&self, comment: NewComment) -> Result<CommentId> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO post_comments (parent_id, post_id, user_id, time, text) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(comment.parent_id)
        .bind(comment.post_id)
        .bind(comment.user_id)
        .bind(comment.time)
        .bind(&comment.text)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db)?;
        Ok(id)
    }
}
