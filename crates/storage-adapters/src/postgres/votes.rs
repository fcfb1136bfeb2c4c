use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{DomainError, PostId, PostVote, Result, UserId, VoteRepository, VoteValue};

use super::{map_db, PgStore};

#[derive(sqlx::FromRow)]
struct VoteRow {
    id: i64,
    post_id: i64,
    user_id: i64,
    time: DateTime<Utc>,
    value: i16,
}

#[async_trait]
impl VoteRepository for PgStore {
    async fn find(&self, post_id: PostId, user_id: UserId) -> Result<Option<PostVote>> {
        let row = sqlx::query_as::<_, VoteRow>(
            "SELECT id, post_id, user_id, time, value FROM post_votes WHERE post_id = $1 AND user_id = $2",
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db)?;

        row.map(|r| {
            let value = VoteValue::from_i16(r.value)
                .ok_or_else(|| DomainError::Internal(format!("bad vote value {}", r.value)))?;
            Ok(PostVote { id: r.id, post_id: r.post_id, user_id: r.user_id, time: r.time, value })
        })
        .transpose()
    }

    async fn insert(&self, post_id: PostId, user_id: UserId, value: VoteValue, time: DateTime<Utc>) -> Result<()> {
        sqlx::query("INSERT INTO post_votes (post_id, user_id, time, value) VALUES ($1, $2, $3, $4)")
            .bind(post_id)
            .bind(user_id)
            .bind(time)
            .bind(value.as_i16())
            .execute(&self.pool)
            .await
            .map_err(map_db)?;
        Ok(())
    }

    async fn update(&self, id: i64, value: VoteValue, time: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE post_votes SET value = $1, time = $2 WHERE id = $3")
            .bind(value.as_i16())
            .bind(time)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db)?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM post_votes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db)?;
        Ok(())
    }
}
