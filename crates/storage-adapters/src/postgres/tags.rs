use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{PostId, Result, TagRepository, TagUsage};
use sqlx::{Postgres, QueryBuilder};

use super::{map_db, push_published, PgStore};

#[async_trait]
impl TagRepository for PgStore {
    async fn usage(&self, prefix: &str, now: DateTime<Utc>) -> Result<Vec<TagUsage>> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT t.name, COUNT(DISTINCT p.id) AS posts FROM tags t \
             JOIN tag2post tp ON tp.tag_id = t.id JOIN posts p ON p.id = tp.post_id WHERE ",
        );
        push_published(&mut qb, now);
        if !prefix.is_empty() {
            qb.push(" AND left(t.name, char_length(")
                .push_bind(prefix.to_string())
                .push(")) = ")
                .push_bind(prefix.to_string());
        }
        qb.push(" GROUP BY t.name ORDER BY t.name");

        let rows: Vec<(String, i64)> = qb.build_query_as().fetch_all(&self.pool).await.map_err(map_db)?;
        Ok(rows
            .into_iter()
            .map(|(name, posts)| TagUsage { name, posts })
            .collect())
    }

    async fn names_for_post(&self, post_id: PostId) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT t.name FROM tags t JOIN tag2post tp ON tp.tag_id = t.id WHERE tp.post_id = $1 ORDER BY t.name",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db)?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }
}
