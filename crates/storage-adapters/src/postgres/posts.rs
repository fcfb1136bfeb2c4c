use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use domains::{
    Author, DailyCount, DomainError, ModerationStatus, NewPost, Page, Post, PostEdit, PostFilter,
    PostId, PostOrder, PostRepository, PostStatistics, PostSummary, Result, UserId,
};
use sqlx::{Postgres, QueryBuilder, Transaction};

use super::{map_db, push_filter, push_published, PgStore};

const SUMMARY_SELECT: &str = "SELECT p.id, p.is_active, p.moderation_status, p.moderator_id, \
     p.user_id, p.time, p.title, p.text, p.view_count, \
     u.name AS author_name, u.photo AS author_photo, \
     (SELECT COUNT(*) FROM post_votes v WHERE v.post_id = p.id AND v.value = 1) AS likes, \
     (SELECT COUNT(*) FROM post_votes v WHERE v.post_id = p.id AND v.value = -1) AS dislikes, \
     (SELECT COUNT(*) FROM post_comments c WHERE c.post_id = p.id) AS comments \
     FROM posts p JOIN users u ON u.id = p.user_id";

#[derive(sqlx::FromRow)]
struct SummaryRow {
    id: i64,
    is_active: bool,
    moderation_status: String,
    moderator_id: Option<i64>,
    user_id: i64,
    time: DateTime<Utc>,
    title: String,
    text: String,
    view_count: i64,
    author_name: String,
    author_photo: Option<String>,
    likes: i64,
    dislikes: i64,
    comments: i64,
}

impl TryFrom<SummaryRow> for PostSummary {
    type Error = DomainError;

    fn try_from(r: SummaryRow) -> Result<Self> {
        Ok(PostSummary {
            post: Post {
                id: r.id,
                is_active: r.is_active,
                moderation_status: r.moderation_status.parse::<ModerationStatus>()?,
                moderator_id: r.moderator_id,
                author_id: r.user_id,
                time: r.time,
                title: r.title,
                text: r.text,
                view_count: r.view_count,
            },
            author: Author { id: r.user_id, name: r.author_name, photo: r.author_photo },
            likes: r.likes,
            dislikes: r.dislikes,
            comments: r.comments,
        })
    }
}

#[derive(sqlx::FromRow)]
struct StatsRow {
    posts: i64,
    views: i64,
    first_publication: Option<DateTime<Utc>>,
}

#[derive(sqlx::FromRow)]
struct VoteTotals {
    likes: i64,
    dislikes: i64,
}

#[derive(sqlx::FromRow)]
struct DayRow {
    day: NaiveDate,
    posts: i64,
}

fn order_clause(order: PostOrder) -> &'static str {
    match order {
        PostOrder::Recent => " ORDER BY p.time DESC, p.id DESC",
        PostOrder::Early => " ORDER BY p.time ASC, p.id ASC",
        PostOrder::Popular => " ORDER BY comments DESC, p.time DESC, p.id DESC",
        PostOrder::Best => " ORDER BY likes DESC, p.time DESC, p.id DESC",
    }
}

/// Links `tags` to the post, creating the missing tag rows.
async fn link_tags(tx: &mut Transaction<'_, Postgres>, post_id: PostId, tags: &[String]) -> Result<()> {
    for name in tags {
        let (tag_id,): (i64,) = sqlx::query_as(
            "INSERT INTO tags (name) VALUES ($1) \
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name RETURNING id",
        )
        .bind(name)
        .fetch_one(&mut **tx)
        .await
        .map_err(map_db)?;

        sqlx::query("INSERT INTO tag2post (post_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(post_id)
            .bind(tag_id)
            .execute(&mut **tx)
            .await
            .map_err(map_db)?;
    }
    Ok(())
}

#[async_trait]
impl PostRepository for PgStore {
    async fn list(
        &self,
        filter: &PostFilter,
        order: PostOrder,
        page: Page,
        now: DateTime<Utc>,
    ) -> Result<Vec<PostSummary>> {
        let mut qb = QueryBuilder::<Postgres>::new(SUMMARY_SELECT);
        push_filter(&mut qb, filter, now);
        qb.push(order_clause(order));
        qb.push(" LIMIT ").push_bind(page.limit);
        qb.push(" OFFSET ").push_bind(page.offset);

        qb.build_query_as::<SummaryRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_db)?
            .into_iter()
            .map(PostSummary::try_from)
            .collect()
    }

    async fn count(&self, filter: &PostFilter, now: DateTime<Utc>) -> Result<i64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts p");
        push_filter(&mut qb, filter, now);
        let (count,): (i64,) = qb
            .build_query_as()
            .fetch_one(&self.pool)
            .await
            .map_err(map_db)?;
        Ok(count)
    }

    async fn find(&self, id: PostId) -> Result<Option<PostSummary>> {
        let sql = format!("{SUMMARY_SELECT} WHERE p.id = $1");
        sqlx::query_as::<_, SummaryRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db)?
            .map(PostSummary::try_from)
            .transpose()
    }

    async fn insert(&self, post: NewPost) -> Result<PostId> {
        let mut tx = self.pool.begin().await.map_err(map_db)?;

        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO posts (is_active, moderation_status, user_id, time, title, text, view_count) \
             VALUES ($1, $2, $3, $4, $5, $6, 0) RETURNING id",
        )
        .bind(post.is_active)
        .bind(post.moderation_status.as_str())
        .bind(post.author_id)
        .bind(post.time)
        .bind(&post.title)
        .bind(&post.text)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db)?;

        link_tags(&mut tx, id, &post.tags).await?;
        tx.commit().await.map_err(map_db)?;
        Ok(id)
    }

    async fn update(&self, id: PostId, edit: PostEdit) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(map_db)?;

        let updated = sqlx::query(
            "UPDATE posts SET is_active = $1, moderation_status = $2, time = $3, title = $4, text = $5 \
             WHERE id = $6",
        )
        .bind(edit.is_active)
        .bind(edit.moderation_status.as_str())
        .bind(edit.time)
        .bind(&edit.title)
        .bind(&edit.text)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(map_db)?;
        if updated.rows_affected() == 0 {
            return Err(DomainError::not_found("Post", id));
        }

        sqlx::query("DELETE FROM tag2post WHERE post_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_db)?;
        link_tags(&mut tx, id, &edit.tags).await?;

        tx.commit().await.map_err(map_db)?;
        Ok(())
    }

    async fn moderate(&self, id: PostId, status: ModerationStatus, moderator_id: UserId) -> Result<()> {
        sqlx::query("UPDATE posts SET moderation_status = $1, moderator_id = $2 WHERE id = $3")
            .bind(status.as_str())
            .bind(moderator_id)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db)?;
        Ok(())
    }

    async fn increment_views(&self, id: PostId) -> Result<()> {
        sqlx::query("UPDATE posts SET view_count = view_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db)?;
        Ok(())
    }

    async fn statistics(&self, author_id: Option<UserId>, now: DateTime<Utc>) -> Result<PostStatistics> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) AS posts, COALESCE(SUM(p.view_count), 0)::BIGINT AS views, \
             MIN(p.time) AS first_publication FROM posts p WHERE ",
        );
        push_published(&mut qb, now);
        if let Some(author_id) = author_id {
            qb.push(" AND p.user_id = ").push_bind(author_id);
        }
        let stats: StatsRow = qb.build_query_as().fetch_one(&self.pool).await.map_err(map_db)?;

        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FILTER (WHERE v.value = 1) AS likes, \
             COUNT(*) FILTER (WHERE v.value = -1) AS dislikes \
             FROM post_votes v JOIN posts p ON p.id = v.post_id WHERE ",
        );
        push_published(&mut qb, now);
        if let Some(author_id) = author_id {
            qb.push(" AND p.user_id = ").push_bind(author_id);
        }
        let votes: VoteTotals = qb.build_query_as().fetch_one(&self.pool).await.map_err(map_db)?;

        Ok(PostStatistics {
            posts: stats.posts,
            likes: votes.likes,
            dislikes: votes.dislikes,
            views: stats.views,
            first_publication: stats.first_publication,
        })
    }

    async fn publication_years(&self, now: DateTime<Utc>) -> Result<Vec<i32>> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT DISTINCT EXTRACT(YEAR FROM p.time AT TIME ZONE 'UTC')::INT AS year FROM posts p WHERE ",
        );
        push_published(&mut qb, now);
        qb.push(" ORDER BY year");
        let rows: Vec<(i32,)> = qb.build_query_as().fetch_all(&self.pool).await.map_err(map_db)?;
        Ok(rows.into_iter().map(|(y,)| y).collect())
    }

    async fn daily_counts(&self, year: i32, now: DateTime<Utc>) -> Result<Vec<DailyCount>> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT (p.time AT TIME ZONE 'UTC')::DATE AS day, COUNT(*) AS posts FROM posts p WHERE ",
        );
        push_published(&mut qb, now);
        qb.push(" AND EXTRACT(YEAR FROM p.time AT TIME ZONE 'UTC')::INT = ")
            .push_bind(year)
            .push(" GROUP BY day ORDER BY day");
        let rows: Vec<DayRow> = qb.build_query_as().fetch_all(&self.pool).await.map_err(map_db)?;
        Ok(rows
            .into_iter()
            .map(|r| DailyCount { day: r.day, posts: r.posts })
            .collect())
    }

    async fn count_awaiting_moderation(&self, moderator_id: UserId) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM posts WHERE is_active AND moderation_status = 'NEW' \
             AND (moderator_id = $1 OR moderator_id IS NULL)",
        )
        .bind(moderator_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db)?;
        Ok(count)
    }
}
