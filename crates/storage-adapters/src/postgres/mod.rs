//! # Postgres repositories
//!
//! One `PgStore` implements every repository port over a shared pool. Multi-row
//! writes (a post and its tags, the settings rows) run inside a transaction.

use chrono::{DateTime, Utc};
use domains::{DomainError, PostFilter};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder};
use tracing::info;

mod captchas;
mod comments;
mod posts;
mod settings;
mod tags;
mod users;
mod votes;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool against `url`.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, DomainError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(map_db)?;
        info!(max_connections, "connected to postgres");
        Ok(Self::new(pool))
    }

    /// Applies the embedded migrations.
    pub async fn migrate(&self) -> Result<(), DomainError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(DomainError::internal)?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

pub(crate) fn map_db(e: sqlx::Error) -> DomainError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            DomainError::Conflict(db.message().to_string())
        }
        _ => DomainError::internal(e),
    }
}

/// Appends the predicate that makes a post publicly visible.
pub(crate) fn push_published(qb: &mut QueryBuilder<'_, Postgres>, now: DateTime<Utc>) {
    qb.push("p.is_active AND p.moderation_status = 'ACCEPTED' AND p.time <= ")
        .push_bind(now);
}

/// Appends ` WHERE ...` for a listing filter.
pub(crate) fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &PostFilter, now: DateTime<Utc>) {
    qb.push(" WHERE ");
    match filter {
        PostFilter::Published => push_published(qb, now),
        PostFilter::Search(query) => {
            push_published(qb, now);
            qb.push(" AND (position(lower(")
                .push_bind(query.clone())
                .push(") in lower(p.title)) > 0 OR position(lower(")
                .push_bind(query.clone())
                .push(") in lower(p.text)) > 0)");
        }
        PostFilter::Date(day) => {
            let start = day.and_time(chrono::NaiveTime::MIN).and_utc();
            push_published(qb, now);
            qb.push(" AND p.time >= ")
                .push_bind(start)
                .push(" AND p.time < ")
                .push_bind(start + chrono::Duration::days(1));
        }
        PostFilter::Tag(tag) => {
            push_published(qb, now);
            qb.push(
                " AND EXISTS (SELECT 1 FROM tag2post tp JOIN tags t ON t.id = tp.tag_id \
                 WHERE tp.post_id = p.id AND t.name = ",
            )
            .push_bind(tag.clone())
            .push(")");
        }
        PostFilter::Moderation { status, moderator_id } => {
            qb.push("p.is_active AND p.moderation_status = ")
                .push_bind(status.as_str())
                .push(" AND (p.moderator_id = ")
                .push_bind(*moderator_id)
                .push(" OR p.moderator_id IS NULL)");
        }
        PostFilter::Authored { author_id, status } => {
            qb.push("p.user_id = ").push_bind(*author_id);
            qb.push(match status {
                domains::MyPostsStatus::Inactive => " AND NOT p.is_active",
                domains::MyPostsStatus::Pending => {
                    " AND p.is_active AND p.moderation_status = 'NEW'"
                }
                domains::MyPostsStatus::Declined => {
                    " AND p.is_active AND p.moderation_status = 'DECLINED'"
                }
                domains::MyPostsStatus::Published => {
                    " AND p.is_active AND p.moderation_status = 'ACCEPTED'"
                }
            });
        }
    }
}
