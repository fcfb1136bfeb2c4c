use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{CaptchaCode, CaptchaRepository, Result};

use super::{map_db, PgStore};

#[derive(sqlx::FromRow)]
struct CaptchaRow {
    id: i64,
    time: DateTime<Utc>,
    code: String,
    secret_code: String,
}

#[async_trait]
impl CaptchaRepository for PgStore {
    async fn insert(&self, code: &str, secret_code: &str, time: DateTime<Utc>) -> Result<()> {
        sqlx::query("INSERT INTO captcha_codes (time, code, secret_code) VALUES ($1, $2, $3)")
            .bind(time)
            .bind(code)
            .bind(secret_code)
            .execute(&self.pool)
            .await
            .map_err(map_db)?;
        Ok(())
    }

    async fn find_by_secret(&self, secret_code: &str) -> Result<Option<CaptchaCode>> {
        let row = sqlx::query_as::<_, CaptchaRow>(
            "SELECT id, time, code, secret_code FROM captcha_codes WHERE secret_code = $1",
        )
        .bind(secret_code)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db)?;
        Ok(row.map(|r| CaptchaCode { id: r.id, time: r.time, code: r.code, secret_code: r.secret_code }))
    }

    async fn delete_by_secret(&self, secret_code: &str) -> Result<()> {
        sqlx::query("DELETE FROM captcha_codes WHERE secret_code = $1")
            .bind(secret_code)
            .execute(&self.pool)
            .await
            .map_err(map_db)?;
        Ok(())
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let done = sqlx::query("DELETE FROM captcha_codes WHERE time < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(map_db)?;
        Ok(done.rows_affected())
    }
}
