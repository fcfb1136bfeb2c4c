use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{NewUser, PhotoChange, ProfileUpdate, Result, User, UserId, UserRepository};

use super::{map_db, PgStore};

const USER_COLUMNS: &str = "id, is_moderator, reg_time, name, email, password, code, photo";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    is_moderator: bool,
    reg_time: DateTime<Utc>,
    name: String,
    email: String,
    password: String,
    code: Option<String>,
    photo: Option<String>,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        User {
            id: r.id,
            is_moderator: r.is_moderator,
            reg_time: r.reg_time,
            name: r.name,
            email: r.email,
            password_hash: r.password,
            code: r.code,
            photo: r.photo,
        }
    }
}

impl PgStore {
    async fn fetch_user(&self, predicate: &str, value: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {predicate} = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db)?;
        Ok(row.map(User::from))
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db)?;
        Ok(row.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.fetch_user("lower(email)", &email.to_lowercase()).await
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<User>> {
        self.fetch_user("code", code).await
    }

    async fn insert(&self, user: NewUser) -> Result<User> {
        let sql = format!(
            "INSERT INTO users (is_moderator, reg_time, name, email, password) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user.is_moderator)
            .bind(user.reg_time)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db)?;
        Ok(row.into())
    }

    async fn update_profile(&self, id: UserId, update: ProfileUpdate) -> Result<()> {
        let (touch_photo, photo) = match update.photo {
            PhotoChange::Keep => (false, None),
            PhotoChange::Remove => (true, None),
            PhotoChange::Set(path) => (true, Some(path)),
        };
        sqlx::query(
            "UPDATE users SET name = $1, email = $2, password = COALESCE($3, password), \
             photo = CASE WHEN $4 THEN $5 ELSE photo END WHERE id = $6",
        )
        .bind(&update.name)
        .bind(&update.email)
        .bind(update.password_hash)
        .bind(touch_photo)
        .bind(photo)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_db)?;
        Ok(())
    }

    async fn set_code(&self, id: UserId, code: Option<String>) -> Result<()> {
        sqlx::query("UPDATE users SET code = $1 WHERE id = $2")
            .bind(code)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db)?;
        Ok(())
    }

    async fn update_password(&self, id: UserId, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db)?;
        Ok(())
    }
}
