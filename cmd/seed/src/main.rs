//! Prepares a fresh database: applies migrations, writes the global settings
//! and creates the first moderator from `SEED_MODERATOR_EMAIL` /
//! `SEED_MODERATOR_PASSWORD` (`SEED_MODERATOR_NAME` is optional).

use anyhow::{bail, Context};
use auth_adapters::Argon2Hasher;
use chrono::Utc;
use configs::Settings;
use domains::{NewUser, PasswordHasher, SettingsRepository, UserRepository};
use storage_adapters::PgStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::load().context("loading settings")?;
    let store = PgStore::connect(&settings.database.url, 2)
        .await
        .context("connecting to postgres")?;
    store.migrate().await.context("running migrations")?;

    // keeps flags an operator already changed
    let flags = store.load().await?;
    store.store(flags).await?;
    info!(?flags, "global settings in place");

    let email = std::env::var("SEED_MODERATOR_EMAIL").context("SEED_MODERATOR_EMAIL is not set")?;
    let password =
        std::env::var("SEED_MODERATOR_PASSWORD").context("SEED_MODERATOR_PASSWORD is not set")?;
    let name = std::env::var("SEED_MODERATOR_NAME").unwrap_or_else(|_| "Moderator".into());
    let email = email.trim().to_lowercase();
    if password.chars().count() < 6 {
        bail!("SEED_MODERATOR_PASSWORD must have at least 6 characters");
    }

    if let Some(existing) = store.find_by_email(&email).await? {
        info!(user_id = existing.id, email = %email, "moderator already exists");
        return Ok(());
    }

    let moderator = NewUser {
        name,
        email,
        password_hash: Argon2Hasher::new().hash(&password)?,
        reg_time: Utc::now(),
        is_moderator: true,
    };
    let user = UserRepository::insert(&store, moderator).await?;
    info!(user_id = user.id, email = %user.email, "moderator created");
    Ok(())
}
