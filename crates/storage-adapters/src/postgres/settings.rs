use async_trait::async_trait;
use domains::{GlobalSettings, Result, SettingCode, SettingsRepository};
use tracing::warn;

use super::{map_db, PgStore};

#[async_trait]
impl SettingsRepository for PgStore {
    /// Missing rows fall back to the defaults.
    async fn load(&self) -> Result<GlobalSettings> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT code, value FROM global_settings")
            .fetch_all(&self.pool)
            .await
            .map_err(map_db)?;

        let mut settings = GlobalSettings::default();
        for (code, value) in rows {
            match SettingCode::parse(&code) {
                Some(code) => settings.set(code, GlobalSettings::decode(&value)),
                None => warn!(code = %code, "unknown global setting ignored"),
            }
        }
        Ok(settings)
    }

    async fn store(&self, settings: GlobalSettings) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(map_db)?;
        for code in SettingCode::ALL {
            sqlx::query(
                "INSERT INTO global_settings (code, name, value) VALUES ($1, $1, $2) \
                 ON CONFLICT (code) DO UPDATE SET value = EXCLUDED.value",
            )
            .bind(code.as_str())
            .bind(GlobalSettings::encode(settings.get(code)))
            .execute(&mut *tx)
            .await
            .map_err(map_db)?;
        }
        tx.commit().await.map_err(map_db)?;
        Ok(())
    }
}
