use async_trait::async_trait;
use domains::{GlobalSettings, Result, SettingCode, SettingsRepository};

use super::MemoryStore;

#[async_trait]
impl SettingsRepository for MemoryStore {
    async fn load(&self) -> Result<GlobalSettings> {
        let mut settings = GlobalSettings::default();
        for code in SettingCode::ALL {
            if let Some(value) = self.settings.get(&code) {
                settings.set(code, *value);
            }
        }
        Ok(settings)
    }

    async fn store(&self, settings: GlobalSettings) -> Result<()> {
        for code in SettingCode::ALL {
            self.settings.insert(code, settings.get(code));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stored_flags_are_loaded_back() {
        let store = MemoryStore::new();
        let flags = GlobalSettings {
            multiuser_mode: false,
            post_premoderation: true,
            statistics_is_public: false,
        };
        store.store(flags).await.unwrap();
        assert_eq!(store.load().await.unwrap(), flags);
    }
}
