use domains::{DomainError, GlobalSettings, Result, User};
use tracing::info;

use super::GeneralService;
use crate::dto::SettingsDto;

impl GeneralService {
    pub async fn settings(&self) -> Result<SettingsDto> {
        Ok(self.repos.settings.load().await?.into())
    }

    pub async fn update_settings(&self, user: &User, settings: SettingsDto) -> Result<()> {
        if !user.is_moderator {
            return Err(DomainError::Forbidden("only moderators may change settings".into()));
        }
        let settings = GlobalSettings::from(settings);
        self.repos.settings.store(settings).await?;
        info!(moderator_id = user.id, ?settings, "global settings changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::service;
    use super::*;
    use crate::testing::{user, Mocks};

    #[tokio::test]
    async fn regular_users_cannot_change_settings() {
        let err = service(Mocks::default())
            .update_settings(&user(1, false), SettingsDto::from(GlobalSettings::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn moderator_stores_flags() {
        let mut mocks = Mocks::default();
        mocks
            .settings
            .expect_store()
            .withf(|s| !s.multiuser_mode && s.post_premoderation && !s.statistics_is_public)
            .times(1)
            .returning(|_| Ok(()));
        let dto = SettingsDto {
            multiuser_mode: false,
            post_premoderation: true,
            statistics_is_public: false,
        };
        service(mocks).update_settings(&user(1, true), dto).await.unwrap();
    }
}
