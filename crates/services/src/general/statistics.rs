use chrono::Utc;
use domains::{DomainError, PostStatistics, Result, User};

use super::GeneralService;
use crate::dto::StatisticsResponse;

impl GeneralService {
    pub async fn my_statistics(&self, user: &User) -> Result<StatisticsResponse> {
        let stats = self.repos.posts.statistics(Some(user.id), Utc::now()).await?;
        Ok(to_response(stats))
    }

    /// Blog-wide statistics. Open to everyone while `STATISTICS_IS_PUBLIC` is
    /// on, to moderators only otherwise.
    pub async fn all_statistics(&self, viewer: Option<&User>) -> Result<StatisticsResponse> {
        let settings = self.repos.settings.load().await?;
        if !settings.statistics_is_public {
            match viewer {
                None => return Err(DomainError::Unauthorized("statistics are private".into())),
                Some(u) if !u.is_moderator => {
                    return Err(DomainError::Forbidden("statistics are private".into()))
                }
                Some(_) => {}
            }
        }
        let stats = self.repos.posts.statistics(None, Utc::now()).await?;
        Ok(to_response(stats))
    }
}

fn to_response(stats: PostStatistics) -> StatisticsResponse {
    StatisticsResponse {
        posts_count: stats.posts,
        likes_count: stats.likes,
        dislikes_count: stats.dislikes,
        views_count: stats.views,
        first_publication: stats.first_publication.map_or(0, |t| t.timestamp()),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::service;
    use super::*;
    use crate::testing::{user, Mocks};
    use chrono::TimeZone;
    use domains::GlobalSettings;

    fn private() -> GlobalSettings {
        GlobalSettings { statistics_is_public: false, ..GlobalSettings::default() }
    }

    #[tokio::test]
    async fn my_statistics_are_scoped_to_caller() {
        let mut mocks = Mocks::default();
        mocks
            .posts
            .expect_statistics()
            .withf(|author, _| *author == Some(3))
            .returning(|_, _| {
                Ok(PostStatistics {
                    posts: 2,
                    likes: 5,
                    dislikes: 1,
                    views: 40,
                    first_publication: Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()),
                })
            });
        let response = service(mocks).my_statistics(&user(3, false)).await.unwrap();
        assert_eq!(response.posts_count, 2);
        assert_eq!(response.first_publication, 1_577_836_800);
    }

    #[tokio::test]
    async fn private_statistics_need_a_moderator() {
        let mut mocks = Mocks::default();
        mocks.settings.expect_load().returning(|| Ok(private()));
        mocks.posts.expect_statistics().returning(|_, _| Ok(PostStatistics::default()));
        let service = service(mocks);

        assert!(matches!(service.all_statistics(None).await, Err(DomainError::Unauthorized(_))));
        assert!(matches!(
            service.all_statistics(Some(&user(1, false))).await,
            Err(DomainError::Forbidden(_))
        ));
        let response = service.all_statistics(Some(&user(2, true))).await.unwrap();
        assert_eq!(response.first_publication, 0);
    }

    #[tokio::test]
    async fn public_statistics_are_open() {
        let mut mocks = Mocks::default();
        mocks.settings.expect_load().returning(|| Ok(GlobalSettings::default()));
        mocks.posts.expect_statistics().withf(|a, _| a.is_none()).returning(|_, _| Ok(PostStatistics::default()));
        assert!(service(mocks).all_statistics(None).await.is_ok());
    }
}
