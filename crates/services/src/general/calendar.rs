use chrono::{Datelike, Utc};
use domains::Result;

use super::GeneralService;
use crate::dto::CalendarResponse;

impl GeneralService {
    /// Years with publications plus per-day counts of `year` (this year by default).
    pub async fn calendar(&self, year: Option<i32>) -> Result<CalendarResponse> {
        let now = Utc::now();
        let year = year.unwrap_or_else(|| now.year());
        let years = self.repos.posts.publication_years(now).await?;
        let posts = self
            .repos
            .posts
            .daily_counts(year, now)
            .await?
            .into_iter()
            .map(|d| (d.day.format("%Y-%m-%d").to_string(), d.posts))
            .collect();
        Ok(CalendarResponse { years, posts })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::service;
    use super::*;
    use crate::testing::Mocks;
    use chrono::NaiveDate;
    use domains::DailyCount;

    #[tokio::test]
    async fn days_are_keyed_by_iso_date() {
        let mut mocks = Mocks::default();
        mocks.posts.expect_publication_years().returning(|_| Ok(vec![2019, 2020]));
        mocks
            .posts
            .expect_daily_counts()
            .withf(|y, _| *y == 2019)
            .returning(|_, _| {
                Ok(vec![DailyCount { day: NaiveDate::from_ymd_opt(2019, 3, 7).unwrap(), posts: 2 }])
            });

        let response = service(mocks).calendar(Some(2019)).await.unwrap();
        assert_eq!(response.years, vec![2019, 2020]);
        assert_eq!(response.posts.get("2019-03-07"), Some(&2));
    }
}
