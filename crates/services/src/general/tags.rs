use chrono::Utc;
use domains::{PostFilter, Result};

use super::GeneralService;
use crate::dto::TagsResponse;
use crate::mappers;

impl GeneralService {
    /// Tag cloud of published posts, optionally narrowed to a name prefix.
    pub async fn tags(&self, query: Option<&str>) -> Result<TagsResponse> {
        let now = Utc::now();
        let prefix = query.map(|q| q.trim().to_lowercase()).unwrap_or_default();
        let usage = self.repos.tags.usage(&prefix, now).await?;
        let published = self.repos.posts.count(&PostFilter::Published, now).await?;
        Ok(TagsResponse { tags: mappers::tag_weights(&usage, published) })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::service;
    use super::*;
    use crate::testing::Mocks;
    use domains::TagUsage;

    #[tokio::test]
    async fn prefix_is_normalised_and_weights_scaled() {
        let mut mocks = Mocks::default();
        mocks
            .tags
            .expect_usage()
            .withf(|p, _| p == "ru")
            .returning(|_, _| Ok(vec![TagUsage { name: "rust".into(), posts: 2 }]));
        mocks.posts.expect_count().returning(|_, _| Ok(4));

        let response = service(mocks).tags(Some(" RU ")).await.unwrap();
        assert_eq!(response.tags.len(), 1);
        assert_eq!(response.tags[0].weight, 1.0);
    }
}
