use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{PostFilter, PostId, Result, TagRepository, TagUsage};

use super::MemoryStore;

#[async_trait]
impl TagRepository for MemoryStore {
    async fn usage(&self, prefix: &str, now: DateTime<Utc>) -> Result<Vec<TagUsage>> {
        let mut counts: BTreeMap<String, i64> = BTreeMap::new();
        for post in self.selected(&PostFilter::Published, now) {
            let Some(tags) = self.post_tags.get(&post.id) else {
                continue;
            };
            for tag in tags.iter().filter(|t| t.starts_with(prefix)) {
                *counts.entry(tag.clone()).or_insert(0) += 1;
            }
        }
        Ok(counts
            .into_iter()
            .map(|(name, posts)| TagUsage { name, posts })
            .collect())
    }

    async fn names_for_post(&self, post_id: PostId) -> Result<Vec<String>> {
        let mut names = self
            .post_tags
            .get(&post_id)
            .map(|t| t.clone())
            .unwrap_or_default();
        names.sort();
        Ok(names)
    }
}
