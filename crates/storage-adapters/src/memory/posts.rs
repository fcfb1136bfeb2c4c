use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use domains::{
    DailyCount, DomainError, ModerationStatus, NewPost, Page, Post, PostEdit, PostFilter, PostId,
    PostOrder, PostRepository, PostStatistics, PostSummary, Result, UserId, VoteValue,
};

use super::MemoryStore;

impl MemoryStore {
    fn matches(&self, filter: &PostFilter, post: &Post, now: DateTime<Utc>) -> bool {
        match filter {
            PostFilter::Published => post.is_published(now),
            PostFilter::Search(query) => {
                let query = query.to_lowercase();
                post.is_published(now)
                    && (post.title.to_lowercase().contains(&query)
                        || post.text.to_lowercase().contains(&query))
            }
            PostFilter::Date(day) => post.is_published(now) && post.time.date_naive() == *day,
            PostFilter::Tag(tag) => {
                post.is_published(now)
                    && self
                        .post_tags
                        .get(&post.id)
                        .is_some_and(|tags| tags.iter().any(|t| t == tag))
            }
            PostFilter::Moderation { status, moderator_id } => {
                post.is_active
                    && post.moderation_status == *status
                    && post.moderator_id.map_or(true, |m| m == *moderator_id)
            }
            PostFilter::Authored { author_id, status } => {
                post.author_id == *author_id && status.matches(post)
            }
        }
    }

    pub(super) fn selected(&self, filter: &PostFilter, now: DateTime<Utc>) -> Vec<Post> {
        self.posts
            .iter()
            .filter(|p| self.matches(filter, p.value(), now))
            .map(|p| p.value().clone())
            .collect()
    }

    fn published_by(&self, author_id: Option<UserId>, now: DateTime<Utc>) -> Vec<Post> {
        self.selected(&PostFilter::Published, now)
            .into_iter()
            .filter(|p| author_id.map_or(true, |a| p.author_id == a))
            .collect()
    }

    fn set_tags(&self, post_id: PostId, tags: Vec<String>) {
        self.post_tags.insert(post_id, tags);
    }
}

fn sort(rows: &mut [PostSummary], order: PostOrder) {
    let newest = |a: &PostSummary, b: &PostSummary| {
        b.post.time.cmp(&a.post.time).then(b.post.id.cmp(&a.post.id))
    };
    match order {
        PostOrder::Recent => rows.sort_by(newest),
        PostOrder::Early => rows.sort_by(|a, b| newest(b, a)),
        PostOrder::Popular => rows.sort_by(|a, b| b.comments.cmp(&a.comments).then(newest(a, b))),
        PostOrder::Best => rows.sort_by(|a, b| b.likes.cmp(&a.likes).then(newest(a, b))),
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn list(
        &self,
        filter: &PostFilter,
        order: PostOrder,
        page: Page,
        now: DateTime<Utc>,
    ) -> Result<Vec<PostSummary>> {
        let mut rows: Vec<PostSummary> = self
            .selected(filter, now)
            .into_iter()
            .map(|p| self.summarize(p))
            .collect();
        sort(&mut rows, order);
        Ok(rows
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect())
    }

    async fn count(&self, filter: &PostFilter, now: DateTime<Utc>) -> Result<i64> {
        Ok(self.posts.iter().filter(|p| self.matches(filter, p.value(), now)).count() as i64)
    }

    async fn find(&self, id: PostId) -> Result<Option<PostSummary>> {
        let post = self.posts.get(&id).map(|p| p.value().clone());
        Ok(post.map(|p| self.summarize(p)))
    }

    async fn insert(&self, post: NewPost) -> Result<PostId> {
        if !self.users.contains_key(&post.author_id) {
            return Err(DomainError::not_found("User", post.author_id));
        }
        let id = self.post_ids.next();
        self.posts.insert(
            id,
            Post {
                id,
                is_active: post.is_active,
                moderation_status: post.moderation_status,
                moderator_id: None,
                author_id: post.author_id,
                time: post.time,
                title: post.title,
                text: post.text,
                view_count: 0,
            },
        );
        self.set_tags(id, post.tags);
        Ok(id)
    }

    async fn update(&self, id: PostId, edit: PostEdit) -> Result<()> {
        {
            let mut post = self
                .posts
                .get_mut(&id)
                .ok_or_else(|| DomainError::not_found("Post", id))?;
            post.is_active = edit.is_active;
            post.moderation_status = edit.moderation_status;
            post.time = edit.time;
            post.title = edit.title;
            post.text = edit.text;
        }
        self.set_tags(id, edit.tags);
        Ok(())
    }

    async fn moderate(&self, id: PostId, status: ModerationStatus, moderator_id: UserId) -> Result<()> {
        let mut post = self
            .posts
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("Post", id))?;
        post.moderation_status = status;
        post.moderator_id = Some(moderator_id);
        Ok(())
    }

    async fn increment_views(&self, id: PostId) -> Result<()> {
        if let Some(mut post) = self.posts.get_mut(&id) {
            post.view_count += 1;
        }
        Ok(())
    }

    async fn statistics(&self, author_id: Option<UserId>, now: DateTime<Utc>) -> Result<PostStatistics> {
        let posts = self.published_by(author_id, now);
        Ok(PostStatistics {
            posts: posts.len() as i64,
            likes: posts.iter().map(|p| self.vote_count(p.id, VoteValue::Like)).sum(),
            dislikes: posts.iter().map(|p| self.vote_count(p.id, VoteValue::Dislike)).sum(),
            views: posts.iter().map(|p| p.view_count).sum(),
            first_publication: posts.iter().map(|p| p.time).min(),
        })
    }

    async fn publication_years(&self, now: DateTime<Utc>) -> Result<Vec<i32>> {
        let years: BTreeSet<i32> = self
            .published_by(None, now)
            .iter()
            .map(|p| p.time.year())
            .collect();
        Ok(years.into_iter().collect())
    }

    async fn daily_counts(&self, year: i32, now: DateTime<Utc>) -> Result<Vec<DailyCount>> {
        let mut days = BTreeMap::new();
        for post in self.published_by(None, now) {
            if post.time.year() == year {
                *days.entry(post.time.date_naive()).or_insert(0_i64) += 1;
            }
        }
        Ok(days
            .into_iter()
            .map(|(day, posts)| DailyCount { day, posts })
            .collect())
    }

    async fn count_awaiting_moderation(&self, moderator_id: UserId) -> Result<i64> {
        let filter = PostFilter::Moderation { status: ModerationStatus::New, moderator_id };
        self.count(&filter, Utc::now()).await
    }
}
