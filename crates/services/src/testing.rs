//! Mock wiring shared by the service unit tests.

use std::sync::Arc;

use chrono::{Duration, Utc};
use domains::{
    Author, MockCaptchaRepository, MockCommentRepository, MockPostRepository,
    MockSettingsRepository, MockTagRepository, MockUserRepository, MockVoteRepository,
    ModerationStatus, Post, PostSummary, User,
};

use crate::Repositories;

/// One mock per repository port. Set expectations, then call `into_repos`.
#[derive(Default)]
pub struct Mocks {
    pub users: MockUserRepository,
    pub posts: MockPostRepository,
    pub comments: MockCommentRepository,
    pub votes: MockVoteRepository,
    pub tags: MockTagRepository,
    pub captchas: MockCaptchaRepository,
    pub settings: MockSettingsRepository,
}

impl Mocks {
    pub fn into_repos(self) -> Repositories {
        Repositories {
            users: Arc::new(self.users),
            posts: Arc::new(self.posts),
            comments: Arc::new(self.comments),
            votes: Arc::new(self.votes),
            tags: Arc::new(self.tags),
            captchas: Arc::new(self.captchas),
            settings: Arc::new(self.settings),
        }
    }
}

pub fn user(id: i64, moderator: bool) -> User {
    User {
        id,
        is_moderator: moderator,
        reg_time: Utc::now() - Duration::days(30),
        name: format!("user{id}"),
        email: format!("user{id}@example.com"),
        password_hash: "hashed:secret".into(),
        code: None,
        photo: None,
    }
}

pub fn published_post(id: i64, author_id: i64) -> PostSummary {
    PostSummary {
        post: Post {
            id,
            is_active: true,
            moderation_status: ModerationStatus::Accepted,
            moderator_id: None,
            author_id,
            time: Utc::now() - Duration::hours(2),
            title: format!("Post {id}"),
            text: "A sufficiently long body of text for a blog post preview.".into(),
            view_count: 10,
        },
        author: Author { id: author_id, name: format!("user{author_id}"), photo: None },
        likes: 0,
        dislikes: 0,
        comments: 0,
    }
}

pub fn long_text() -> String {
    "Rust makes systems programming approachable and safe for everyone.".into()
}
