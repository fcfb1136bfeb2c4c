//! # In-memory store
//!
//! Implements every repository port over `DashMap`s. Nothing survives a
//! restart; the store backs `--database.backend memory` runs and the HTTP
//! integration tests.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use domains::{
    Author, CaptchaCode, CommentId, GlobalSettings, Post, PostId, PostSummary, PostVote,
    SettingCode, User, UserId, VoteValue,
};

mod captchas;
mod comments;
mod posts;
mod settings;
mod tags;
mod users;
mod votes;

/// Monotonic id source, one per table.
#[derive(Default)]
struct Sequence(AtomicI64);

impl Sequence {
    fn next(&self) -> i64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[derive(Debug, Clone)]
struct CommentRecord {
    id: CommentId,
    parent_id: Option<CommentId>,
    post_id: PostId,
    user_id: UserId,
    time: DateTime<Utc>,
    text: String,
}

pub struct MemoryStore {
    users: DashMap<UserId, User>,
    /// lowercase e-mail → user id; enforces uniqueness
    emails: DashMap<String, UserId>,
    posts: DashMap<PostId, Post>,
    post_tags: DashMap<PostId, Vec<String>>,
    comments: DashMap<CommentId, CommentRecord>,
    votes: DashMap<(PostId, UserId), PostVote>,
    captchas: DashMap<String, CaptchaCode>,
    settings: DashMap<SettingCode, bool>,
    user_ids: Sequence,
    post_ids: Sequence,
    comment_ids: Sequence,
    vote_ids: Sequence,
    captcha_ids: Sequence,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// An empty store with the default global settings.
    pub fn new() -> Self {
        let defaults = GlobalSettings::default();
        let settings = DashMap::new();
        for code in SettingCode::ALL {
            settings.insert(code, defaults.get(code));
        }
        Self {
            users: DashMap::new(),
            emails: DashMap::new(),
            posts: DashMap::new(),
            post_tags: DashMap::new(),
            comments: DashMap::new(),
            votes: DashMap::new(),
            captchas: DashMap::new(),
            settings,
            user_ids: Sequence::default(),
            post_ids: Sequence::default(),
            comment_ids: Sequence::default(),
            vote_ids: Sequence::default(),
            captcha_ids: Sequence::default(),
        }
    }

    fn author(&self, user_id: UserId) -> Author {
        match self.users.get(&user_id) {
            Some(u) => Author { id: u.id, name: u.name.clone(), photo: u.photo.clone() },
            None => Author { id: user_id, name: String::new(), photo: None },
        }
    }

    fn vote_count(&self, post_id: PostId, value: VoteValue) -> i64 {
        self.votes
            .iter()
            .filter(|v| v.post_id == post_id && v.value == value)
            .count() as i64
    }

    fn summarize(&self, post: Post) -> PostSummary {
        let id = post.id;
        PostSummary {
            author: self.author(post.author_id),
            likes: self.vote_count(id, VoteValue::Like),
            dislikes: self.vote_count(id, VoteValue::Dislike),
            comments: self.comments.iter().filter(|c| c.post_id == id).count() as i64,
            post,
        }
    }
}
