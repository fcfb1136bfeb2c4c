//! # Core Traits (Ports)
//!
//! Every adapter must implement these traits to be wired into the binary.
//! Services only ever see `Arc<dyn Port>`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::Result;
use crate::models::{
    CaptchaCode, CaptchaImage, CommentId, DailyCount, GlobalSettings, ModerationStatus,
    NewComment, NewPost, NewUser, Page, PostComment, PostEdit, PostFilter, PostId, PostOrder,
    PostStatistics, PostSummary, PostVote, ProfileUpdate, TagUsage, User, UserId, VoteValue,
};

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

/// Account persistence.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    /// Looks a user up by password recovery code.
    async fn find_by_code(&self, code: &str) -> Result<Option<User>>;
    async fn insert(&self, user: NewUser) -> Result<User>;
    async fn update_profile(&self, id: UserId, update: ProfileUpdate) -> Result<()>;
    async fn set_code(&self, id: UserId, code: Option<String>) -> Result<()>;
    async fn update_password(&self, id: UserId, password_hash: &str) -> Result<()>;
}

/// Post persistence, including the listing queries and aggregates.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn list(
        &self,
        filter: &PostFilter,
        order: PostOrder,
        page: Page,
        now: DateTime<Utc>,
    ) -> Result<Vec<PostSummary>>;

    async fn count(&self, filter: &PostFilter, now: DateTime<Utc>) -> Result<i64>;

    /// Loads a post regardless of its status.
    async fn find(&self, id: PostId) -> Result<Option<PostSummary>>;

    /// Inserts the post and links its tags (creating missing ones) atomically.
    async fn insert(&self, post: NewPost) -> Result<PostId>;

    /// Replaces the post content and its tag set atomically.
    async fn update(&self, id: PostId, edit: PostEdit) -> Result<()>;

    async fn moderate(
        &self,
        id: PostId,
        status: ModerationStatus,
        moderator_id: UserId,
    ) -> Result<()>;

    async fn increment_views(&self, id: PostId) -> Result<()>;

    /// Aggregates over published posts, optionally of one author.
    async fn statistics(
        &self,
        author_id: Option<UserId>,
        now: DateTime<Utc>,
    ) -> Result<PostStatistics>;

    /// Distinct years that have published posts, ascending.
    async fn publication_years(&self, now: DateTime<Utc>) -> Result<Vec<i32>>;

    async fn daily_counts(&self, year: i32, now: DateTime<Utc>) -> Result<Vec<DailyCount>>;

    /// NEW active posts assigned to the moderator or to nobody.
    async fn count_awaiting_moderation(&self, moderator_id: UserId) -> Result<i64>;
}

#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Comments of a post, oldest first.
    async fn list_for_post(&self, post_id: PostId) -> Result<Vec<PostComment>>;
    async fn find(&self, id: CommentId) -> Result<Option<PostComment>>;
    async fn insert(&self, comment: NewComment) -> Result<CommentId>;
}

#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait VoteRepository: Send + Sync {
    async fn find(&self, post_id: PostId, user_id: UserId) -> Result<Option<PostVote>>;
    async fn insert(
        &self,
        post_id: PostId,
        user_id: UserId,
        value: VoteValue,
        time: DateTime<Utc>,
    ) -> Result<()>;
    async fn update(&self, id: i64, value: VoteValue, time: DateTime<Utc>) -> Result<()>;
    async fn delete(&self, id: i64) -> Result<()>;
}

#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Tags starting with `prefix` and the number of published posts using them.
    /// Tags without published posts are omitted.
    async fn usage(&self, prefix: &str, now: DateTime<Utc>) -> Result<Vec<TagUsage>>;
    async fn names_for_post(&self, post_id: PostId) -> Result<Vec<String>>;
}

#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait CaptchaRepository: Send + Sync {
    async fn insert(&self, code: &str, secret_code: &str, time: DateTime<Utc>) -> Result<()>;
    async fn find_by_secret(&self, secret_code: &str) -> Result<Option<CaptchaCode>>;
    /// Drops a code once it has been spent.
    async fn delete_by_secret(&self, secret_code: &str) -> Result<()>;
    /// Removes codes created before `cutoff`; returns how many went away.
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}

#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn load(&self) -> Result<GlobalSettings>;
    async fn store(&self, settings: GlobalSettings) -> Result<()>;
}

/// In-process map from session id to the logged-in user.
#[cfg_attr(any(test, feature = "testing"), automock)]
pub trait SessionStore: Send + Sync {
    fn bind(&self, session_id: &str, user_id: UserId);
    /// `None` for unknown and expired sessions.
    fn resolve(&self, session_id: &str) -> Option<UserId>;
    fn revoke(&self, session_id: &str);
    /// Drops expired sessions; returns how many went away.
    fn sweep(&self) -> usize;
}

#[cfg_attr(any(test, feature = "testing"), automock)]
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String>;
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Outgoing mail, used for password recovery links.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

/// Upload storage. Returned strings are public paths.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Stores an image attached to a post and returns its public path.
    async fn save_image(&self, data: Vec<u8>, extension: &str) -> Result<String>;
    /// Crops, scales and stores a profile photo; returns its public path.
    async fn save_avatar(&self, user_id: UserId, data: Vec<u8>) -> Result<String>;
}

/// Produces captcha codes and their pictures.
#[cfg_attr(any(test, feature = "testing"), automock)]
pub trait CaptchaGenerator: Send + Sync {
    fn generate(&self) -> Result<CaptchaImage>;
}
