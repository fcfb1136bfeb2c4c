//! # Domain Models
//!
//! These structs represent the core entities of the blog. They are plain data:
//! persistence adapters map rows into them, services apply the rules, and the
//! mappers in `services` turn them into wire DTOs.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

pub type UserId = i64;
pub type PostId = i64;
pub type CommentId = i64;

/// A registered account. Moderators can review posts and change settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub is_moderator: bool,
    pub reg_time: DateTime<Utc>,
    pub name: String,
    pub email: String,
    /// PHC string produced by the configured `PasswordHasher`.
    pub password_hash: String,
    /// Password recovery code mailed by `/api/auth/restore`.
    pub code: Option<String>,
    /// Public path of the 36x36 avatar
    pub photo: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub reg_time: DateTime<Utc>,
    pub is_moderator: bool,
}

/// Fields a user may change from the profile page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub photo: PhotoChange,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PhotoChange {
    #[default]
    Keep,
    Remove,
    Set(String),
}

/// The slice of a user that is embedded into post and comment responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: UserId,
    pub name: String,
    pub photo: Option<String>,
}

/// Where a post stands in the moderation queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ModerationStatus {
    New,
    Accepted,
    Declined,
}

impl ModerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationStatus::New => "NEW",
            ModerationStatus::Accepted => "ACCEPTED",
            ModerationStatus::Declined => "DECLINED",
        }
    }

    /// Parses the lowercase `status` query used by `/api/post/moderation`.
    /// Anything unrecognised means the accepted list.
    pub fn from_query(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "new" => ModerationStatus::New,
            "declined" => ModerationStatus::Declined,
            _ => ModerationStatus::Accepted,
        }
    }
}

impl fmt::Display for ModerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModerationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(ModerationStatus::New),
            "ACCEPTED" => Ok(ModerationStatus::Accepted),
            "DECLINED" => Ok(ModerationStatus::Declined),
            other => Err(DomainError::Internal(format!(
                "unknown moderation status {other:?}"
            ))),
        }
    }
}

/// A moderator's verdict on a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Decline,
}

impl Decision {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "accept" => Some(Decision::Accept),
            "decline" => Some(Decision::Decline),
            _ => None,
        }
    }

    pub fn status(self) -> ModerationStatus {
        match self {
            Decision::Accept => ModerationStatus::Accepted,
            Decision::Decline => ModerationStatus::Declined,
        }
    }
}

/// A blog post as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub is_active: bool,
    pub moderation_status: ModerationStatus,
    pub moderator_id: Option<UserId>,
    pub author_id: UserId,
    /// Publication time; may lie in the future for scheduled posts.
    pub time: DateTime<Utc>,
    pub title: String,
    pub text: String,
    pub view_count: i64,
}

impl Post {
    /// Visible on the public feed: active, accepted and already due.
    pub fn is_published(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.moderation_status == ModerationStatus::Accepted && self.time <= now
    }
}

/// A post joined with its author and aggregated reactions, the shape every
/// listing query returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostSummary {
    pub post: Post,
    pub author: Author,
    pub likes: i64,
    pub dislikes: i64,
    pub comments: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub author_id: UserId,
    pub is_active: bool,
    pub moderation_status: ModerationStatus,
    pub time: DateTime<Utc>,
    pub title: String,
    pub text: String,
    pub tags: Vec<String>,
}

/// Replacement content for an existing post. Tags are replaced wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostEdit {
    pub is_active: bool,
    pub moderation_status: ModerationStatus,
    pub time: DateTime<Utc>,
    pub title: String,
    pub text: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostComment {
    pub id: CommentId,
    /// Flat reply reference; always a comment of the same post.
    pub parent_id: Option<CommentId>,
    pub post_id: PostId,
    pub author: Author,
    pub time: DateTime<Utc>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub parent_id: Option<CommentId>,
    pub post_id: PostId,
    pub user_id: UserId,
    pub time: DateTime<Utc>,
    pub text: String,
}

/// Direction of a vote, stored as +1 / -1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteValue {
    Like,
    Dislike,
}

impl VoteValue {
    pub fn as_i16(self) -> i16 {
        match self {
            VoteValue::Like => 1,
            VoteValue::Dislike => -1,
        }
    }

    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            1 => Some(VoteValue::Like),
            -1 => Some(VoteValue::Dislike),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostVote {
    pub id: i64,
    pub post_id: PostId,
    pub user_id: UserId,
    pub time: DateTime<Utc>,
    pub value: VoteValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// How many published posts carry a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagUsage {
    pub name: String,
    pub posts: i64,
}

/// A freshly drawn captcha: the code and its PNG picture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptchaImage {
    pub code: String,
    pub png: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptchaCode {
    pub id: i64,
    pub time: DateTime<Utc>,
    /// The code drawn on the picture
    pub code: String,
    /// Token the client echoes back alongside the typed code.
    pub secret_code: String,
}

/// Keys of the `global_settings` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingCode {
    MultiuserMode,
    PostPremoderation,
    StatisticsIsPublic,
}

impl SettingCode {
    pub const ALL: [SettingCode; 3] = [
        SettingCode::MultiuserMode,
        SettingCode::PostPremoderation,
        SettingCode::StatisticsIsPublic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingCode::MultiuserMode => "MULTIUSER_MODE",
            SettingCode::PostPremoderation => "POST_PREMODERATION",
            SettingCode::StatisticsIsPublic => "STATISTICS_IS_PUBLIC",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == code)
    }
}

/// The three site-wide switches, decoded from their `YES`/`NO` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalSettings {
    pub multiuser_mode: bool,
    pub post_premoderation: bool,
    pub statistics_is_public: bool,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            multiuser_mode: true,
            post_premoderation: true,
            statistics_is_public: true,
        }
    }
}

impl GlobalSettings {
    pub fn get(&self, code: SettingCode) -> bool {
        match code {
            SettingCode::MultiuserMode => self.multiuser_mode,
            SettingCode::PostPremoderation => self.post_premoderation,
            SettingCode::StatisticsIsPublic => self.statistics_is_public,
        }
    }

    pub fn set(&mut self, code: SettingCode, enabled: bool) {
        match code {
            SettingCode::MultiuserMode => self.multiuser_mode = enabled,
            SettingCode::PostPremoderation => self.post_premoderation = enabled,
            SettingCode::StatisticsIsPublic => self.statistics_is_public = enabled,
        }
    }

    pub fn encode(enabled: bool) -> &'static str {
        if enabled {
            "YES"
        } else {
            "NO"
        }
    }

    pub fn decode(value: &str) -> bool {
        value.eq_ignore_ascii_case("YES")
    }
}

/// Feed ordering for `/api/post`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostOrder {
    #[default]
    Recent,
    /// Most commented first
    Popular,
    /// Most liked first
    Best,
    Early,
}

impl PostOrder {
    pub fn from_mode(mode: &str) -> Self {
        match mode {
            "popular" => PostOrder::Popular,
            "best" => PostOrder::Best,
            "early" => PostOrder::Early,
            _ => PostOrder::Recent,
        }
    }
}

/// The `status` filter of `/api/post/my`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MyPostsStatus {
    Inactive,
    Pending,
    Declined,
    Published,
}

impl MyPostsStatus {
    pub fn from_query(value: &str) -> Self {
        match value {
            "inactive" => MyPostsStatus::Inactive,
            "pending" => MyPostsStatus::Pending,
            "declined" => MyPostsStatus::Declined,
            _ => MyPostsStatus::Published,
        }
    }

    pub fn matches(&self, post: &Post) -> bool {
        match self {
            MyPostsStatus::Inactive => !post.is_active,
            MyPostsStatus::Pending => {
                post.is_active && post.moderation_status == ModerationStatus::New
            }
            MyPostsStatus::Declined => {
                post.is_active && post.moderation_status == ModerationStatus::Declined
            }
            MyPostsStatus::Published => {
                post.is_active && post.moderation_status == ModerationStatus::Accepted
            }
        }
    }
}

/// Which posts a listing query selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostFilter {
    Published,
    /// Published posts whose title or text contains the query.
    Search(String),
    /// Published posts of one UTC day.
    Date(NaiveDate),
    Tag(String),
    /// Active posts in a status that belong to this moderator or to nobody yet.
    Moderation {
        status: ModerationStatus,
        moderator_id: UserId,
    },
    Authored {
        author_id: UserId,
        status: MyPostsStatus,
    },
}

/// Offset/limit window of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: i64,
    pub limit: i64,
}

impl Page {
    pub const DEFAULT_LIMIT: i64 = 10;
    pub const MAX_LIMIT: i64 = 100;

    pub fn new(offset: i64, limit: i64) -> Self {
        Self {
            offset: offset.max(0),
            limit: limit.clamp(1, Self::MAX_LIMIT),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_LIMIT)
    }
}

/// Aggregates shown on the statistics pages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostStatistics {
    pub posts: i64,
    pub likes: i64,
    pub dislikes: i64,
    pub views: i64,
    pub first_publication: Option<DateTime<Utc>>,
}

/// Number of published posts on one day, for the calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyCount {
    pub day: NaiveDate,
    pub posts: i64,
}
