//! Everything that is not a post listing or authentication: comments, tags,
//! moderation decisions, the calendar, profiles, statistics, settings and
//! uploads.

use std::sync::Arc;

use domains::{MediaStorage, PasswordHasher};

use crate::dto::BlogInfo;
use crate::Repositories;

mod calendar;
mod comments;
mod media;
mod moderation;
mod profile;
mod settings;
mod statistics;
mod tags;

/// Upload size caps in bytes.
#[derive(Debug, Clone, Copy)]
pub struct MediaLimits {
    pub max_image_bytes: usize,
    pub max_photo_bytes: usize,
}

impl Default for MediaLimits {
    fn default() -> Self {
        Self {
            max_image_bytes: 1024 * 1024,
            max_photo_bytes: 10 * 1024 * 1024,
        }
    }
}

pub struct GeneralService {
    repos: Repositories,
    media: Arc<dyn MediaStorage>,
    hasher: Arc<dyn PasswordHasher>,
    blog: BlogInfo,
    limits: MediaLimits,
}

impl GeneralService {
    pub fn new(
        repos: Repositories,
        media: Arc<dyn MediaStorage>,
        hasher: Arc<dyn PasswordHasher>,
        blog: BlogInfo,
        limits: MediaLimits,
    ) -> Self {
        Self { repos, media, hasher, blog, limits }
    }
}
