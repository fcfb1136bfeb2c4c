//! # services
//!
//! Business rules of the blog. Each service owns a handful of ports and turns
//! repository results into the DTOs the web layer serializes.

use std::sync::Arc;

use domains::{
    CaptchaRepository, CommentRepository, PostRepository, SettingsRepository, TagRepository,
    UserRepository, VoteRepository,
};

pub mod auth_service;
pub mod dto;
pub mod general;
pub mod mappers;
pub mod post_service;
pub mod secrets;
pub mod validation;

#[cfg(test)]
mod testing;

pub use auth_service::{AuthOptions, AuthService};
pub use general::{GeneralService, MediaLimits};
pub use post_service::PostService;

/// Every repository port, bundled so services can be built from one value.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub votes: Arc<dyn VoteRepository>,
    pub tags: Arc<dyn TagRepository>,
    pub captchas: Arc<dyn CaptchaRepository>,
    pub settings: Arc<dyn SettingsRepository>,
}

impl Repositories {
    /// Every port served by one store (Postgres or in-memory).
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: UserRepository
            + PostRepository
            + CommentRepository
            + VoteRepository
            + TagRepository
            + CaptchaRepository
            + SettingsRepository
            + 'static,
    {
        Self {
            users: store.clone(),
            posts: store.clone(),
            comments: store.clone(),
            votes: store.clone(),
            tags: store.clone(),
            captchas: store.clone(),
            settings: store,
        }
    }
}
