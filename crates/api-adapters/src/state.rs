use std::sync::Arc;

use services::{AuthService, GeneralService, PostService};

use crate::metrics::HttpMetrics;

/// Shared by every handler; cloning only bumps reference counts.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<PostService>,
    pub general: Arc<GeneralService>,
    pub auth: Arc<AuthService>,
    pub metrics: Arc<HttpMetrics>,
}

impl AppState {
    pub fn new(posts: PostService, general: GeneralService, auth: AuthService) -> Self {
        Self {
            posts: Arc::new(posts),
            general: Arc::new(general),
            auth: Arc::new(auth),
            metrics: Arc::new(HttpMetrics::new()),
        }
    }
}
