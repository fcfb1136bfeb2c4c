//! # api-adapters
//!
//! The HTTP face of the blog: an axum router over the services, session
//! cookie extractors, error mapping and request metrics.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use metrics::HttpMetrics;
pub use router::{build_router, RouterOptions};
pub use state::AppState;
