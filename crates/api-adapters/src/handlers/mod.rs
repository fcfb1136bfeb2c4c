pub mod auth;
pub mod general;
pub mod post;
