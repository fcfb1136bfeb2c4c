//! # auth-adapters
//!
//! Concrete implementations of the identity ports: Argon2 password hashing,
//! the in-process session map, captcha pictures and outgoing mail.

pub mod captcha;
pub mod mailer;
pub mod password;
pub mod session;

pub use captcha::DistortedCaptcha;
pub use mailer::LogMailer;
#[cfg(feature = "mail-smtp")]
pub use mailer::SmtpMailer;
pub use password::Argon2Hasher;
pub use session::MemorySessionStore;
