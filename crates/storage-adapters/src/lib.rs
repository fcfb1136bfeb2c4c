//! # storage-adapters
//!
//! Concrete implementations of the persistence and media ports.
//!
//! * `postgres`: sqlx/Postgres repositories with embedded migrations
//!   (feature `db-postgres`, on by default).
//! * `memory`: a process-local store implementing every repository port,
//!   used for development runs and the integration tests.
//! * `media`: local filesystem uploads with sharded directories.

pub mod media;
pub mod memory;

#[cfg(feature = "db-postgres")]
pub mod postgres;

pub use media::local::LocalMediaStore;
pub use memory::MemoryStore;

#[cfg(feature = "db-postgres")]
pub use postgres::PgStore;
