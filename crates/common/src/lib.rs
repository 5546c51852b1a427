//! Common utilities and shared types for the Agora forum engine.
//!
//! This crate provides foundational components used across all agora crates:
//!
//! - **Configuration**: Application and forum settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Response Cache**: Path-keyed cache with prefix invalidation via [`ResponseCache`]
//!
//! # Example
//!
//! ```no_run
//! use agora_common::{AppResult, Config, IdGenerator};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     println!("{} listening on {}", id_gen.generate(), config.server.port);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod id;

pub use cache::{
    MemoryResponseCache, NoOpResponseCache, RedisResponseCache, ResponseCache,
    ResponseCacheService,
};
pub use config::{Config, ForumConfig, ForumFanout, PermissionDefault};
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
