//! Forum engine business logic.
//!
//! Services own the multi-step mutations: each one opens a transaction on
//! the shared connection, runs every statement through it and commits, then
//! invalidates the affected cached responses.

pub mod context;
pub mod services;
pub mod slug;

pub use context::{ForumContext, Repositories};
pub use services::*;
