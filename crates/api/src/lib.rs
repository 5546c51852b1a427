//! HTTP API layer for the Agora forum engine.
//!
//! This crate exposes the forum services over JSON:
//!
//! - **Endpoints**: forum browsing, posting, voting, moderation
//! - **Extractors**: bearer-token principal resolution
//! - **Response cache**: rendered read endpoints keyed by resource and query
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod cached;
pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};

use axum::Router;

/// Forum routes under `/api/forum`, behind the authentication middleware.
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/api/forum", router())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
}
