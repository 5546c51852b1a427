//! API endpoints, mounted under `/api/forum`.

#![allow(missing_docs)]

mod bookmarks;
mod forums;
mod moderation;
mod notifications;
mod poll;
mod posts;
mod reputation;
mod search;
mod subscriptions;
mod topics;

use axum::Router;
use serde::Deserialize;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(forums::router())
        .merge(reputation::router())
        .nest("/topics", topics::router())
        .nest("/posts", posts::router())
        .nest("/polls", poll::router())
        .nest("/search", search::router())
        .nest("/subscriptions", subscriptions::router())
        .nest("/bookmarks", bookmarks::router())
        .nest("/notifications", notifications::router())
        .merge(moderation::router())
}

/// `?page=&per_page=` for paged views.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// `?limit=&until_id=` for cursor listings.
#[derive(Debug, Default, Deserialize)]
pub struct CursorQuery {
    pub limit: Option<u64>,
    pub until_id: Option<String>,
}
