//! Bookmark endpoints.

use agora_common::AppResult;
use agora_core::BookmarkedTopic;
use axum::{
    Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
};

use super::CursorQuery;
use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, created, ok},
};

/// The caller's bookmarked topics, newest first.
async fn list(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<CursorQuery>,
) -> AppResult<ApiResponse<Vec<BookmarkedTopic>>> {
    let limit = state.services.ctx.page_size(query.limit);
    let bookmarks = state
        .services
        .bookmarks
        .list(&principal, limit, query.until_id.as_deref())
        .await?;
    Ok(ApiResponse::ok(bookmarks))
}

/// Bookmark a topic.
async fn add(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
    Path(topic_id): Path<String>,
) -> AppResult<Response> {
    let bookmark = state.services.bookmarks.add(&principal, &topic_id).await?;
    Ok(created(bookmark))
}

/// Remove a bookmark.
async fn remove(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
    Path(topic_id): Path<String>,
) -> AppResult<Response> {
    state
        .services
        .bookmarks
        .remove(&principal, &topic_id)
        .await?;
    Ok(ok().into_response())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/{topic_id}", post(add).delete(remove))
}
