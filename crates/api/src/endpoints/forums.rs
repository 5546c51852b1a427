//! Forum browsing endpoints. Responses are cached per resource and page.

use agora_common::{AppResult, cache::keys};
use axum::{
    Router,
    extract::{Path, Query, State},
    response::Response,
    routing::get,
};

use super::PageQuery;
use crate::{cached::cached_json, middleware::AppState};

/// Categories with their forums.
async fn index(State(state): State<AppState>) -> AppResult<Response> {
    let topics = &state.services.topics;
    cached_json(&state, keys::FORUM_INDEX.to_string(), || topics.forum_index()).await
}

/// A forum with one page of topics.
async fn show_forum(
    State(state): State<AppState>,
    Path(forum_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Response> {
    let (page, per_page) = state.services.ctx.page_window(query.page, query.per_page);
    let key = keys::paged(&keys::forum_view(&forum_id), page, per_page);
    let topics = &state.services.topics;
    cached_json(&state, key, || {
        topics.forum_view(&forum_id, Some(page), Some(per_page))
    })
    .await
}

/// A topic with one page of posts. Every request counts as a view, cached
/// or not.
async fn show_topic(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Response> {
    let topics = &state.services.topics;
    topics.record_view(&slug).await?;

    let (page, per_page) = state.services.ctx.page_window(query.page, query.per_page);
    let key = keys::paged(&keys::topic_view(&slug), page, per_page);
    cached_json(&state, key, || {
        topics.view_topic(&slug, Some(page), Some(per_page))
    })
    .await
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/forum/{id}", get(show_forum))
        .route("/topic/{slug}", get(show_topic))
}
