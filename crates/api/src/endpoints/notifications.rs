//! Notification endpoints.

use agora_common::AppResult;
use agora_core::NotificationPage;
use axum::{
    Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, ok},
};

/// List notifications request.
#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    pub limit: Option<u64>,
    /// Cursor for pagination (before this ID)
    pub until_id: Option<String>,
    #[serde(default)]
    pub unread_only: bool,
}

/// Mark-all-read response.
#[derive(Serialize)]
pub struct MarkedRead {
    pub marked: u64,
}

/// The caller's notifications with the unread count.
async fn list(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListNotificationsQuery>,
) -> AppResult<ApiResponse<NotificationPage>> {
    let limit = state.services.ctx.page_size(query.limit);
    let page = state
        .services
        .notifications
        .list(
            &principal.user_id,
            limit,
            query.until_id.as_deref(),
            query.unread_only,
        )
        .await?;
    Ok(ApiResponse::ok(page))
}

/// Mark one notification read.
async fn mark_read(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
    Path(notification_id): Path<String>,
) -> AppResult<Response> {
    state
        .services
        .notifications
        .mark_read(&principal.user_id, &notification_id)
        .await?;
    Ok(ok().into_response())
}

/// Mark every notification read.
async fn mark_all_read(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<MarkedRead>> {
    let marked = state
        .services
        .notifications
        .mark_all_read(&principal.user_id)
        .await?;
    Ok(ApiResponse::ok(MarkedRead { marked }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/read-all", post(mark_all_read))
        .route("/{id}/read", post(mark_read))
}
