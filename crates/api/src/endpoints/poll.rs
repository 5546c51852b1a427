//! Poll endpoints.

use agora_common::AppResult;
use agora_db::entities::poll;
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use serde::Deserialize;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Poll vote request.
#[derive(Debug, Deserialize)]
pub struct PollVoteRequest {
    /// Zero-based index into the poll's choices.
    pub choice: i32,
}

/// Vote on a poll.
async fn vote(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
    Path(poll_id): Path<String>,
    Json(req): Json<PollVoteRequest>,
) -> AppResult<ApiResponse<poll::Model>> {
    let poll = state
        .services
        .polls
        .vote(&poll_id, &principal, req.choice)
        .await?;
    Ok(ApiResponse::ok(poll))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/vote", post(vote))
}
