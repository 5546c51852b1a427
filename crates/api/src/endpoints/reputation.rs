//! Reputation endpoints.

use agora_common::AppResult;
use agora_core::{LeaderboardEntry, ReputationSummary};
use axum::{
    Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::Deserialize;

use crate::{middleware::AppState, response::ApiResponse};

/// Leaderboard request.
#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<u64>,
}

/// Reputation, tier, badges and recent history for a user.
async fn summary(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<ReputationSummary>> {
    let summary = state.services.reputation.summary(&user_id).await?;
    Ok(ApiResponse::ok(summary))
}

/// Users ranked by reputation.
async fn leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> AppResult<ApiResponse<Vec<LeaderboardEntry>>> {
    let limit = state.services.ctx.page_size(query.limit);
    let entries = state.services.reputation.leaderboard(limit).await?;
    Ok(ApiResponse::ok(entries))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reputation/{user_id}", get(summary))
        .route("/leaderboard", get(leaderboard))
}
