//! Search endpoints.

use agora_common::AppResult;
use agora_core::{SearchInput, SearchResults};
use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};

use crate::{middleware::AppState, response::ApiResponse};

/// Search topics by title, post content and author.
async fn search(
    State(state): State<AppState>,
    Query(input): Query<SearchInput>,
) -> AppResult<ApiResponse<SearchResults>> {
    let results = state.services.search.search(input).await?;
    Ok(ApiResponse::ok(results))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(search))
}
