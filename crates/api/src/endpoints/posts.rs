//! Post endpoints.

use agora_common::AppResult;
use agora_core::{FileReportInput, PostContentInput, VoteSummary};
use agora_db::entities::{post, post_vote::VoteType};
use axum::{
    Json, Router,
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{patch, post},
};
use serde::Deserialize;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, created, ok},
};

/// Report request.
#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    pub reason: String,
}

/// Vote request.
#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    #[serde(rename = "type")]
    pub vote_type: VoteType,
}

/// Replace a post's content.
async fn edit_post(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Json(input): Json<PostContentInput>,
) -> AppResult<ApiResponse<post::Model>> {
    let post = state
        .services
        .topics
        .edit_post(&post_id, &principal, input)
        .await?;
    Ok(ApiResponse::ok(post))
}

/// Soft-delete a post.
async fn delete_post(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> AppResult<Response> {
    state
        .services
        .topics
        .soft_delete_post(&post_id, &principal)
        .await?;
    Ok(ok().into_response())
}

/// Press the up or down button on a post.
async fn vote(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Json(req): Json<VoteRequest>,
) -> AppResult<ApiResponse<VoteSummary>> {
    let summary = state
        .services
        .votes
        .vote(&post_id, &principal, req.vote_type)
        .await?;
    Ok(ApiResponse::ok(summary))
}

/// Report a post to the moderators.
async fn report(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Json(req): Json<ReportRequest>,
) -> AppResult<Response> {
    let report = state
        .services
        .reports
        .file(
            &principal,
            FileReportInput {
                post_id,
                reason: req.reason,
            },
        )
        .await?;
    Ok(created(report))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", patch(edit_post).delete(delete_post))
        .route("/{id}/vote", post(vote))
        .route("/{id}/report", post(report))
}
