//! Moderation and admin endpoints.

use agora_common::AppResult;
use agora_core::{ModerationRequest, RecountReport, ReportPage, ReportResolution};
use agora_db::entities::{ban, moderation_log, report, warning};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use super::{CursorQuery, PageQuery};
use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, created},
};

/// A user's moderation record.
#[derive(Serialize)]
pub struct UserRecord {
    pub warnings: Vec<warning::Model>,
    pub active_ban: Option<ban::Model>,
}

/// Resolve request: the resolution with the moderator's note.
#[derive(Debug, Deserialize)]
pub struct ResolveReportRequest {
    #[serde(flatten)]
    pub resolution: ReportResolution,
    pub reason: Option<String>,
}

/// Search index rebuild result.
#[derive(Serialize)]
pub struct RebuildResult {
    pub indexed: u64,
}

/// Apply a moderation action. Returns the audit log entry.
async fn apply(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ModerationRequest>,
) -> AppResult<Response> {
    let entry = state
        .services
        .moderation
        .apply(&principal, req.action, req.reason)
        .await?;
    Ok(created(entry))
}

/// The audit log, newest first.
async fn logs(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<CursorQuery>,
) -> AppResult<ApiResponse<Vec<moderation_log::Model>>> {
    let limit = state.services.ctx.page_size(query.limit);
    let entries = state
        .services
        .moderation
        .logs(&principal, limit, query.until_id.as_deref())
        .await?;
    Ok(ApiResponse::ok(entries))
}

/// Warnings and the active ban for a user.
async fn user_record(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<UserRecord>> {
    let (warnings, active_ban) = state
        .services
        .moderation
        .record_for(&principal, &user_id)
        .await?;
    Ok(ApiResponse::ok(UserRecord {
        warnings,
        active_ban,
    }))
}

/// Recount every counter and reputation total.
async fn recount(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<RecountReport>> {
    let report = state.services.recount.recount_all(&principal).await?;
    Ok(ApiResponse::ok(report))
}

/// Open reports, newest first.
async fn pending_reports(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<ReportPage>> {
    let page = state
        .services
        .reports
        .pending(&principal, query.page, query.per_page)
        .await?;
    Ok(ApiResponse::ok(page))
}

/// Close a report, applying the chosen action.
async fn resolve_report(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
    Path(report_id): Path<String>,
    Json(req): Json<ResolveReportRequest>,
) -> AppResult<ApiResponse<report::Model>> {
    let report = state
        .services
        .reports
        .resolve(&principal, &report_id, req.resolution, req.reason)
        .await?;
    Ok(ApiResponse::ok(report))
}

/// Rebuild the search index from the posts table.
async fn rebuild_search(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<RebuildResult>> {
    let indexed = state
        .services
        .recount
        .rebuild_search_index(&principal)
        .await?;
    Ok(ApiResponse::ok(RebuildResult { indexed }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/moderation", post(apply))
        .route("/moderation/logs", get(logs))
        .route("/moderation/users/{user_id}", get(user_record))
        .route("/moderation/reports", get(pending_reports))
        .route("/moderation/reports/{id}/resolve", post(resolve_report))
        .route("/admin/recount", post(recount))
        .route("/admin/rebuild-search", post(rebuild_search))
}
