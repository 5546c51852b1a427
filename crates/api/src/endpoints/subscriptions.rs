//! Subscription endpoints.

use agora_common::{AppError, AppResult};
use agora_db::entities::subscription::{self, SubscriptionScope};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::{get, patch},
};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, created, ok},
};

/// Subscribe request.
#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub scope: SubscriptionScope,
    #[serde(default = "default_notify_replies")]
    pub notify_replies: bool,
}

const fn default_notify_replies() -> bool {
    true
}

/// Settings update request.
#[derive(Debug, Deserialize)]
pub struct SettingsRequest {
    pub notify_replies: bool,
}

/// `?topic_id=` or `?forum_id=` naming what to check.
#[derive(Debug, Deserialize)]
pub struct CheckQuery {
    pub topic_id: Option<String>,
    pub forum_id: Option<String>,
}

impl CheckQuery {
    fn scope(self) -> AppResult<SubscriptionScope> {
        match (self.topic_id, self.forum_id) {
            (Some(id), None) => Ok(SubscriptionScope::Topic(id)),
            (None, Some(id)) => Ok(SubscriptionScope::Forum(id)),
            _ => Err(AppError::InvalidInput(
                "Give exactly one of topic_id or forum_id".to_string(),
            )),
        }
    }
}

/// Whether the caller follows a scope.
#[derive(Debug, Serialize)]
pub struct CheckResult {
    pub subscribed: bool,
    pub subscription: Option<subscription::Model>,
}

/// The caller's subscriptions.
async fn list(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<subscription::Model>>> {
    let subscriptions = state.services.subscriptions.list(&principal).await?;
    Ok(ApiResponse::ok(subscriptions))
}

/// Follow a topic or forum.
async fn subscribe(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<SubscribeRequest>,
) -> AppResult<Response> {
    let subscription = state
        .services
        .subscriptions
        .subscribe(&principal, req.scope, req.notify_replies)
        .await?;
    Ok(created(subscription))
}

/// Stop following a topic or forum.
async fn unsubscribe(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
    Json(scope): Json<SubscriptionScope>,
) -> AppResult<Response> {
    state
        .services
        .subscriptions
        .unsubscribe(&principal, scope)
        .await?;
    Ok(ok().into_response())
}

/// Turn reply notifications on or off for one subscription.
async fn update_settings(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
    Path(subscription_id): Path<String>,
    Json(req): Json<SettingsRequest>,
) -> AppResult<ApiResponse<subscription::Model>> {
    let subscription = state
        .services
        .subscriptions
        .update_settings(&principal, &subscription_id, req.notify_replies)
        .await?;
    Ok(ApiResponse::ok(subscription))
}

/// Whether the caller follows a topic or forum.
async fn check(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<CheckQuery>,
) -> AppResult<ApiResponse<CheckResult>> {
    let scope = query.scope()?;
    let subscription = state
        .services
        .subscriptions
        .check(&principal, &scope)
        .await?;
    Ok(ApiResponse::ok(CheckResult {
        subscribed: subscription.is_some(),
        subscription,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(subscribe).delete(unsubscribe))
        .route("/check", get(check))
        .route("/{id}", patch(update_settings))
}
