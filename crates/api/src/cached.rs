//! Cached JSON responses for the read endpoints.

use std::future::Future;

use agora_common::{AppError, AppResult};
use axum::{
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::warn;

use crate::{middleware::AppState, response::ApiResponse};

/// Header telling clients whether the body came from the cache.
pub const CACHE_STATUS_HEADER: &str = "x-cache";

fn json_body(body: String, status: &'static str) -> Response {
    let mut response = ([(header::CONTENT_TYPE, "application/json")], body).into_response();
    response
        .headers_mut()
        .insert(CACHE_STATUS_HEADER, HeaderValue::from_static(status));
    response
}

/// Serve the body stored under `key`, or render, store and serve it.
/// Cache failures degrade to rendering.
pub async fn cached_json<T, F, Fut>(state: &AppState, key: String, render: F) -> AppResult<Response>
where
    T: Serialize,
    F: FnOnce() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let ctx = &state.services.ctx;

    match ctx.cache.get(&key).await {
        Ok(Some(body)) => return Ok(json_body(body, "HIT")),
        Ok(None) => {}
        Err(e) => warn!(key = %key, error = %e, "Response cache read failed"),
    }

    let data = render().await?;
    let body = serde_json::to_string(&ApiResponse::ok(data))
        .map_err(|e| AppError::Internal(e.to_string()))?;

    if let Err(e) = ctx.cache.set(&key, &body, ctx.cache_ttl()).await {
        warn!(key = %key, error = %e, "Response cache write failed");
    }

    Ok(json_body(body, "MISS"))
}
