//! Topic endpoints.

use agora_common::AppResult;
use agora_core::{CreateTopicInput, PostContentInput};
use axum::{
    Json, Router,
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{delete, post},
};

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{created, ok},
};

/// Start a topic.
async fn create_topic(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateTopicInput>,
) -> AppResult<Response> {
    let topic = state.services.topics.create_topic(&principal, input).await?;
    Ok(created(topic))
}

/// Reply to a topic.
async fn reply(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
    Path(topic_id): Path<String>,
    Json(input): Json<PostContentInput>,
) -> AppResult<Response> {
    let post = state
        .services
        .topics
        .reply(&topic_id, &principal, input)
        .await?;
    Ok(created(post))
}

/// Delete a topic with all of its posts.
async fn delete_topic(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
    Path(topic_id): Path<String>,
) -> AppResult<Response> {
    state
        .services
        .topics
        .delete_topic(&topic_id, &principal)
        .await?;
    Ok(ok().into_response())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_topic))
        .route("/{id}", delete(delete_topic))
        .route("/{id}/replies", post(reply))
}
