//! API middleware.

use agora_core::ForumServices;
use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    /// Every forum service.
    pub services: ForumServices,
}

impl AppState {
    /// Wrap the service bundle.
    #[must_use]
    pub const fn new(services: ForumServices) -> Self {
        Self { services }
    }
}

fn bearer_token(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authentication middleware.
///
/// Resolves the bearer token into a [`Principal`](agora_core::Principal)
/// stored in the request extensions. Unknown tokens leave the request
/// anonymous; handlers that need a user reject it through
/// [`AuthUser`](crate::extractors::AuthUser).
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(&req) {
        match state.services.auth.resolve_principal(token).await {
            Ok(Some(principal)) => {
                req.extensions_mut().insert(principal);
            }
            Ok(None) => debug!("Unknown bearer token"),
            Err(e) => return e.into_response(),
        }
    }

    next.run(req).await
}
