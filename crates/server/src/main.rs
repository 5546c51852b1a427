//! Agora server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use agora_api::AppState;
use agora_common::{
    Config, MemoryResponseCache, RedisResponseCache, ResponseCacheService, config::RedisConfig,
};
use agora_core::{ForumContext, ForumServices};
use fred::prelude::*;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 256 * 1024;

/// Per-request time limit.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Shared Redis cache when configured, in-process cache otherwise.
async fn response_cache(
    redis: Option<&RedisConfig>,
) -> Result<ResponseCacheService, Box<dyn std::error::Error>> {
    let Some(redis) = redis else {
        info!("Redis not configured, using in-memory response cache");
        return Ok(Arc::new(MemoryResponseCache::new()));
    };

    let fred_config = fred::types::config::Config::from_url(&redis.url)?;
    let client = fred::clients::Client::new(fred_config, None, None, None);
    client.init().await?;
    info!("Connected to Redis response cache");

    Ok(Arc::new(RedisResponseCache::new(
        Arc::new(client),
        redis.prefix.clone(),
    )))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agora=info,tower_http=info".into()),
        )
        .init();

    info!("Starting agora server...");

    let config = Config::load()?;

    let db = Arc::new(agora_db::init(&config).await?);
    info!("Connected to database");

    info!("Running database migrations...");
    agora_db::migrate(&db).await?;
    info!("Migrations completed");

    let cache = response_cache(config.redis.as_ref()).await?;
    let ctx = ForumContext::new(db.clone(), cache, config.forum.clone());
    let state = AppState::new(ForumServices::new(ctx));

    let app = agora_api::app(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    match Arc::try_unwrap(db) {
        Ok(db) => db.close().await?,
        Err(_) => warn!("Database connection still shared at shutdown"),
    }

    info!("Server shutdown complete");
    Ok(())
}
