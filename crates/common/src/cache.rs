//! Response cache for the forum read endpoints.
//!
//! Read endpoints store rendered JSON under a key naming the resource they
//! render, followed by the normalized page window for paged views. Mutations
//! invalidate a resource with all of its pages once their transaction has
//! committed, so a reader may briefly observe stale counters between a
//! write and its invalidation.
//!
//! Three backends are provided:
//!
//! - [`RedisResponseCache`]: shared across server processes
//! - [`MemoryResponseCache`]: single-process fallback when Redis is not configured
//! - [`NoOpResponseCache`]: never stores anything (tests)

use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use fred::clients::Client as RedisClient;
use fred::interfaces::{KeysInterface, SetsInterface};
use fred::types::Expiration;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Cache key builders for the forum read endpoints.
pub mod keys {
    /// Forum index (categories with their forums).
    pub const FORUM_INDEX: &str = "forum-index";

    /// A single forum with its topic listing.
    #[must_use]
    pub fn forum_view(forum_id: &str) -> String {
        format!("forum/{forum_id}")
    }

    /// A single topic with its posts.
    #[must_use]
    pub fn topic_view(slug: &str) -> String {
        format!("topic/{slug}")
    }

    /// One page of a paged resource. Callers pass the page window after
    /// clamping, so equivalent requests share a key.
    #[must_use]
    pub fn paged(resource: &str, page: u64, per_page: u64) -> String {
        format!("{resource}?page={page}&per_page={per_page}")
    }

    /// The resource a key belongs to.
    #[must_use]
    pub fn resource_of(key: &str) -> &str {
        key.split_once('?').map_or(key, |(resource, _)| resource)
    }
}

/// A cache of rendered responses.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// Fetch a cached body.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Store a body for `ttl`.
    async fn set(&self, key: &str, body: &str, ttl: Duration) -> AppResult<()>;

    /// Drop the entries of `resource` and all of its pages. Returns the
    /// number removed.
    async fn invalidate(&self, resource: &str) -> AppResult<u64>;
}

/// Shared handle to the configured cache backend.
pub type ResponseCacheService = Arc<dyn ResponseCache>;

/// Cache that stores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpResponseCache;

#[async_trait]
impl ResponseCache for NoOpResponseCache {
    async fn get(&self, _key: &str) -> AppResult<Option<String>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _body: &str, _ttl: Duration) -> AppResult<()> {
        Ok(())
    }

    async fn invalidate(&self, _resource: &str) -> AppResult<u64> {
        Ok(0)
    }
}

/// In-process cache with per-entry expiry.
#[derive(Debug, Default)]
pub struct MemoryResponseCache {
    entries: RwLock<HashMap<String, (String, Instant)>>,
}

impl MemoryResponseCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResponseCache for MemoryResponseCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|(_, expires_at)| *expires_at > Instant::now())
            .map(|(body, _)| body.clone()))
    }

    async fn set(&self, key: &str, body: &str, ttl: Duration) -> AppResult<()> {
        let mut entries = self.entries.write().await;
        let now = Instant::now();
        entries.retain(|_, (_, expires_at)| *expires_at > now);
        entries.insert(key.to_string(), (body.to_string(), now + ttl));
        Ok(())
    }

    async fn invalidate(&self, resource: &str) -> AppResult<u64> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| keys::resource_of(key) != resource);
        let removed = (before - entries.len()) as u64;
        debug!(resource = %resource, removed, "Invalidated cached responses");
        Ok(removed)
    }
}

/// Redis-backed cache.
///
/// Every stored key is also recorded in an index set per resource so
/// invalidation never needs a keyspace scan. An index set expires with the
/// newest entry it lists.
#[derive(Clone)]
pub struct RedisResponseCache {
    redis: Arc<RedisClient>,
    prefix: String,
}

impl RedisResponseCache {
    /// Create a cache whose Redis keys start with `prefix`.
    #[must_use]
    pub fn new(redis: Arc<RedisClient>, prefix: impl Into<String>) -> Self {
        Self {
            redis,
            prefix: prefix.into(),
        }
    }

    fn entry_key(&self, key: &str) -> String {
        format!("{}:response:{key}", self.prefix)
    }

    fn index_key(&self, resource: &str) -> String {
        format!("{}:response-index:{resource}", self.prefix)
    }
}

fn redis_err(e: impl std::fmt::Display) -> AppError {
    AppError::Cache(e.to_string())
}

#[async_trait]
impl ResponseCache for RedisResponseCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let body: Option<String> = self
            .redis
            .get(self.entry_key(key))
            .await
            .map_err(redis_err)?;
        debug!(key = %key, hit = body.is_some(), "Response cache lookup");
        Ok(body)
    }

    async fn set(&self, key: &str, body: &str, ttl: Duration) -> AppResult<()> {
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX).max(1);
        let index = self.index_key(keys::resource_of(key));
        self.redis
            .set::<(), _, _>(
                self.entry_key(key),
                body,
                Some(Expiration::EX(ttl_secs)),
                None,
                false,
            )
            .await
            .map_err(redis_err)?;
        self.redis
            .sadd::<(), _, _>(index.clone(), key)
            .await
            .map_err(redis_err)?;
        self.redis
            .expire::<(), _>(index, ttl_secs, None)
            .await
            .map_err(redis_err)?;
        Ok(())
    }

    async fn invalidate(&self, resource: &str) -> AppResult<u64> {
        let index = self.index_key(resource);
        let indexed: Vec<String> = self
            .redis
            .smembers(index.clone())
            .await
            .map_err(redis_err)?;
        if indexed.is_empty() {
            return Ok(0);
        }

        let entry_keys: Vec<String> = indexed.iter().map(|k| self.entry_key(k)).collect();
        let removed: i64 = self.redis.del(entry_keys).await.map_err(redis_err)?;
        self.redis
            .srem::<(), _, _>(index, indexed)
            .await
            .map_err(redis_err)?;

        debug!(resource = %resource, removed, "Invalidated cached responses");
        Ok(u64::try_from(removed).unwrap_or(0))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_keys() {
        assert_eq!(keys::forum_view("5"), "forum/5");
        assert_eq!(keys::topic_view("hello-world-1"), "topic/hello-world-1");
        assert_eq!(keys::paged("forum/5", 2, 20), "forum/5?page=2&per_page=20");
        assert_eq!(keys::resource_of("forum/5?page=2&per_page=20"), "forum/5");
        assert_eq!(keys::resource_of(keys::FORUM_INDEX), keys::FORUM_INDEX);
    }

    #[tokio::test]
    async fn test_memory_cache_resource_invalidation() {
        let cache = MemoryResponseCache::new();
        let ttl = Duration::from_secs(60);
        let first = keys::paged(&keys::forum_view("5"), 1, 20);
        let second = keys::paged(&keys::forum_view("5"), 2, 20);
        let other = keys::paged(&keys::forum_view("50"), 1, 20);
        cache.set(keys::FORUM_INDEX, "index", ttl).await.unwrap();
        cache.set(&first, "forum 5 p1", ttl).await.unwrap();
        cache.set(&second, "forum 5 p2", ttl).await.unwrap();
        cache.set(&other, "forum 50 p1", ttl).await.unwrap();
        cache.set(&keys::topic_view("t"), "topic", ttl).await.unwrap();

        let removed = cache.invalidate(&keys::forum_view("5")).await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(cache.get(&second).await.unwrap(), None);
        assert_eq!(cache.get(&other).await.unwrap().as_deref(), Some("forum 50 p1"));
        assert_eq!(
            cache.get(keys::FORUM_INDEX).await.unwrap().as_deref(),
            Some("index")
        );

        let removed = cache.invalidate(keys::FORUM_INDEX).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(
            cache.get(&keys::topic_view("t")).await.unwrap().as_deref(),
            Some("topic")
        );
    }

    #[tokio::test]
    async fn test_memory_cache_expiry() {
        let cache = MemoryResponseCache::new();
        cache.set("/k", "v", Duration::ZERO).await.unwrap();
        assert_eq!(cache.get("/k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_noop_cache() {
        let cache = NoOpResponseCache;
        cache.set("/k", "v", Duration::from_secs(1)).await.unwrap();
        assert_eq!(cache.get("/k").await.unwrap(), None);
        assert_eq!(cache.invalidate("/").await.unwrap(), 0);
    }
}
