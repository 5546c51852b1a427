//! Shared dependencies for the forum services.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use agora_common::{AppResult, ForumConfig, IdGenerator, ResponseCacheService};
use agora_db::map_db_err;
use agora_db::repositories::{
    BanRepository, BookmarkRepository, CategoryRepository, ForumRepository, GroupRepository,
    ModerationLogRepository, NotificationRepository, PollRepository, PostRepository,
    ReportRepository, ReputationRepository, SearchIndexRepository, SubscriptionRepository,
    TopicRepository, UserRepository, VoteRepository,
};
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tracing::{debug, warn};

/// Hard cap on any requested page size.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Every repository over one connection.
#[derive(Clone)]
pub struct Repositories {
    pub users: UserRepository,
    pub groups: GroupRepository,
    pub categories: CategoryRepository,
    pub forums: ForumRepository,
    pub topics: TopicRepository,
    pub posts: PostRepository,
    pub votes: VoteRepository,
    pub reputation: ReputationRepository,
    pub moderation_logs: ModerationLogRepository,
    pub reports: ReportRepository,
    pub bans: BanRepository,
    pub subscriptions: SubscriptionRepository,
    pub notifications: NotificationRepository,
    pub search: SearchIndexRepository,
    pub bookmarks: BookmarkRepository,
    pub polls: PollRepository,
}

impl Repositories {
    /// Build every repository over `db`.
    #[must_use]
    pub fn new(db: &Arc<DatabaseConnection>) -> Self {
        Self {
            users: UserRepository::new(db.clone()),
            groups: GroupRepository::new(db.clone()),
            categories: CategoryRepository::new(db.clone()),
            forums: ForumRepository::new(db.clone()),
            topics: TopicRepository::new(db.clone()),
            posts: PostRepository::new(db.clone()),
            votes: VoteRepository::new(db.clone()),
            reputation: ReputationRepository::new(db.clone()),
            moderation_logs: ModerationLogRepository::new(db.clone()),
            reports: ReportRepository::new(db.clone()),
            bans: BanRepository::new(db.clone()),
            subscriptions: SubscriptionRepository::new(db.clone()),
            notifications: NotificationRepository::new(db.clone()),
            search: SearchIndexRepository::new(db.clone()),
            bookmarks: BookmarkRepository::new(db.clone()),
            polls: PollRepository::new(db.clone()),
        }
    }
}

/// Connection, repositories, cache and settings shared by all services.
///
/// Built once at start-up; cloning is cheap.
#[derive(Clone)]
pub struct ForumContext {
    pub db: Arc<DatabaseConnection>,
    pub repos: Repositories,
    pub cache: ResponseCacheService,
    pub config: Arc<ForumConfig>,
    pub id_gen: IdGenerator,
}

impl ForumContext {
    /// Create a context over a connection and cache backend.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, cache: ResponseCacheService, config: ForumConfig) -> Self {
        Self {
            repos: Repositories::new(&db),
            db,
            cache,
            config: Arc::new(config),
            id_gen: IdGenerator::new(),
        }
    }

    /// Start a transaction on the shared connection.
    pub async fn begin(&self) -> AppResult<DatabaseTransaction> {
        self.db.begin().await.map_err(map_db_err)
    }

    /// Clamp a requested page size to the configured default and the hard cap.
    #[must_use]
    pub fn page_size(&self, requested: Option<u64>) -> u64 {
        requested
            .unwrap_or(self.config.page_size)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// One-based page number and clamped page size for a paged read.
    #[must_use]
    pub fn page_window(&self, page: Option<u64>, per_page: Option<u64>) -> (u64, u64) {
        (page.unwrap_or(1).max(1), self.page_size(per_page))
    }

    /// Time-to-live for cached responses.
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.config.cache_ttl_secs)
    }

    /// Drop the cached responses of each resource, all pages included.
    /// Failures are logged and ignored.
    pub async fn invalidate(&self, resources: &[String]) {
        for resource in resources {
            match self.cache.invalidate(resource).await {
                Ok(removed) => debug!(resource = %resource, removed, "Cache invalidated"),
                Err(e) => warn!(resource = %resource, error = %e, "Cache invalidation failed"),
            }
        }
    }

    /// Run `op` again while it fails with a unique-constraint conflict,
    /// up to the configured number of attempts.
    pub async fn retry_on_conflict<T, F, Fut>(&self, what: &str, mut op: F) -> AppResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let attempts = self.config.retry_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Err(e) if e.is_conflict() && attempt < attempts => {
                    debug!(what, attempt, error = %e, "Retrying after conflict");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}
