//! Counter repair.
//!
//! Denormalized counters and last-post pointers are maintained
//! incrementally by every write. Recounting derives them again from the
//! rows themselves and is the authoritative fix for any drift.

use agora_common::cache::keys;
use agora_common::{AppError, AppResult};
use agora_db::map_db_err;
use serde::Serialize;
use tracing::info;

use crate::context::ForumContext;
use crate::services::authorization::Principal;
use crate::services::reputation::ReputationService;
use crate::services::search::SearchService;
use crate::services::topic::{TopicService, clamp_count};

/// What a full recount touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecountReport {
    pub forums: usize,
    pub topics: usize,
    pub users: usize,
}

/// Recount service.
#[derive(Clone)]
pub struct RecountService {
    ctx: ForumContext,
    topics: TopicService,
    reputation: ReputationService,
    search: SearchService,
}

impl RecountService {
    /// Create a new recount service.
    #[must_use]
    pub const fn new(
        ctx: ForumContext,
        topics: TopicService,
        reputation: ReputationService,
        search: SearchService,
    ) -> Self {
        Self {
            ctx,
            topics,
            reputation,
            search,
        }
    }

    /// Re-derive a topic's reply count and last-post pointer.
    pub async fn recount_topic(&self, topic_id: &str) -> AppResult<()> {
        let repos = &self.ctx.repos;
        let txn = self.ctx.begin().await?;

        let topic = repos.topics.get_by_id(&txn, topic_id).await?;
        let live = repos.posts.count_live_in_topic(&txn, topic_id).await?;
        repos
            .topics
            .set_replies(&txn, topic_id, clamp_count(live.saturating_sub(1)))
            .await?;
        self.topics
            .refresh_pointers(&txn, topic_id, &topic.forum_id)
            .await?;

        txn.commit().await.map_err(map_db_err)?;
        self.ctx.invalidate(&[keys::topic_view(&topic.slug)]).await;
        Ok(())
    }

    /// Re-derive a forum's topic and post counts and last-post pointer.
    pub async fn recount_forum(&self, forum_id: &str) -> AppResult<()> {
        let repos = &self.ctx.repos;
        let txn = self.ctx.begin().await?;

        repos.forums.get_by_id(&txn, forum_id).await?;
        let topics = repos.topics.count_by_forum(&txn, forum_id).await?;
        let posts = repos.posts.count_live_in_forum(&txn, forum_id).await?;
        repos
            .forums
            .set_counts(&txn, forum_id, clamp_count(topics), clamp_count(posts))
            .await?;
        self.topics.refresh_forum_pointer(&txn, forum_id).await?;

        txn.commit().await.map_err(map_db_err)?;
        self.ctx
            .invalidate(&[keys::FORUM_INDEX.to_string(), keys::forum_view(forum_id)])
            .await;
        Ok(())
    }

    /// Set a user's cached reputation to the sum of their ledger and award
    /// any badge the total has reached. Returns the total.
    pub async fn recount_user_reputation(&self, user_id: &str) -> AppResult<i32> {
        let repos = &self.ctx.repos;
        let txn = self.ctx.begin().await?;

        repos.users.get_by_id(&txn, user_id).await?;
        let sum = repos.reputation.sum_for_user(&txn, user_id).await?;
        let total = i32::try_from(sum)
            .unwrap_or(if sum < 0 { i32::MIN } else { i32::MAX });
        repos.users.set_reputation(&txn, user_id, total).await?;
        self.reputation.award_badges(&txn, user_id, total).await?;

        txn.commit().await.map_err(map_db_err)?;
        Ok(total)
    }

    /// Recount every topic, forum and user. Admins only.
    pub async fn recount_all(&self, principal: &Principal) -> AppResult<RecountReport> {
        ensure_admin(principal)?;

        let repos = &self.ctx.repos;
        let mut report = RecountReport::default();

        for forum_id in repos.forums.all_ids().await? {
            let topic_ids = repos
                .topics
                .ids_by_forum(self.ctx.db.as_ref(), &forum_id)
                .await?;
            for topic_id in &topic_ids {
                self.recount_topic(topic_id).await?;
            }
            report.topics += topic_ids.len();

            self.recount_forum(&forum_id).await?;
            report.forums += 1;
        }

        for user_id in repos.users.all_ids().await? {
            self.recount_user_reputation(&user_id).await?;
            report.users += 1;
        }

        info!(
            forums = report.forums,
            topics = report.topics,
            users = report.users,
            requested_by = %principal.user_id,
            "Recount finished"
        );
        Ok(report)
    }

    /// Rebuild the search index from the posts table in one transaction.
    /// Admins only. Returns the number of posts indexed.
    pub async fn rebuild_search_index(&self, principal: &Principal) -> AppResult<u64> {
        ensure_admin(principal)?;

        let txn = self.ctx.begin().await?;
        let indexed = self.search.rebuild(&txn).await?;
        txn.commit().await.map_err(map_db_err)?;

        info!(indexed, requested_by = %principal.user_id, "Search index rebuilt");
        Ok(indexed)
    }
}

fn ensure_admin(principal: &Principal) -> AppResult<()> {
    if !principal.is_admin() {
        return Err(AppError::Forbidden("Admin privileges required".to_string()));
    }
    Ok(())
}
