//! Topic and forum subscriptions.

use agora_common::{AppError, AppResult};
use agora_db::entities::subscription::{self, SubscriptionScope};
use chrono::Utc;
use sea_orm::Set;
use tracing::debug;

use crate::context::ForumContext;
use crate::services::authorization::Principal;

/// Subscription service.
#[derive(Clone)]
pub struct SubscriptionService {
    ctx: ForumContext,
}

impl SubscriptionService {
    /// Create a new subscription service.
    #[must_use]
    pub const fn new(ctx: ForumContext) -> Self {
        Self { ctx }
    }

    /// Follow a topic or forum.
    pub async fn subscribe(
        &self,
        principal: &Principal,
        scope: SubscriptionScope,
        notify_replies: bool,
    ) -> AppResult<subscription::Model> {
        principal.ensure_not_banned()?;
        self.ensure_target_exists(&scope).await?;

        let repo = &self.ctx.repos.subscriptions;
        let conn = self.ctx.db.as_ref();
        if repo.find(conn, &principal.user_id, &scope).await?.is_some() {
            return Err(AppError::Conflict("Already subscribed".to_string()));
        }

        let (topic_id, forum_id) = match &scope {
            SubscriptionScope::Topic(id) => (Some(id.clone()), None),
            SubscriptionScope::Forum(id) => (None, Some(id.clone())),
        };

        repo.create(
            conn,
            subscription::ActiveModel {
                id: Set(self.ctx.id_gen.generate()),
                user_id: Set(principal.user_id.clone()),
                topic_id: Set(topic_id),
                forum_id: Set(forum_id),
                notify_replies: Set(notify_replies),
                created_at: Set(Utc::now().into()),
            },
        )
        .await
    }

    /// Stop following a topic or forum.
    pub async fn unsubscribe(&self, principal: &Principal, scope: SubscriptionScope) -> AppResult<()> {
        self.ensure_target_exists(&scope).await?;

        let removed = self
            .ctx
            .repos
            .subscriptions
            .delete(self.ctx.db.as_ref(), &principal.user_id, &scope)
            .await?;
        if !removed {
            return Err(AppError::NotFound("Subscription".to_string()));
        }
        Ok(())
    }

    /// Change whether a subscription sends reply notifications. Only the
    /// owner may change it.
    pub async fn update_settings(
        &self,
        principal: &Principal,
        subscription_id: &str,
        notify_replies: bool,
    ) -> AppResult<subscription::Model> {
        let repo = &self.ctx.repos.subscriptions;
        let conn = self.ctx.db.as_ref();

        let existing = repo
            .find_by_id(conn, subscription_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Subscription".to_string()))?;
        if existing.user_id != principal.user_id {
            return Err(AppError::Forbidden("Not your subscription".to_string()));
        }

        let updated = repo
            .set_notify_replies(conn, subscription_id, notify_replies)
            .await?;
        debug!(subscription_id, notify_replies, "Subscription settings updated");
        Ok(updated)
    }

    /// The principal's subscription to a scope, if any.
    pub async fn check(
        &self,
        principal: &Principal,
        scope: &SubscriptionScope,
    ) -> AppResult<Option<subscription::Model>> {
        self.ctx
            .repos
            .subscriptions
            .find(self.ctx.db.as_ref(), &principal.user_id, scope)
            .await
    }

    /// The principal's subscriptions.
    pub async fn list(&self, principal: &Principal) -> AppResult<Vec<subscription::Model>> {
        self.ctx
            .repos
            .subscriptions
            .list_by_user(&principal.user_id)
            .await
    }

    async fn ensure_target_exists(&self, scope: &SubscriptionScope) -> AppResult<()> {
        let conn = self.ctx.db.as_ref();
        match scope {
            SubscriptionScope::Topic(id) => {
                self.ctx.repos.topics.get_by_id(conn, id).await?;
            }
            SubscriptionScope::Forum(id) => {
                self.ctx.repos.forums.get_by_id(conn, id).await?;
            }
        }
        Ok(())
    }
}
