//! Moderation actions and the audit log.
//!
//! Every action runs in one transaction together with its log entry.

use agora_common::cache::keys;
use agora_common::{AppError, AppResult};
use agora_db::entities::{
    ban::{self, BanType},
    moderation_log::{self, ModerationLogAction, ModerationTarget},
    notification::NotificationType,
    topic,
    user::UserRole,
    warning,
};
use agora_db::map_db_err;
use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{DatabaseTransaction, Set};
use serde::Deserialize;
use tracing::info;

use crate::context::ForumContext;
use crate::services::authorization::Principal;
use crate::services::notification::{DirectNotification, NotificationService};
use crate::services::topic::{TopicService, clamp_count};

/// Warning points used when none are given.
pub const DEFAULT_WARNING_POINTS: i32 = 1;

/// A moderation action with its target.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ModerationAction {
    LockTopic {
        topic_id: String,
    },
    UnlockTopic {
        topic_id: String,
    },
    PinTopic {
        topic_id: String,
    },
    UnpinTopic {
        topic_id: String,
    },
    MoveTopic {
        topic_id: String,
        to_forum_id: String,
    },
    DeleteTopic {
        topic_id: String,
    },
    DeletePost {
        post_id: String,
    },
    RestorePost {
        post_id: String,
    },
    WarnUser {
        user_id: String,
        points: Option<i32>,
        expires_at: Option<DateTimeWithTimeZone>,
    },
    BanUser {
        user_id: String,
        ban_type: BanType,
        expires_at: Option<DateTimeWithTimeZone>,
    },
    UnbanUser {
        user_id: String,
    },
}

/// An action with the moderator's stated reason.
#[derive(Debug, Clone, Deserialize)]
pub struct ModerationRequest {
    #[serde(flatten)]
    pub action: ModerationAction,
    pub reason: Option<String>,
}

impl ModerationAction {
    /// Log kind and target of this action.
    #[must_use]
    pub fn log_kind(&self) -> (ModerationLogAction, ModerationTarget, &str) {
        use ModerationLogAction as A;
        use ModerationTarget as T;
        match self {
            Self::LockTopic { topic_id } => (A::LockTopic, T::Topic, topic_id),
            Self::UnlockTopic { topic_id } => (A::UnlockTopic, T::Topic, topic_id),
            Self::PinTopic { topic_id } => (A::PinTopic, T::Topic, topic_id),
            Self::UnpinTopic { topic_id } => (A::UnpinTopic, T::Topic, topic_id),
            Self::MoveTopic { topic_id, .. } => (A::MoveTopic, T::Topic, topic_id),
            Self::DeleteTopic { topic_id } => (A::DeleteTopic, T::Topic, topic_id),
            Self::DeletePost { post_id } => (A::DeletePost, T::Post, post_id),
            Self::RestorePost { post_id } => (A::RestorePost, T::Post, post_id),
            Self::WarnUser { user_id, .. } => (A::WarnUser, T::User, user_id),
            Self::BanUser { user_id, .. } => (A::BanUser, T::User, user_id),
            Self::UnbanUser { user_id } => (A::UnbanUser, T::User, user_id),
        }
    }
}

/// Blank reasons count as missing.
fn non_blank(reason: Option<&str>) -> Option<&str> {
    reason.map(str::trim).filter(|r| !r.is_empty())
}

fn required_reason(reason: Option<&str>) -> AppResult<&str> {
    non_blank(reason).ok_or_else(|| AppError::InvalidInput("A reason is required".to_string()))
}

/// Expiry to store for a new ban.
fn ban_expiry(
    ban_type: BanType,
    expires_at: Option<DateTimeWithTimeZone>,
) -> AppResult<Option<DateTimeWithTimeZone>> {
    match ban_type {
        BanType::Permanent => Ok(None),
        BanType::Temporary => match expires_at {
            Some(at) if at > Utc::now() => Ok(Some(at)),
            Some(_) => Err(AppError::InvalidInput(
                "Ban expiry must be in the future".to_string(),
            )),
            None => Err(AppError::InvalidInput(
                "Temporary bans need an expiry".to_string(),
            )),
        },
    }
}

/// What an applied action changed, for log details and cache invalidation.
#[derive(Default)]
struct Effect {
    details: Option<String>,
    stale: Vec<String>,
}

impl Effect {
    fn topic(topic: &topic::Model) -> Self {
        Self {
            details: None,
            stale: vec![
                keys::FORUM_INDEX.to_string(),
                keys::forum_view(&topic.forum_id),
                keys::topic_view(&topic.slug),
            ],
        }
    }
}

/// One audit log entry before it is stored.
pub(crate) struct LogLine<'a> {
    pub kind: ModerationLogAction,
    pub target_type: ModerationTarget,
    pub target_id: &'a str,
    pub reason: Option<&'a str>,
    pub details: Option<String>,
}

/// Moderation service.
#[derive(Clone)]
pub struct ModerationService {
    ctx: ForumContext,
    topics: TopicService,
    notifications: NotificationService,
}

impl ModerationService {
    /// Create a new moderation service.
    #[must_use]
    pub const fn new(
        ctx: ForumContext,
        topics: TopicService,
        notifications: NotificationService,
    ) -> Self {
        Self {
            ctx,
            topics,
            notifications,
        }
    }

    /// Apply an action and record it. Returns the log entry.
    pub async fn apply(
        &self,
        principal: &Principal,
        action: ModerationAction,
        reason: Option<String>,
    ) -> AppResult<moderation_log::Model> {
        principal.ensure_can_moderate()?;
        principal.ensure_not_banned()?;

        let txn = self.ctx.begin().await?;
        let (entry, stale) = self
            .apply_in(&txn, principal, &action, reason.as_deref())
            .await?;
        txn.commit().await.map_err(map_db_err)?;
        self.ctx.invalidate(&stale).await;

        info!(
            moderator = %principal.user_id,
            action = ?entry.action,
            target = %entry.target_id,
            "Moderation action applied"
        );
        Ok(entry)
    }

    /// Apply an action inside the caller's transaction and append its log
    /// entry. Returns the entry and the cache keys to drop after commit.
    pub(crate) async fn apply_in(
        &self,
        txn: &DatabaseTransaction,
        principal: &Principal,
        action: &ModerationAction,
        reason: Option<&str>,
    ) -> AppResult<(moderation_log::Model, Vec<String>)> {
        let reason = non_blank(reason);
        let effect = self.perform(txn, principal, action, reason).await?;

        let (kind, target_type, target_id) = action.log_kind();
        let entry = self
            .record(
                txn,
                principal,
                LogLine {
                    kind,
                    target_type,
                    target_id,
                    reason,
                    details: effect.details,
                },
            )
            .await?;
        Ok((entry, effect.stale))
    }

    /// Append one audit log entry.
    pub(crate) async fn record(
        &self,
        txn: &DatabaseTransaction,
        principal: &Principal,
        line: LogLine<'_>,
    ) -> AppResult<moderation_log::Model> {
        self.ctx
            .repos
            .moderation_logs
            .append(
                txn,
                moderation_log::ActiveModel {
                    id: Set(self.ctx.id_gen.generate()),
                    moderator_id: Set(principal.user_id.clone()),
                    action: Set(line.kind),
                    target_type: Set(line.target_type),
                    target_id: Set(line.target_id.to_string()),
                    reason: Set(line.reason.map(ToString::to_string)),
                    details: Set(line.details),
                    created_at: Set(Utc::now().into()),
                },
            )
            .await
    }

    async fn perform(
        &self,
        txn: &DatabaseTransaction,
        principal: &Principal,
        action: &ModerationAction,
        reason: Option<&str>,
    ) -> AppResult<Effect> {
        let repos = &self.ctx.repos;
        match action {
            ModerationAction::LockTopic { topic_id } | ModerationAction::UnlockTopic { topic_id } => {
                let locked = matches!(action, ModerationAction::LockTopic { .. });
                let topic = repos.topics.get_by_id(txn, topic_id).await?;
                repos.topics.set_locked(txn, topic_id, locked).await?;
                Ok(Effect::topic(&topic))
            }
            ModerationAction::PinTopic { topic_id } | ModerationAction::UnpinTopic { topic_id } => {
                let pinned = matches!(action, ModerationAction::PinTopic { .. });
                let topic = repos.topics.get_by_id(txn, topic_id).await?;
                repos.topics.set_pinned(txn, topic_id, pinned).await?;
                Ok(Effect::topic(&topic))
            }
            ModerationAction::MoveTopic {
                topic_id,
                to_forum_id,
            } => self.move_topic(txn, topic_id, to_forum_id).await,
            ModerationAction::DeleteTopic { topic_id } => {
                let topic = repos.topics.get_by_id(txn, topic_id).await?;
                self.topics.delete_topic_in(txn, &topic).await?;
                Ok(Effect::topic(&topic))
            }
            ModerationAction::DeletePost { post_id } => {
                let post = repos.posts.lock_by_id(txn, post_id).await?;
                if post.is_deleted {
                    return Err(AppError::InvalidInput("Post is already deleted".to_string()));
                }
                let topic = repos.topics.get_by_id(txn, &post.topic_id).await?;
                self.topics
                    .soft_delete_in(txn, &post, &topic, &principal.user_id)
                    .await?;
                Ok(Effect::topic(&topic))
            }
            ModerationAction::RestorePost { post_id } => {
                let post = repos.posts.lock_by_id(txn, post_id).await?;
                if !post.is_deleted {
                    return Err(AppError::InvalidInput("Post is not deleted".to_string()));
                }
                let topic = repos.topics.get_by_id(txn, &post.topic_id).await?;
                self.topics.restore_in(txn, &post, &topic).await?;
                Ok(Effect::topic(&topic))
            }
            ModerationAction::WarnUser {
                user_id,
                points,
                expires_at,
            } => {
                let reason = required_reason(reason)?;
                let points = points.unwrap_or(DEFAULT_WARNING_POINTS);
                if points <= 0 {
                    return Err(AppError::InvalidInput(
                        "Warning points must be positive".to_string(),
                    ));
                }
                repos.users.get_by_id(txn, user_id).await?;

                repos
                    .bans
                    .create_warning(
                        txn,
                        warning::ActiveModel {
                            id: Set(self.ctx.id_gen.generate()),
                            user_id: Set(user_id.clone()),
                            moderator_id: Set(principal.user_id.clone()),
                            reason: Set(reason.to_string()),
                            points: Set(points),
                            expires_at: Set(*expires_at),
                            is_active: Set(true),
                            created_at: Set(Utc::now().into()),
                        },
                    )
                    .await?;

                self.notifications
                    .notify(
                        txn,
                        DirectNotification {
                            user_id,
                            kind: NotificationType::Warning,
                            content: format!("You have received a warning: {reason}"),
                            from_user_id: Some(&principal.user_id),
                            topic_id: None,
                            post_id: None,
                        },
                    )
                    .await?;
                Ok(Effect::default())
            }
            ModerationAction::BanUser {
                user_id,
                ban_type,
                expires_at,
            } => {
                let reason = required_reason(reason)?;
                if *user_id == principal.user_id {
                    return Err(AppError::Forbidden("You cannot ban yourself".to_string()));
                }
                let target = repos.users.get_by_id(txn, user_id).await?;
                if target.role == UserRole::Admin && !principal.is_admin() {
                    return Err(AppError::Forbidden("Admins cannot be banned".to_string()));
                }
                let expires_at = ban_expiry(*ban_type, *expires_at)?;
                if repos.bans.find_active_ban(txn, user_id).await?.is_some() {
                    return Err(AppError::Conflict("User is already banned".to_string()));
                }

                repos
                    .bans
                    .create_ban(
                        txn,
                        ban::ActiveModel {
                            id: Set(self.ctx.id_gen.generate()),
                            user_id: Set(user_id.clone()),
                            banned_by: Set(principal.user_id.clone()),
                            reason: Set(reason.to_string()),
                            ban_type: Set(*ban_type),
                            expires_at: Set(expires_at),
                            is_active: Set(true),
                            lifted_by: Set(None),
                            lifted_at: Set(None),
                            created_at: Set(Utc::now().into()),
                        },
                    )
                    .await?;

                self.notifications
                    .notify(
                        txn,
                        DirectNotification {
                            user_id,
                            kind: NotificationType::Ban,
                            content: format!("You have been banned: {reason}"),
                            from_user_id: Some(&principal.user_id),
                            topic_id: None,
                            post_id: None,
                        },
                    )
                    .await?;
                Ok(Effect::default())
            }
            ModerationAction::UnbanUser { user_id } => {
                let ban = repos
                    .bans
                    .find_active_ban(txn, user_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Active ban for user {user_id}")))?;
                repos
                    .bans
                    .lift_ban(txn, &ban.id, &principal.user_id, Utc::now().into())
                    .await?;
                Ok(Effect::default())
            }
        }
    }

    async fn move_topic(
        &self,
        txn: &DatabaseTransaction,
        topic_id: &str,
        to_forum_id: &str,
    ) -> AppResult<Effect> {
        let repos = &self.ctx.repos;
        let topic = repos.topics.get_by_id(txn, topic_id).await?;
        let target = repos.forums.get_by_id(txn, to_forum_id).await?;
        if topic.forum_id == target.id {
            return Err(AppError::InvalidInput(
                "Topic is already in that forum".to_string(),
            ));
        }

        let live = clamp_count(repos.posts.count_live_in_topic(txn, topic_id).await?);

        repos.topics.set_forum(txn, topic_id, &target.id).await?;
        repos.forums.adjust_counts(txn, &topic.forum_id, -1, -live).await?;
        repos.forums.adjust_counts(txn, &target.id, 1, live).await?;
        self.topics.refresh_forum_pointer(txn, &topic.forum_id).await?;
        self.topics.refresh_forum_pointer(txn, &target.id).await?;

        let mut effect = Effect::topic(&topic);
        effect.stale.push(keys::forum_view(&target.id));
        effect.details = Some(format!(
            "Moved from forum {} to {}",
            topic.forum_id, target.id
        ));
        Ok(effect)
    }

    /// Audit log, newest first.
    pub async fn logs(
        &self,
        principal: &Principal,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<moderation_log::Model>> {
        principal.ensure_can_moderate()?;
        self.ctx.repos.moderation_logs.list(limit, until_id).await
    }

    /// Warnings and bans on record for a user.
    pub async fn record_for(
        &self,
        principal: &Principal,
        user_id: &str,
    ) -> AppResult<(Vec<warning::Model>, Option<ban::Model>)> {
        principal.ensure_can_moderate()?;
        let warnings = self.ctx.repos.bans.warnings_for_user(user_id).await?;
        let ban = self
            .ctx
            .repos
            .bans
            .find_active_ban(self.ctx.db.as_ref(), user_id)
            .await?;
        Ok((warnings, ban))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::{
        AuthorizationService, PollService, ReputationService, SearchService,
    };
    use agora_common::{ForumConfig, NoOpResponseCache};
    use agora_db::entities::{post, user};
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::Arc;

    fn service_over(db: DatabaseConnection) -> ModerationService {
        let ctx = ForumContext::new(
            Arc::new(db),
            Arc::new(NoOpResponseCache),
            ForumConfig::default(),
        );
        let notifications = NotificationService::new(ctx.clone());
        let topics = TopicService::new(
            ctx.clone(),
            AuthorizationService::new(ctx.clone()),
            ReputationService::new(ctx.clone()),
            notifications.clone(),
            SearchService::new(ctx.clone()),
            PollService::new(ctx.clone()),
        );
        ModerationService::new(ctx, topics, notifications)
    }

    fn empty_service() -> ModerationService {
        service_over(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
    }

    fn principal(user_id: &str, role: UserRole) -> Principal {
        Principal {
            user_id: user_id.to_string(),
            username: user_id.to_string(),
            role,
            group_ids: vec![],
            in_moderator_group: false,
            in_admin_group: false,
            banned: false,
        }
    }

    fn create_test_user(id: &str, role: UserRole) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: id.to_string(),
            token: None,
            role,
            reputation: 0,
            created_at: Utc::now().into(),
        }
    }

    fn create_test_ban(user_id: &str) -> ban::Model {
        ban::Model {
            id: "b1".to_string(),
            user_id: user_id.to_string(),
            banned_by: "m0".to_string(),
            reason: "spam".to_string(),
            ban_type: BanType::Permanent,
            expires_at: None,
            is_active: true,
            lifted_by: None,
            lifted_at: None,
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_action_deserialize() {
        let request: ModerationRequest = serde_json::from_value(serde_json::json!({
            "action": "move_topic",
            "topic_id": "t1",
            "to_forum_id": "f2",
            "reason": "off-topic"
        }))
        .unwrap();
        assert_eq!(
            request.action,
            ModerationAction::MoveTopic {
                topic_id: "t1".to_string(),
                to_forum_id: "f2".to_string()
            }
        );
        assert_eq!(request.reason.as_deref(), Some("off-topic"));

        let request: ModerationRequest = serde_json::from_value(serde_json::json!({
            "action": "ban_user",
            "user_id": "u1",
            "ban_type": "permanent"
        }))
        .unwrap();
        assert!(matches!(request.action, ModerationAction::BanUser { .. }));
        assert!(request.reason.is_none());
    }

    #[test]
    fn test_log_kind() {
        let action = ModerationAction::RestorePost {
            post_id: "p1".to_string(),
        };
        let (kind, target, id) = action.log_kind();
        assert_eq!(kind, ModerationLogAction::RestorePost);
        assert_eq!(target, ModerationTarget::Post);
        assert_eq!(id, "p1");
    }

    #[test]
    fn test_ban_expiry() {
        assert_eq!(ban_expiry(BanType::Permanent, Some(Utc::now().into())).unwrap(), None);
        assert!(ban_expiry(BanType::Temporary, None).is_err());
        assert!(ban_expiry(BanType::Temporary, Some((Utc::now() - Duration::hours(1)).into())).is_err());
        assert!(
            ban_expiry(BanType::Temporary, Some((Utc::now() + Duration::hours(1)).into()))
                .unwrap()
                .is_some()
        );
    }

    #[test]
    fn test_reason_blank_is_missing() {
        assert!(required_reason(Some("  ")).is_err());
        assert!(required_reason(None).is_err());
        assert_eq!(required_reason(Some(" spam ")).unwrap(), "spam");
    }

    #[tokio::test]
    async fn test_regular_user_cannot_moderate() {
        let result = empty_service()
            .apply(
                &principal("u1", UserRole::User),
                ModerationAction::LockTopic {
                    topic_id: "t1".to_string(),
                },
                None,
            )
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_warn_requires_reason() {
        let result = empty_service()
            .apply(
                &principal("m1", UserRole::Moderator),
                ModerationAction::WarnUser {
                    user_id: "u1".to_string(),
                    points: None,
                    expires_at: None,
                },
                Some("   ".to_string()),
            )
            .await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_moderator_cannot_ban_self() {
        let result = empty_service()
            .apply(
                &principal("m1", UserRole::Moderator),
                ModerationAction::BanUser {
                    user_id: "m1".to_string(),
                    ban_type: BanType::Permanent,
                    expires_at: None,
                },
                Some("test".to_string()),
            )
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_moderator_cannot_ban_admin() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_user("a1", UserRole::Admin)]])
            .into_connection();
        let result = service_over(db)
            .apply(
                &principal("m1", UserRole::Moderator),
                ModerationAction::BanUser {
                    user_id: "a1".to_string(),
                    ban_type: BanType::Permanent,
                    expires_at: None,
                },
                Some("test".to_string()),
            )
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_ban_while_banned_conflicts() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_user("u1", UserRole::User)]])
            .append_query_results([[create_test_ban("u1")]])
            .into_connection();
        let result = service_over(db)
            .apply(
                &principal("m1", UserRole::Moderator),
                ModerationAction::BanUser {
                    user_id: "u1".to_string(),
                    ban_type: BanType::Permanent,
                    expires_at: None,
                },
                Some("again".to_string()),
            )
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_unban_without_ban_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<ban::Model>::new()])
            .into_connection();
        let result = service_over(db)
            .apply(
                &principal("m1", UserRole::Moderator),
                ModerationAction::UnbanUser {
                    user_id: "u1".to_string(),
                },
                None,
            )
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_restore_live_post_rejected() {
        let post = post::Model {
            id: "p1".to_string(),
            topic_id: "t1".to_string(),
            user_id: "u1".to_string(),
            content: "hello".to_string(),
            edited_by: None,
            edited_at: None,
            is_deleted: false,
            deleted_by: None,
            deleted_at: None,
            created_at: Utc::now().into(),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[post]])
            .into_connection();
        let result = service_over(db)
            .apply(
                &principal("m1", UserRole::Moderator),
                ModerationAction::RestorePost {
                    post_id: "p1".to_string(),
                },
                None,
            )
            .await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
}
