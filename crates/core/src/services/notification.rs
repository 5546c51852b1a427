//! Notification fan-out and inbox operations.

use std::collections::HashSet;

use agora_common::{AppResult, ForumFanout};
use agora_db::entities::{
    forum, notification::{self, NotificationType}, subscription::SubscriptionScope, topic,
};
use chrono::Utc;
use sea_orm::{ConnectionTrait, Set};
use serde::Serialize;
use tracing::debug;

use crate::context::ForumContext;

/// A page of notifications with the unread total.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationPage {
    pub notifications: Vec<notification::Model>,
    pub unread_count: u64,
}

/// Content of a direct notification to one user.
#[derive(Debug, Clone)]
pub struct DirectNotification<'a> {
    pub user_id: &'a str,
    pub kind: NotificationType,
    pub content: String,
    pub from_user_id: Option<&'a str>,
    pub topic_id: Option<&'a str>,
    pub post_id: Option<&'a str>,
}

/// Notification service.
#[derive(Clone)]
pub struct NotificationService {
    ctx: ForumContext,
}

/// Drop the actor and any repeats, keeping first-seen order.
fn recipients(groups: Vec<Vec<String>>, actor_id: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    groups
        .into_iter()
        .flatten()
        .filter(|id| id != actor_id)
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(ctx: ForumContext) -> Self {
        Self { ctx }
    }

    /// Notify subscribers of a new reply. Topic subscribers always hear
    /// about it; forum subscribers only under [`ForumFanout::AllActivity`].
    pub async fn fan_out_reply<C: ConnectionTrait>(
        &self,
        conn: &C,
        topic: &topic::Model,
        post_id: &str,
        actor_id: &str,
    ) -> AppResult<usize> {
        let subscriptions = &self.ctx.repos.subscriptions;
        let mut groups = vec![
            subscriptions
                .subscriber_ids(conn, &SubscriptionScope::Topic(topic.id.clone()))
                .await?,
        ];
        if self.ctx.config.forum_fanout == ForumFanout::AllActivity {
            groups.push(
                subscriptions
                    .subscriber_ids(conn, &SubscriptionScope::Forum(topic.forum_id.clone()))
                    .await?,
            );
        }

        let content = format!("New reply in: {}", topic.title);
        self.insert_for(
            conn,
            recipients(groups, actor_id),
            NotificationType::Reply,
            &content,
            actor_id,
            &topic.id,
            post_id,
        )
        .await
    }

    /// Notify forum subscribers of a new topic.
    pub async fn fan_out_new_topic<C: ConnectionTrait>(
        &self,
        conn: &C,
        forum: &forum::Model,
        topic: &topic::Model,
        post_id: &str,
    ) -> AppResult<usize> {
        let ids = self
            .ctx
            .repos
            .subscriptions
            .subscriber_ids(conn, &SubscriptionScope::Forum(forum.id.clone()))
            .await?;

        let content = format!("New topic in {}: {}", forum.name, topic.title);
        self.insert_for(
            conn,
            recipients(vec![ids], &topic.user_id),
            NotificationType::NewTopic,
            &content,
            &topic.user_id,
            &topic.id,
            post_id,
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn insert_for<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_ids: Vec<String>,
        kind: NotificationType,
        content: &str,
        actor_id: &str,
        topic_id: &str,
        post_id: &str,
    ) -> AppResult<usize> {
        let now = Utc::now();
        let models: Vec<_> = user_ids
            .into_iter()
            .map(|user_id| notification::ActiveModel {
                id: Set(self.ctx.id_gen.generate()),
                user_id: Set(user_id),
                notification_type: Set(kind),
                topic_id: Set(Some(topic_id.to_string())),
                post_id: Set(Some(post_id.to_string())),
                from_user_id: Set(Some(actor_id.to_string())),
                content: Set(Some(content.to_string())),
                is_read: Set(false),
                created_at: Set(now.into()),
            })
            .collect();

        let count = models.len();
        self.ctx.repos.notifications.create_many(conn, models).await?;
        debug!(topic_id = %topic_id, count, ?kind, "Notifications fanned out");
        Ok(count)
    }

    /// Notify a single user.
    pub async fn notify<C: ConnectionTrait>(
        &self,
        conn: &C,
        note: DirectNotification<'_>,
    ) -> AppResult<notification::Model> {
        self.ctx
            .repos
            .notifications
            .create(
                conn,
                notification::ActiveModel {
                    id: Set(self.ctx.id_gen.generate()),
                    user_id: Set(note.user_id.to_string()),
                    notification_type: Set(note.kind),
                    topic_id: Set(note.topic_id.map(ToString::to_string)),
                    post_id: Set(note.post_id.map(ToString::to_string)),
                    from_user_id: Set(note.from_user_id.map(ToString::to_string)),
                    content: Set(Some(note.content)),
                    is_read: Set(false),
                    created_at: Set(Utc::now().into()),
                },
            )
            .await
    }

    /// A user's notifications, newest first.
    pub async fn list(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
        unread_only: bool,
    ) -> AppResult<NotificationPage> {
        let repo = &self.ctx.repos.notifications;
        let notifications = repo
            .find_by_user(user_id, limit, until_id, unread_only)
            .await?;
        let unread_count = repo.count_unread(user_id).await?;
        Ok(NotificationPage {
            notifications,
            unread_count,
        })
    }

    /// Mark one notification read. Someone else's notification is `NotFound`.
    pub async fn mark_read(&self, user_id: &str, notification_id: &str) -> AppResult<()> {
        self.ctx
            .repos
            .notifications
            .mark_as_read(user_id, notification_id)
            .await
    }

    /// Mark every notification read. Returns how many changed.
    pub async fn mark_all_read(&self, user_id: &str) -> AppResult<u64> {
        self.ctx.repos.notifications.mark_all_as_read(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_recipients_excludes_actor() {
        let result = recipients(vec![ids(&["a", "b", "c"])], "b");
        assert_eq!(result, ids(&["a", "c"]));
    }

    #[test]
    fn test_recipients_deduplicates_across_scopes() {
        let result = recipients(vec![ids(&["a", "b"]), ids(&["b", "c", "actor"])], "actor");
        assert_eq!(result, ids(&["a", "b", "c"]));
    }

    #[test]
    fn test_recipients_empty() {
        assert!(recipients(vec![vec![]], "a").is_empty());
    }
}
