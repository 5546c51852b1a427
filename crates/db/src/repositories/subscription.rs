//! Subscription repository.

use std::sync::Arc;

use crate::entities::subscription::SubscriptionScope;
use crate::entities::{Subscription, subscription};
use crate::map_db_err;
use agora_common::AppResult;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

/// Subscription repository.
#[derive(Clone)]
pub struct SubscriptionRepository {
    db: Arc<DatabaseConnection>,
}

impl SubscriptionRepository {
    /// Create a new subscription repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// A user's subscription to a scope.
    pub async fn find<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &str,
        scope: &SubscriptionScope,
    ) -> AppResult<Option<subscription::Model>> {
        Subscription::find()
            .filter(subscription::Column::UserId.eq(user_id))
            .filter(scope.condition())
            .one(conn)
            .await
            .map_err(map_db_err)
    }

    /// Find a subscription by ID.
    pub async fn find_by_id<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
    ) -> AppResult<Option<subscription::Model>> {
        Subscription::find_by_id(id)
            .one(conn)
            .await
            .map_err(map_db_err)
    }

    /// Insert a subscription.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: subscription::ActiveModel,
    ) -> AppResult<subscription::Model> {
        model.insert(conn).await.map_err(map_db_err)
    }

    /// Turn reply notifications on or off.
    pub async fn set_notify_replies<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
        notify_replies: bool,
    ) -> AppResult<subscription::Model> {
        subscription::ActiveModel {
            id: Set(id.to_string()),
            notify_replies: Set(notify_replies),
            ..Default::default()
        }
        .update(conn)
        .await
        .map_err(map_db_err)
    }

    /// Remove a user's subscription to a scope. Returns whether a row was removed.
    pub async fn delete<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &str,
        scope: &SubscriptionScope,
    ) -> AppResult<bool> {
        let result = Subscription::delete_many()
            .filter(subscription::Column::UserId.eq(user_id))
            .filter(scope.condition())
            .exec(conn)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected > 0)
    }

    /// Distinct users following a scope with notifications enabled.
    pub async fn subscriber_ids<C: ConnectionTrait>(
        &self,
        conn: &C,
        scope: &SubscriptionScope,
    ) -> AppResult<Vec<String>> {
        Subscription::find()
            .select_only()
            .column(subscription::Column::UserId)
            .distinct()
            .filter(scope.condition())
            .filter(subscription::Column::NotifyReplies.eq(true))
            .into_tuple()
            .all(conn)
            .await
            .map_err(map_db_err)
    }

    /// A user's subscriptions, newest first.
    pub async fn list_by_user(&self, user_id: &str) -> AppResult<Vec<subscription::Model>> {
        Subscription::find()
            .filter(subscription::Column::UserId.eq(user_id))
            .order_by_desc(subscription::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }
}
