//! Reputation ledger and badge repository.

use std::sync::Arc;

use crate::entities::{ReputationLog, UserBadge, reputation_log, user_badge};
use crate::map_db_err;
use agora_common::AppResult;
use sea_orm::sea_query::{Alias, Expr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

/// Reputation repository.
#[derive(Clone)]
pub struct ReputationRepository {
    db: Arc<DatabaseConnection>,
}

impl ReputationRepository {
    /// Create a new reputation repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Append a ledger entry.
    pub async fn append<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: reputation_log::ActiveModel,
    ) -> AppResult<reputation_log::Model> {
        model.insert(conn).await.map_err(map_db_err)
    }

    /// Most recent ledger entries for a user.
    pub async fn history(&self, user_id: &str, limit: u64) -> AppResult<Vec<reputation_log::Model>> {
        ReputationLog::find()
            .filter(reputation_log::Column::UserId.eq(user_id))
            .order_by_desc(reputation_log::Column::CreatedAt)
            .order_by_desc(reputation_log::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Sum of every ledger entry for a user.
    pub async fn sum_for_user<C: ConnectionTrait>(&self, conn: &C, user_id: &str) -> AppResult<i64> {
        let total: Option<Option<i64>> = ReputationLog::find()
            .select_only()
            .column_as(
                Expr::col(reputation_log::Column::Points).sum().cast_as(Alias::new("bigint")),
                "total",
            )
            .filter(reputation_log::Column::UserId.eq(user_id))
            .into_tuple()
            .one(conn)
            .await
            .map_err(map_db_err)?;

        Ok(total.flatten().unwrap_or(0))
    }

    /// Badges a user holds, oldest first.
    pub async fn badges_for_user<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &str,
    ) -> AppResult<Vec<user_badge::Model>> {
        UserBadge::find()
            .filter(user_badge::Column::UserId.eq(user_id))
            .order_by_asc(user_badge::Column::EarnedAt)
            .all(conn)
            .await
            .map_err(map_db_err)
    }

    /// Insert a badge.
    pub async fn award_badge<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: user_badge::ActiveModel,
    ) -> AppResult<user_badge::Model> {
        model.insert(conn).await.map_err(map_db_err)
    }
}
