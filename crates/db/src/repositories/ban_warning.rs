//! Warning and ban repository.

use std::sync::Arc;

use crate::entities::{Ban, Warning, ban, warning};
use crate::map_db_err;
use agora_common::AppResult;
use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder,
};

/// Repository for user warnings and bans.
#[derive(Clone)]
pub struct BanRepository {
    db: Arc<DatabaseConnection>,
}

impl BanRepository {
    /// Create a new ban repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Record a warning.
    pub async fn create_warning<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: warning::ActiveModel,
    ) -> AppResult<warning::Model> {
        model.insert(conn).await.map_err(map_db_err)
    }

    /// Warnings issued to a user, newest first.
    pub async fn warnings_for_user(&self, user_id: &str) -> AppResult<Vec<warning::Model>> {
        Warning::find()
            .filter(warning::Column::UserId.eq(user_id))
            .order_by_desc(warning::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// The user's active, unexpired ban, if any.
    pub async fn find_active_ban<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &str,
    ) -> AppResult<Option<ban::Model>> {
        Ban::find()
            .filter(ban::Column::UserId.eq(user_id))
            .filter(ban::Column::IsActive.eq(true))
            .filter(
                Condition::any()
                    .add(ban::Column::ExpiresAt.is_null())
                    .add(ban::Column::ExpiresAt.gt(Utc::now())),
            )
            .order_by_desc(ban::Column::CreatedAt)
            .one(conn)
            .await
            .map_err(map_db_err)
    }

    /// Record a ban.
    pub async fn create_ban<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: ban::ActiveModel,
    ) -> AppResult<ban::Model> {
        model.insert(conn).await.map_err(map_db_err)
    }

    /// Deactivate a ban, recording who lifted it.
    pub async fn lift_ban<C: ConnectionTrait>(
        &self,
        conn: &C,
        ban_id: &str,
        lifted_by: &str,
        lifted_at: DateTimeWithTimeZone,
    ) -> AppResult<()> {
        Ban::update_many()
            .col_expr(ban::Column::IsActive, Expr::value(false))
            .col_expr(ban::Column::LiftedBy, Expr::value(lifted_by.to_string()))
            .col_expr(ban::Column::LiftedAt, Expr::value(lifted_at))
            .filter(ban::Column::Id.eq(ban_id))
            .exec(conn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }
}
