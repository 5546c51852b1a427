//! Moderation log repository.

use std::sync::Arc;

use crate::entities::{ModerationLog, moderation_log};
use crate::map_db_err;
use agora_common::AppResult;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

/// Moderation log repository. Entries are never updated.
#[derive(Clone)]
pub struct ModerationLogRepository {
    db: Arc<DatabaseConnection>,
}

impl ModerationLogRepository {
    /// Create a new moderation log repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Append an entry.
    pub async fn append<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: moderation_log::ActiveModel,
    ) -> AppResult<moderation_log::Model> {
        model.insert(conn).await.map_err(map_db_err)
    }

    /// Newest entries first, paginated by ID cursor.
    pub async fn list(
        &self,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<moderation_log::Model>> {
        let mut query = ModerationLog::find().order_by_desc(moderation_log::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(moderation_log::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }
}
