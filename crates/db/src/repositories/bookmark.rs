//! Bookmark repository.

use std::sync::Arc;

use crate::entities::{Bookmark, bookmark};
use crate::map_db_err;
use agora_common::AppResult;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

/// Bookmark repository.
#[derive(Clone)]
pub struct BookmarkRepository {
    db: Arc<DatabaseConnection>,
}

impl BookmarkRepository {
    /// Create a new bookmark repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// A user's bookmark of a topic.
    pub async fn find(&self, user_id: &str, topic_id: &str) -> AppResult<Option<bookmark::Model>> {
        Bookmark::find()
            .filter(bookmark::Column::UserId.eq(user_id))
            .filter(bookmark::Column::TopicId.eq(topic_id))
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Insert a bookmark.
    pub async fn create(&self, model: bookmark::ActiveModel) -> AppResult<bookmark::Model> {
        model.insert(self.db.as_ref()).await.map_err(map_db_err)
    }

    /// Remove a bookmark. Returns whether a row was removed.
    pub async fn delete(&self, user_id: &str, topic_id: &str) -> AppResult<bool> {
        let result = Bookmark::delete_many()
            .filter(bookmark::Column::UserId.eq(user_id))
            .filter(bookmark::Column::TopicId.eq(topic_id))
            .exec(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected > 0)
    }

    /// A user's bookmarks, newest first.
    pub async fn list_by_user(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<bookmark::Model>> {
        let mut query = Bookmark::find()
            .filter(bookmark::Column::UserId.eq(user_id))
            .order_by_desc(bookmark::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(bookmark::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }
}
