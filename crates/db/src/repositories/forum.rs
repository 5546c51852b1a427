//! Forum repository.

use std::sync::Arc;

use super::{LastPost, add_floored};
use crate::entities::{Forum, forum};
use crate::map_db_err;
use agora_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Value,
};

/// Forum repository for database operations.
#[derive(Clone)]
pub struct ForumRepository {
    db: Arc<DatabaseConnection>,
}

impl ForumRepository {
    /// Create a new forum repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a forum by ID.
    pub async fn find_by_id<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
    ) -> AppResult<Option<forum::Model>> {
        Forum::find_by_id(id).one(conn).await.map_err(map_db_err)
    }

    /// Get a forum by ID, returning `NotFound` if absent.
    pub async fn get_by_id<C: ConnectionTrait>(&self, conn: &C, id: &str) -> AppResult<forum::Model> {
        self.find_by_id(conn, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Forum {id}")))
    }

    /// All forums in display order.
    pub async fn list_ordered(&self) -> AppResult<Vec<forum::Model>> {
        Forum::find()
            .order_by_asc(forum::Column::DisplayOrder)
            .order_by_asc(forum::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// All forum IDs (used by recount).
    pub async fn all_ids(&self) -> AppResult<Vec<String>> {
        Forum::find()
            .select_only()
            .column(forum::Column::Id)
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Create a forum.
    pub async fn create(&self, model: forum::ActiveModel) -> AppResult<forum::Model> {
        model.insert(self.db.as_ref()).await.map_err(map_db_err)
    }

    /// Count a freshly created post, and its topic when `new_topic` is set,
    /// and point the forum at it.
    pub async fn record_post<C: ConnectionTrait>(
        &self,
        conn: &C,
        forum_id: &str,
        last_post: &LastPost,
        new_topic: bool,
    ) -> AppResult<()> {
        let mut update = Forum::update_many()
            .col_expr(
                forum::Column::PostsCount,
                Expr::col(forum::Column::PostsCount).add(1),
            )
            .col_expr(forum::Column::LastPostId, Expr::value(last_post.post_id.clone()))
            .col_expr(
                forum::Column::LastPostTopicId,
                Expr::value(last_post.topic_id.clone()),
            )
            .col_expr(
                forum::Column::LastPostUserId,
                Expr::value(last_post.user_id.clone()),
            )
            .col_expr(forum::Column::LastPostAt, Expr::value(last_post.created_at));

        if new_topic {
            update = update.col_expr(
                forum::Column::TopicsCount,
                Expr::col(forum::Column::TopicsCount).add(1),
            );
        }

        update
            .filter(forum::Column::Id.eq(forum_id))
            .exec(conn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    /// Adjust both counters by signed deltas, flooring at zero.
    pub async fn adjust_counts<C: ConnectionTrait>(
        &self,
        conn: &C,
        forum_id: &str,
        topics_delta: i32,
        posts_delta: i32,
    ) -> AppResult<()> {
        Forum::update_many()
            .col_expr(
                forum::Column::TopicsCount,
                add_floored(forum::Column::TopicsCount, topics_delta),
            )
            .col_expr(
                forum::Column::PostsCount,
                add_floored(forum::Column::PostsCount, posts_delta),
            )
            .filter(forum::Column::Id.eq(forum_id))
            .exec(conn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    /// Overwrite both counters (used by recount).
    pub async fn set_counts<C: ConnectionTrait>(
        &self,
        conn: &C,
        forum_id: &str,
        topics_count: i32,
        posts_count: i32,
    ) -> AppResult<()> {
        Forum::update_many()
            .col_expr(forum::Column::TopicsCount, Expr::value(topics_count))
            .col_expr(forum::Column::PostsCount, Expr::value(posts_count))
            .filter(forum::Column::Id.eq(forum_id))
            .exec(conn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    /// Point the forum at `last_post`, or clear the pointer.
    pub async fn set_last_post<C: ConnectionTrait>(
        &self,
        conn: &C,
        forum_id: &str,
        last_post: Option<&LastPost>,
    ) -> AppResult<()> {
        let (post_id, topic_id, user_id, at) = match last_post {
            Some(p) => (
                Value::from(p.post_id.clone()),
                Value::from(p.topic_id.clone()),
                Value::from(p.user_id.clone()),
                Value::from(p.created_at),
            ),
            None => (
                Value::String(None),
                Value::String(None),
                Value::String(None),
                Value::ChronoDateTimeWithTimeZone(None),
            ),
        };

        Forum::update_many()
            .col_expr(forum::Column::LastPostId, Expr::value(post_id))
            .col_expr(forum::Column::LastPostTopicId, Expr::value(topic_id))
            .col_expr(forum::Column::LastPostUserId, Expr::value(user_id))
            .col_expr(forum::Column::LastPostAt, Expr::value(at))
            .filter(forum::Column::Id.eq(forum_id))
            .exec(conn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    /// Lock or unlock a forum.
    pub async fn set_locked(&self, forum_id: &str, locked: bool) -> AppResult<()> {
        Forum::update_many()
            .col_expr(forum::Column::IsLocked, Expr::value(locked))
            .filter(forum::Column::Id.eq(forum_id))
            .exec(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<forum::Model>::new()])
                .into_connection(),
        );

        let repo = ForumRepository::new(db.clone());
        let result = repo.get_by_id(db.as_ref(), "5").await;
        assert!(matches!(result, Err(AppError::NotFound(msg)) if msg.contains('5')));
    }
}
