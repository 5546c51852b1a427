//! Topic repository.

use std::sync::Arc;

use super::{LastPost, add_floored};
use crate::entities::{Topic, topic};
use crate::map_db_err;
use agora_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Value,
};

/// Topic repository for database operations.
#[derive(Clone)]
pub struct TopicRepository {
    db: Arc<DatabaseConnection>,
}

impl TopicRepository {
    /// Create a new topic repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a topic by ID.
    pub async fn find_by_id<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
    ) -> AppResult<Option<topic::Model>> {
        Topic::find_by_id(id).one(conn).await.map_err(map_db_err)
    }

    /// Get a topic by ID, returning `NotFound` if absent.
    pub async fn get_by_id<C: ConnectionTrait>(&self, conn: &C, id: &str) -> AppResult<topic::Model> {
        self.find_by_id(conn, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Topic {id}")))
    }

    /// Find a topic by slug.
    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Option<topic::Model>> {
        Topic::find()
            .filter(topic::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Find topics by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<topic::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        Topic::find()
            .filter(topic::Column::Id.is_in(ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Topics in a forum: pinned first, then most recently active.
    pub async fn list_by_forum(
        &self,
        forum_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<topic::Model>> {
        Topic::find()
            .filter(topic::Column::ForumId.eq(forum_id))
            .order_by_desc(topic::Column::IsPinned)
            .order_by_desc(topic::Column::UpdatedAt)
            .order_by_desc(topic::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Number of topics in a forum.
    pub async fn count_by_forum<C: ConnectionTrait>(&self, conn: &C, forum_id: &str) -> AppResult<u64> {
        Topic::find()
            .filter(topic::Column::ForumId.eq(forum_id))
            .count(conn)
            .await
            .map_err(map_db_err)
    }

    /// IDs of every topic in a forum.
    pub async fn ids_by_forum<C: ConnectionTrait>(
        &self,
        conn: &C,
        forum_id: &str,
    ) -> AppResult<Vec<String>> {
        Topic::find()
            .select_only()
            .column(topic::Column::Id)
            .filter(topic::Column::ForumId.eq(forum_id))
            .into_tuple::<String>()
            .all(conn)
            .await
            .map_err(map_db_err)
    }

    /// Insert a topic.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: topic::ActiveModel,
    ) -> AppResult<topic::Model> {
        model.insert(conn).await.map_err(map_db_err)
    }

    /// Count a new reply and point the topic at it.
    pub async fn record_reply<C: ConnectionTrait>(
        &self,
        conn: &C,
        topic_id: &str,
        last_post: &LastPost,
    ) -> AppResult<()> {
        Topic::update_many()
            .col_expr(topic::Column::Replies, Expr::col(topic::Column::Replies).add(1))
            .col_expr(topic::Column::LastPostId, Expr::value(last_post.post_id.clone()))
            .col_expr(
                topic::Column::LastPostUserId,
                Expr::value(last_post.user_id.clone()),
            )
            .col_expr(topic::Column::LastPostAt, Expr::value(last_post.created_at))
            .col_expr(topic::Column::UpdatedAt, Expr::value(last_post.created_at))
            .filter(topic::Column::Id.eq(topic_id))
            .exec(conn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    /// Adjust the reply counter by a signed delta, flooring at zero.
    pub async fn adjust_replies<C: ConnectionTrait>(
        &self,
        conn: &C,
        topic_id: &str,
        delta: i32,
    ) -> AppResult<()> {
        Topic::update_many()
            .col_expr(
                topic::Column::Replies,
                add_floored(topic::Column::Replies, delta),
            )
            .filter(topic::Column::Id.eq(topic_id))
            .exec(conn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    /// Overwrite the reply counter (used by recount).
    pub async fn set_replies<C: ConnectionTrait>(
        &self,
        conn: &C,
        topic_id: &str,
        replies: i32,
    ) -> AppResult<()> {
        self.update_column(conn, topic_id, topic::Column::Replies, Value::from(replies))
            .await
    }

    /// Point the topic at `last_post`, or clear the pointer.
    pub async fn set_last_post<C: ConnectionTrait>(
        &self,
        conn: &C,
        topic_id: &str,
        last_post: Option<&LastPost>,
    ) -> AppResult<()> {
        let (post_id, user_id, at) = match last_post {
            Some(p) => (
                Value::from(p.post_id.clone()),
                Value::from(p.user_id.clone()),
                Value::from(p.created_at),
            ),
            None => (
                Value::String(None),
                Value::String(None),
                Value::ChronoDateTimeWithTimeZone(None),
            ),
        };

        Topic::update_many()
            .col_expr(topic::Column::LastPostId, Expr::value(post_id))
            .col_expr(topic::Column::LastPostUserId, Expr::value(user_id))
            .col_expr(topic::Column::LastPostAt, Expr::value(at))
            .filter(topic::Column::Id.eq(topic_id))
            .exec(conn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    /// Set the locked flag.
    pub async fn set_locked<C: ConnectionTrait>(
        &self,
        conn: &C,
        topic_id: &str,
        locked: bool,
    ) -> AppResult<()> {
        self.update_column(conn, topic_id, topic::Column::IsLocked, Value::from(locked))
            .await
    }

    /// Set the pinned flag.
    pub async fn set_pinned<C: ConnectionTrait>(
        &self,
        conn: &C,
        topic_id: &str,
        pinned: bool,
    ) -> AppResult<()> {
        self.update_column(conn, topic_id, topic::Column::IsPinned, Value::from(pinned))
            .await
    }

    /// Move the topic to another forum.
    pub async fn set_forum<C: ConnectionTrait>(
        &self,
        conn: &C,
        topic_id: &str,
        forum_id: &str,
    ) -> AppResult<()> {
        self.update_column(
            conn,
            topic_id,
            topic::Column::ForumId,
            Value::from(forum_id.to_string()),
        )
        .await
    }

    /// Attach a poll.
    pub async fn set_poll<C: ConnectionTrait>(
        &self,
        conn: &C,
        topic_id: &str,
        poll_id: &str,
    ) -> AppResult<()> {
        self.update_column(
            conn,
            topic_id,
            topic::Column::PollId,
            Value::from(poll_id.to_string()),
        )
        .await
    }

    async fn update_column<C: ConnectionTrait>(
        &self,
        conn: &C,
        topic_id: &str,
        column: topic::Column,
        value: Value,
    ) -> AppResult<()> {
        Topic::update_many()
            .col_expr(column, Expr::value(value))
            .filter(topic::Column::Id.eq(topic_id))
            .exec(conn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    /// Atomically count a view.
    pub async fn increment_views(&self, slug: &str) -> AppResult<bool> {
        let result = Topic::update_many()
            .col_expr(topic::Column::Views, Expr::col(topic::Column::Views).add(1))
            .filter(topic::Column::Slug.eq(slug))
            .exec(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected > 0)
    }

    /// Hard-delete a topic. Posts, votes, notifications, index entries,
    /// subscriptions, bookmarks and polls cascade.
    pub async fn delete<C: ConnectionTrait>(&self, conn: &C, topic_id: &str) -> AppResult<()> {
        Topic::delete_by_id(topic_id)
            .exec(conn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }
}
