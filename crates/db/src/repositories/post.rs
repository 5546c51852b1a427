//! Post repository.

use std::sync::Arc;

use crate::entities::{Post, Topic, post, topic};
use crate::map_db_err;
use agora_common::{AppError, AppResult};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, JoinType, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Value,
};

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID, deleted or not.
    pub async fn find_by_id<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
    ) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id).one(conn).await.map_err(map_db_err)
    }

    /// Get a post by ID, returning `NotFound` if absent.
    pub async fn get_by_id<C: ConnectionTrait>(&self, conn: &C, id: &str) -> AppResult<post::Model> {
        self.find_by_id(conn, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post {id}")))
    }

    /// Get a post by ID and hold a row lock on it until the transaction ends.
    pub async fn lock_by_id<C: ConnectionTrait>(&self, conn: &C, id: &str) -> AppResult<post::Model> {
        Post::find_by_id(id)
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| AppError::NotFound(format!("Post {id}")))
    }

    /// Every post with an ID greater than `after`, in ID order.
    pub async fn list_after<C: ConnectionTrait>(
        &self,
        conn: &C,
        after: Option<&str>,
        limit: u64,
    ) -> AppResult<Vec<post::Model>> {
        let mut query = Post::find();
        if let Some(after) = after {
            query = query.filter(post::Column::Id.gt(after));
        }
        query
            .order_by_asc(post::Column::Id)
            .limit(limit)
            .all(conn)
            .await
            .map_err(map_db_err)
    }

    /// Posts of a topic in reading order, deleted ones included.
    pub async fn list_by_topic(
        &self,
        topic_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<post::Model>> {
        Post::find()
            .filter(post::Column::TopicId.eq(topic_id))
            .order_by_asc(post::Column::CreatedAt)
            .order_by_asc(post::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Insert a post.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: post::ActiveModel,
    ) -> AppResult<post::Model> {
        model.insert(conn).await.map_err(map_db_err)
    }

    /// Replace the content and record who edited it.
    pub async fn update_content<C: ConnectionTrait>(
        &self,
        conn: &C,
        post_id: &str,
        content: &str,
        edited_by: &str,
        edited_at: DateTimeWithTimeZone,
    ) -> AppResult<()> {
        Post::update_many()
            .col_expr(post::Column::Content, Expr::value(content.to_string()))
            .col_expr(post::Column::EditedBy, Expr::value(edited_by.to_string()))
            .col_expr(post::Column::EditedAt, Expr::value(edited_at))
            .filter(post::Column::Id.eq(post_id))
            .exec(conn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    /// Flag a post deleted (`Some((actor, at))`) or restore it (`None`).
    ///
    /// Only flips a post currently in the opposite state; `Conflict` otherwise.
    pub async fn set_deleted<C: ConnectionTrait>(
        &self,
        conn: &C,
        post_id: &str,
        deleted: Option<(&str, DateTimeWithTimeZone)>,
    ) -> AppResult<()> {
        let (flag, by, at) = match deleted {
            Some((by, at)) => (true, Value::from(by.to_string()), Value::from(at)),
            None => (
                false,
                Value::String(None),
                Value::ChronoDateTimeWithTimeZone(None),
            ),
        };

        let result = Post::update_many()
            .col_expr(post::Column::IsDeleted, Expr::value(flag))
            .col_expr(post::Column::DeletedBy, Expr::value(by))
            .col_expr(post::Column::DeletedAt, Expr::value(at))
            .filter(post::Column::Id.eq(post_id))
            .filter(post::Column::IsDeleted.eq(!flag))
            .exec(conn)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            let state = if flag { "deleted" } else { "live" };
            return Err(AppError::Conflict(format!("Post {post_id} is already {state}")));
        }
        Ok(())
    }

    /// Most recent non-deleted post of a topic.
    pub async fn latest_in_topic<C: ConnectionTrait>(
        &self,
        conn: &C,
        topic_id: &str,
    ) -> AppResult<Option<post::Model>> {
        Post::find()
            .filter(post::Column::TopicId.eq(topic_id))
            .filter(post::Column::IsDeleted.eq(false))
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .one(conn)
            .await
            .map_err(map_db_err)
    }

    /// Most recent non-deleted post across all topics of a forum.
    pub async fn latest_in_forum<C: ConnectionTrait>(
        &self,
        conn: &C,
        forum_id: &str,
    ) -> AppResult<Option<post::Model>> {
        Post::find()
            .join(JoinType::InnerJoin, post::Relation::Topic.def())
            .filter(topic::Column::ForumId.eq(forum_id))
            .filter(post::Column::IsDeleted.eq(false))
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .one(conn)
            .await
            .map_err(map_db_err)
    }

    /// Number of non-deleted posts in a topic.
    pub async fn count_live_in_topic<C: ConnectionTrait>(
        &self,
        conn: &C,
        topic_id: &str,
    ) -> AppResult<u64> {
        Post::find()
            .filter(post::Column::TopicId.eq(topic_id))
            .filter(post::Column::IsDeleted.eq(false))
            .count(conn)
            .await
            .map_err(map_db_err)
    }

    /// Number of non-deleted posts across all topics of a forum.
    pub async fn count_live_in_forum<C: ConnectionTrait>(
        &self,
        conn: &C,
        forum_id: &str,
    ) -> AppResult<u64> {
        Post::find()
            .filter(post::Column::IsDeleted.eq(false))
            .filter(
                post::Column::TopicId.in_subquery(
                    Query::select()
                        .column(topic::Column::Id)
                        .from(Topic)
                        .and_where(topic::Column::ForumId.eq(forum_id))
                        .to_owned(),
                ),
            )
            .count(conn)
            .await
            .map_err(map_db_err)
    }
}
