//! Poll repository.

use std::sync::Arc;

use crate::entities::{Poll, PollVote, poll, poll_vote};
use crate::map_db_err;
use agora_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QuerySelect,
};
use serde_json::Value as JsonValue;

/// Poll repository.
#[derive(Clone)]
pub struct PollRepository {
    db: Arc<DatabaseConnection>,
}

impl PollRepository {
    /// Create a new poll repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert a poll.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: poll::ActiveModel,
    ) -> AppResult<poll::Model> {
        model.insert(conn).await.map_err(map_db_err)
    }

    /// Get a poll by ID, returning `NotFound` if absent.
    pub async fn get_by_id<C: ConnectionTrait>(&self, conn: &C, id: &str) -> AppResult<poll::Model> {
        Poll::find_by_id(id)
            .one(conn)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| AppError::NotFound(format!("Poll {id}")))
    }

    /// Get a poll by ID and hold a row lock on it until the transaction ends.
    pub async fn lock_by_id<C: ConnectionTrait>(&self, conn: &C, id: &str) -> AppResult<poll::Model> {
        Poll::find_by_id(id)
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| AppError::NotFound(format!("Poll {id}")))
    }

    /// The poll attached to a topic.
    pub async fn find_by_topic(&self, topic_id: &str) -> AppResult<Option<poll::Model>> {
        Poll::find()
            .filter(poll::Column::TopicId.eq(topic_id))
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Store new vote counts and voter total.
    pub async fn update_votes<C: ConnectionTrait>(
        &self,
        conn: &C,
        poll_id: &str,
        votes: JsonValue,
        voters_delta: i32,
    ) -> AppResult<()> {
        Poll::update_many()
            .col_expr(poll::Column::Votes, Expr::value(votes))
            .col_expr(
                poll::Column::VotersCount,
                Expr::col(poll::Column::VotersCount).add(voters_delta),
            )
            .filter(poll::Column::Id.eq(poll_id))
            .exec(conn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    /// A user's vote on a poll.
    pub async fn find_vote<C: ConnectionTrait>(
        &self,
        conn: &C,
        poll_id: &str,
        user_id: &str,
    ) -> AppResult<Option<poll_vote::Model>> {
        PollVote::find()
            .filter(poll_vote::Column::PollId.eq(poll_id))
            .filter(poll_vote::Column::UserId.eq(user_id))
            .one(conn)
            .await
            .map_err(map_db_err)
    }

    /// Insert a vote.
    pub async fn create_vote<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: poll_vote::ActiveModel,
    ) -> AppResult<poll_vote::Model> {
        model.insert(conn).await.map_err(map_db_err)
    }

    /// Change the choice of an existing vote.
    pub async fn update_vote_choice<C: ConnectionTrait>(
        &self,
        conn: &C,
        vote_id: &str,
        choice: i32,
    ) -> AppResult<()> {
        PollVote::update_many()
            .col_expr(poll_vote::Column::Choice, Expr::value(choice))
            .filter(poll_vote::Column::Id.eq(vote_id))
            .exec(conn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }
}
