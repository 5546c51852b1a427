//! Post vote repository.

use std::sync::Arc;

use crate::entities::{PostVote, post_vote, post_vote::VoteType};
use crate::map_db_err;
use agora_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter,
};

/// Up/down totals for a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteTally {
    /// Number of up votes.
    pub upvotes: u64,
    /// Number of down votes.
    pub downvotes: u64,
}

/// Post vote repository.
#[derive(Clone)]
pub struct VoteRepository {
    db: Arc<DatabaseConnection>,
}

impl VoteRepository {
    /// Create a new vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// The voter's current vote on a post.
    pub async fn find<C: ConnectionTrait>(
        &self,
        conn: &C,
        post_id: &str,
        user_id: &str,
    ) -> AppResult<Option<post_vote::Model>> {
        PostVote::find()
            .filter(post_vote::Column::PostId.eq(post_id))
            .filter(post_vote::Column::UserId.eq(user_id))
            .one(conn)
            .await
            .map_err(map_db_err)
    }

    /// Insert a vote.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: post_vote::ActiveModel,
    ) -> AppResult<post_vote::Model> {
        model.insert(conn).await.map_err(map_db_err)
    }

    /// Delete a vote that still points in `expected`.
    ///
    /// Returns `Conflict` when the vote changed or vanished since it was read.
    pub async fn delete<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
        expected: VoteType,
    ) -> AppResult<()> {
        let result = PostVote::delete_many()
            .filter(post_vote::Column::Id.eq(id))
            .filter(post_vote::Column::VoteType.eq(expected))
            .exec(conn)
            .await
            .map_err(map_db_err)?;
        ensure_touched(result.rows_affected, id)
    }

    /// Flip a vote from `expected` to `vote_type` in place.
    pub async fn update_type<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
        expected: VoteType,
        vote_type: VoteType,
    ) -> AppResult<()> {
        let result = PostVote::update_many()
            .col_expr(post_vote::Column::VoteType, Expr::value(vote_type))
            .filter(post_vote::Column::Id.eq(id))
            .filter(post_vote::Column::VoteType.eq(expected))
            .exec(conn)
            .await
            .map_err(map_db_err)?;
        ensure_touched(result.rows_affected, id)
    }

    /// Count up and down votes on a post.
    pub async fn tally<C: ConnectionTrait>(&self, conn: &C, post_id: &str) -> AppResult<VoteTally> {
        let upvotes = self.count(conn, post_id, VoteType::Up).await?;
        let downvotes = self.count(conn, post_id, VoteType::Down).await?;
        Ok(VoteTally { upvotes, downvotes })
    }

    /// Tally using the shared connection.
    pub async fn tally_for(&self, post_id: &str) -> AppResult<VoteTally> {
        self.tally(self.db.as_ref(), post_id).await
    }

    async fn count<C: ConnectionTrait>(
        &self,
        conn: &C,
        post_id: &str,
        vote_type: VoteType,
    ) -> AppResult<u64> {
        PostVote::find()
            .filter(post_vote::Column::PostId.eq(post_id))
            .filter(post_vote::Column::VoteType.eq(vote_type))
            .count(conn)
            .await
            .map_err(map_db_err)
    }
}

fn ensure_touched(rows_affected: u64, id: &str) -> AppResult<()> {
    if rows_affected == 0 {
        return Err(AppError::Conflict(format!("Vote {id} changed concurrently")));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_stale_delete_is_conflict() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = VoteRepository::new(db.clone());
        let result = repo.delete(db.as_ref(), "v1", VoteType::Up).await;
        assert!(matches!(result, Err(AppError::Conflict(msg)) if msg.contains("v1")));
    }

    #[tokio::test]
    async fn test_flip_touches_one_row() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = VoteRepository::new(db.clone());
        repo.update_type(db.as_ref(), "v1", VoteType::Up, VoteType::Down)
            .await
            .unwrap();
    }
}
