//! User repository.

use std::sync::Arc;

use crate::entities::{User, user};
use crate::map_db_err;
use agora_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
    ) -> AppResult<Option<user::Model>> {
        User::find_by_id(id).one(conn).await.map_err(map_db_err)
    }

    /// Get a user by ID, returning `NotFound` if absent.
    pub async fn get_by_id<C: ConnectionTrait>(&self, conn: &C, id: &str) -> AppResult<user::Model> {
        self.find_by_id(conn, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {id}")))
    }

    /// Find a user by bearer token.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Token.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Find users by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<user::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        User::find()
            .filter(user::Column::Id.is_in(ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Create a new user.
    pub async fn create(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model.insert(self.db.as_ref()).await.map_err(map_db_err)
    }

    /// Atomically add `delta` to the cached reputation and return the new value.
    pub async fn add_reputation<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &str,
        delta: i32,
    ) -> AppResult<i32> {
        User::update_many()
            .col_expr(
                user::Column::Reputation,
                Expr::col(user::Column::Reputation).add(delta),
            )
            .filter(user::Column::Id.eq(user_id))
            .exec(conn)
            .await
            .map_err(map_db_err)?;

        Ok(self.get_by_id(conn, user_id).await?.reputation)
    }

    /// Overwrite the cached reputation (used by recount).
    pub async fn set_reputation<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &str,
        reputation: i32,
    ) -> AppResult<()> {
        User::update_many()
            .col_expr(user::Column::Reputation, Expr::value(reputation))
            .filter(user::Column::Id.eq(user_id))
            .exec(conn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    /// Users with positive reputation, highest first.
    pub async fn leaderboard(&self, limit: u64) -> AppResult<Vec<user::Model>> {
        User::find()
            .filter(user::Column::Reputation.gt(0))
            .order_by_desc(user::Column::Reputation)
            .order_by_asc(user::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// All user IDs (used by recount).
    pub async fn all_ids(&self) -> AppResult<Vec<String>> {
        User::find()
            .select_only()
            .column(user::Column::Id)
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::user::UserRole;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_user(id: &str, reputation: i32) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: format!("name_{id}"),
            token: Some(format!("token_{id}")),
            role: UserRole::User,
            reputation,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_token() {
        let user = create_test_user("u1", 0);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user.clone()]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let found = repo.find_by_token("token_u1").await.unwrap();
        assert_eq!(found, Some(user));
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let repo = UserRepository::new(db.clone());
        let result = repo.get_by_id(db.as_ref(), "missing").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_find_by_ids_empty_skips_query() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let repo = UserRepository::new(db);
        assert!(repo.find_by_ids(&[]).await.unwrap().is_empty());
    }
}
