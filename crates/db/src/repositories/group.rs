//! Group, membership and forum permission repository.

use std::sync::Arc;

use crate::entities::{
    ForumPermission, GroupMembership, UserGroup, forum_permission, group_membership, user_group,
};
use crate::map_db_err;
use agora_common::AppResult;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect,
    RelationTrait,
};
use sea_orm::sea_query::JoinType;

/// Repository for groups and the permissions granted to them.
#[derive(Clone)]
pub struct GroupRepository {
    db: Arc<DatabaseConnection>,
}

impl GroupRepository {
    /// Create a new group repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Groups the user belongs to.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<user_group::Model>> {
        UserGroup::find()
            .join(
                JoinType::InnerJoin,
                user_group::Relation::GroupMembership.def(),
            )
            .filter(group_membership::Column::UserId.eq(user_id))
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Permission rows for a forum restricted to the given groups.
    pub async fn find_permissions(
        &self,
        forum_id: &str,
        group_ids: &[String],
    ) -> AppResult<Vec<forum_permission::Model>> {
        if group_ids.is_empty() {
            return Ok(vec![]);
        }
        ForumPermission::find()
            .filter(forum_permission::Column::ForumId.eq(forum_id))
            .filter(forum_permission::Column::GroupId.is_in(group_ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Create a group.
    pub async fn create(&self, model: user_group::ActiveModel) -> AppResult<user_group::Model> {
        model.insert(self.db.as_ref()).await.map_err(map_db_err)
    }

    /// Add a user to a group.
    pub async fn add_member(
        &self,
        model: group_membership::ActiveModel,
    ) -> AppResult<group_membership::Model> {
        model.insert(self.db.as_ref()).await.map_err(map_db_err)
    }

    /// Remove a user from a group.
    pub async fn remove_member(&self, user_id: &str, group_id: &str) -> AppResult<()> {
        GroupMembership::delete_many()
            .filter(group_membership::Column::UserId.eq(user_id))
            .filter(group_membership::Column::GroupId.eq(group_id))
            .exec(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    /// Insert a forum permission row.
    pub async fn create_permission(
        &self,
        model: forum_permission::ActiveModel,
    ) -> AppResult<forum_permission::Model> {
        model.insert(self.db.as_ref()).await.map_err(map_db_err)
    }
}
