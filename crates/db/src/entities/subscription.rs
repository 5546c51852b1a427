//! Subscription entity.
//!
//! Exactly one of `topic_id` / `forum_id` is set; a check constraint in the
//! migration backs this up.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What a subscription follows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum SubscriptionScope {
    Topic(String),
    Forum(String),
}

impl SubscriptionScope {
    /// Filter matching rows of this scope.
    #[must_use]
    pub fn condition(&self) -> sea_orm::Condition {
        match self {
            Self::Topic(id) => sea_orm::Condition::all().add(Column::TopicId.eq(id.as_str())),
            Self::Forum(id) => sea_orm::Condition::all().add(Column::ForumId.eq(id.as_str())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "forum_subscription")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub user_id: String,

    #[sea_orm(nullable)]
    pub topic_id: Option<String>,

    #[sea_orm(nullable)]
    pub forum_id: Option<String>,

    #[sea_orm(default_value = true)]
    pub notify_replies: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::topic::Entity",
        from = "Column::TopicId",
        to = "super::topic::Column::Id",
        on_delete = "Cascade"
    )]
    Topic,
    #[sea_orm(
        belongs_to = "super::forum::Entity",
        from = "Column::ForumId",
        to = "super::forum::Column::Id",
        on_delete = "Cascade"
    )]
    Forum,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::topic::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Topic.def()
    }
}

impl Related<super::forum::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Forum.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
