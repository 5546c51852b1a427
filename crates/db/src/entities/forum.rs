//! Forum entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "forum")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub category_id: String,

    pub name: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    #[sea_orm(default_value = 0)]
    pub display_order: i32,

    /// Locked forums accept no new topics or replies from non-admins
    #[sea_orm(default_value = false)]
    pub is_locked: bool,

    /// Number of topics in this forum
    #[sea_orm(default_value = 0)]
    pub topics_count: i32,

    /// Number of non-deleted posts across the forum's topics
    #[sea_orm(default_value = 0)]
    pub posts_count: i32,

    // Last-post pointer. Never a foreign key; recomputed on delete.
    #[sea_orm(nullable)]
    pub last_post_id: Option<String>,

    #[sea_orm(nullable)]
    pub last_post_topic_id: Option<String>,

    #[sea_orm(nullable)]
    pub last_post_user_id: Option<String>,

    #[sea_orm(nullable)]
    pub last_post_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_delete = "Cascade"
    )]
    Category,
    #[sea_orm(has_many = "super::topic::Entity")]
    Topic,
    #[sea_orm(has_many = "super::forum_permission::Entity")]
    ForumPermission,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::topic::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Topic.def()
    }
}

impl Related<super::forum_permission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ForumPermission.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
