//! Topic entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "forum_topic")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub forum_id: String,

    /// Author of the topic (and of its first post)
    pub user_id: String,

    pub title: String,

    #[sea_orm(unique)]
    pub slug: String,

    #[sea_orm(default_value = 0)]
    pub views: i32,

    /// Non-deleted posts minus the opening post
    #[sea_orm(default_value = 0)]
    pub replies: i32,

    #[sea_orm(default_value = false)]
    pub is_locked: bool,

    #[sea_orm(default_value = false)]
    pub is_pinned: bool,

    #[sea_orm(default_value = false)]
    pub is_announcement: bool,

    #[sea_orm(nullable)]
    pub poll_id: Option<String>,

    #[sea_orm(nullable)]
    pub last_post_id: Option<String>,

    #[sea_orm(nullable)]
    pub last_post_user_id: Option<String>,

    #[sea_orm(nullable)]
    pub last_post_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    /// Last activity (creation or newest reply); drives listing order
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::forum::Entity",
        from = "Column::ForumId",
        to = "super::forum::Column::Id",
        on_delete = "Cascade"
    )]
    Forum,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(has_many = "super::post::Entity")]
    Post,
}

impl Related<super::forum::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Forum.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
