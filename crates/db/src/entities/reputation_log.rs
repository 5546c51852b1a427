//! Reputation ledger entry. Append-only.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Event that earned or cost reputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum ReputationAction {
    #[sea_orm(string_value = "topic_created")]
    TopicCreated,
    #[sea_orm(string_value = "post_created")]
    PostCreated,
    #[sea_orm(string_value = "post_upvoted")]
    PostUpvoted,
    #[sea_orm(string_value = "post_downvoted")]
    PostDownvoted,
    #[sea_orm(string_value = "vote_retracted")]
    VoteRetracted,
    #[sea_orm(string_value = "vote_changed")]
    VoteChanged,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reputation_log")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub user_id: String,

    pub action: ReputationAction,

    /// Signed point change
    pub points: i32,

    #[sea_orm(nullable)]
    pub reason: Option<String>,

    /// Topic or post the entry refers to
    #[sea_orm(nullable)]
    pub related_id: Option<String>,

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
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
