//! Post report entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Where a report is in the moderation queue.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    /// Closed with a moderation action taken.
    #[sea_orm(string_value = "resolved")]
    Resolved,
    /// Closed with no action.
    #[sea_orm(string_value = "dismissed")]
    Dismissed,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "forum_report")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub reporter_id: String,

    pub post_id: String,

    pub topic_id: String,

    /// Author of the reported post
    pub target_user_id: String,

    #[sea_orm(column_type = "Text")]
    pub reason: String,

    pub status: ReportStatus,

    /// Resolution kind chosen by the moderator, e.g. `delete_post`
    #[sea_orm(nullable)]
    pub resolution: Option<String>,

    #[sea_orm(nullable)]
    pub resolved_by: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub resolution_note: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub resolved_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::post::Entity",
        from = "Column::PostId",
        to = "super::post::Column::Id",
        on_delete = "Cascade"
    )]
    Post,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
