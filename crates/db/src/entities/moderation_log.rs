//! Moderation audit log. Rows are never updated or deleted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Logged moderation action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum ModerationLogAction {
    #[sea_orm(string_value = "lock_topic")]
    LockTopic,
    #[sea_orm(string_value = "unlock_topic")]
    UnlockTopic,
    #[sea_orm(string_value = "pin_topic")]
    PinTopic,
    #[sea_orm(string_value = "unpin_topic")]
    UnpinTopic,
    #[sea_orm(string_value = "move_topic")]
    MoveTopic,
    #[sea_orm(string_value = "delete_topic")]
    DeleteTopic,
    #[sea_orm(string_value = "delete_post")]
    DeletePost,
    #[sea_orm(string_value = "restore_post")]
    RestorePost,
    #[sea_orm(string_value = "warn_user")]
    WarnUser,
    #[sea_orm(string_value = "ban_user")]
    BanUser,
    #[sea_orm(string_value = "unban_user")]
    UnbanUser,
    #[sea_orm(string_value = "resolve_report")]
    ResolveReport,
}

/// Kind of record a moderation action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum ModerationTarget {
    #[sea_orm(string_value = "topic")]
    Topic,
    #[sea_orm(string_value = "post")]
    Post,
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "report")]
    Report,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "moderation_log")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub moderator_id: String,

    pub action: ModerationLogAction,

    pub target_type: ModerationTarget,

    /// Not a foreign key: the target may be hard-deleted later
    pub target_id: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub reason: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub details: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
