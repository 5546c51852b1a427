//! User ban entity.
//!
//! At most one active, unexpired ban per user. The rule is enforced by the
//! moderation service, not by a constraint.

use chrono::Utc;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ban duration kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum BanType {
    #[sea_orm(string_value = "temporary")]
    Temporary,
    #[sea_orm(string_value = "permanent")]
    Permanent,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_ban")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub user_id: String,

    pub banned_by: String,

    #[sea_orm(column_type = "Text")]
    pub reason: String,

    pub ban_type: BanType,

    /// None for permanent bans
    #[sea_orm(nullable)]
    pub expires_at: Option<DateTimeWithTimeZone>,

    #[sea_orm(default_value = true)]
    pub is_active: bool,

    #[sea_orm(nullable)]
    pub lifted_by: Option<String>,

    #[sea_orm(nullable)]
    pub lifted_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Whether the ban currently restricts the user.
    #[must_use]
    pub fn is_in_effect(&self) -> bool {
        self.is_active && self.expires_at.is_none_or(|at| at > Utc::now())
    }
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
