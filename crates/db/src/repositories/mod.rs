//! Repositories over the forum tables.

mod ban_warning;
mod bookmark;
mod category;
mod forum;
mod group;
mod moderation_log;
mod notification;
mod poll;
mod post;
mod report;
mod reputation;
mod search_index;
mod subscription;
mod topic;
mod user;
mod vote;

pub use ban_warning::BanRepository;
pub use bookmark::BookmarkRepository;
pub use category::CategoryRepository;
pub use forum::ForumRepository;
pub use group::GroupRepository;
pub use moderation_log::ModerationLogRepository;
pub use notification::NotificationRepository;
pub use poll::PollRepository;
pub use post::PostRepository;
pub use report::{ReportClosure, ReportRepository};
pub use reputation::ReputationRepository;
pub use search_index::{SearchFilter, SearchIndexRepository, SearchSort};
pub use subscription::SubscriptionRepository;
pub use topic::TopicRepository;
pub use user::UserRepository;
pub use vote::{VoteRepository, VoteTally};

use crate::entities::post as post_entity;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::ColumnTrait;

/// Denormalized "last post" reference kept on topics and forums.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastPost {
    /// Post ID.
    pub post_id: String,
    /// Topic the post belongs to.
    pub topic_id: String,
    /// Post author.
    pub user_id: String,
    /// Post creation time.
    pub created_at: DateTimeWithTimeZone,
}

impl From<&post_entity::Model> for LastPost {
    fn from(post: &post_entity::Model) -> Self {
        Self {
            post_id: post.id.clone(),
            topic_id: post.topic_id.clone(),
            user_id: post.user_id.clone(),
            created_at: post.created_at,
        }
    }
}

/// `col + delta`, never going below zero.
pub(crate) fn add_floored<C: ColumnTrait>(col: C, delta: i32) -> SimpleExpr {
    if delta >= 0 {
        Expr::col(col).add(delta)
    } else {
        Expr::case(Expr::col(col).lt(-delta), 0)
            .finally(Expr::col(col).add(delta))
            .into()
    }
}
