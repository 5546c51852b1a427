//! Database entities.

#![allow(missing_docs)]

pub mod ban;
pub mod bookmark;
pub mod category;
pub mod forum;
pub mod forum_permission;
pub mod group_membership;
pub mod moderation_log;
pub mod notification;
pub mod poll;
pub mod poll_vote;
pub mod post;
pub mod post_vote;
pub mod report;
pub mod reputation_log;
pub mod search_index;
pub mod subscription;
pub mod topic;
pub mod user;
pub mod user_badge;
pub mod user_group;
pub mod warning;

pub use ban::Entity as Ban;
pub use bookmark::Entity as Bookmark;
pub use category::Entity as Category;
pub use forum::Entity as Forum;
pub use forum_permission::Entity as ForumPermission;
pub use group_membership::Entity as GroupMembership;
pub use moderation_log::Entity as ModerationLog;
pub use notification::Entity as Notification;
pub use poll::Entity as Poll;
pub use poll_vote::Entity as PollVote;
pub use post::Entity as Post;
pub use post_vote::Entity as PostVote;
pub use report::Entity as Report;
pub use reputation_log::Entity as ReputationLog;
pub use search_index::Entity as SearchIndex;
pub use subscription::Entity as Subscription;
pub use topic::Entity as Topic;
pub use user::Entity as User;
pub use user_badge::Entity as UserBadge;
pub use user_group::Entity as UserGroup;
pub use warning::Entity as Warning;
