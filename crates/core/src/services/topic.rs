//! Topic and post lifecycle.
//!
//! Every mutation keeps the denormalized counters and last-post pointers of
//! topics and forums in step with the posts table inside one transaction.
//! Pointers are always re-derived from the remaining live posts after a
//! removal, never patched.

use agora_common::cache::keys;
use agora_common::{AppError, AppResult};
use agora_db::entities::{
    category, forum, poll, post, reputation_log::ReputationAction, topic,
};
use agora_db::map_db_err;
use agora_db::repositories::LastPost;
use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ConnectionTrait, Set};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::context::ForumContext;
use crate::services::authorization::{AuthorizationService, Principal};
use crate::services::notification::NotificationService;
use crate::services::poll::{CreatePollInput, PollService};
use crate::services::reputation::{
    POST_CREATED_POINTS, ReputationChange, ReputationService, TOPIC_CREATED_POINTS,
};
use crate::services::search::SearchService;
use crate::slug::{slugify, timestamp_suffix};

/// Input for starting a topic.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTopicInput {
    pub forum_id: String,

    #[validate(length(max = 255))]
    pub title: String,

    #[validate(length(max = 65536))]
    pub content: String,

    #[validate(nested)]
    pub poll: Option<CreatePollInput>,
}

/// Input for a reply or an edit.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PostContentInput {
    #[validate(length(max = 65536))]
    pub content: String,
}

/// A freshly created topic.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedTopic {
    pub topic_id: String,
    pub slug: String,
    pub post_id: String,
    pub poll_id: Option<String>,
}

/// A post as shown in a topic view. Deleted posts keep their place but
/// lose their content.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: String,
    pub user_id: String,
    pub content: Option<String>,
    pub is_deleted: bool,
    pub edited_by: Option<String>,
    pub edited_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
}

impl From<post::Model> for PostView {
    fn from(post: post::Model) -> Self {
        Self {
            content: (!post.is_deleted).then_some(post.content),
            id: post.id,
            user_id: post.user_id,
            is_deleted: post.is_deleted,
            edited_by: post.edited_by,
            edited_at: post.edited_at,
            created_at: post.created_at,
        }
    }
}

/// A topic with one page of its posts.
#[derive(Debug, Clone, Serialize)]
pub struct TopicView {
    pub topic: topic::Model,
    pub forum_id: String,
    pub forum_name: String,
    pub poll: Option<poll::Model>,
    pub posts: Vec<PostView>,
    pub page: u64,
    pub per_page: u64,
}

/// A category and its forums.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryWithForums {
    #[serde(flatten)]
    pub category: category::Model,
    pub forums: Vec<forum::Model>,
}

/// Every category with its forums, in display order.
#[derive(Debug, Clone, Serialize)]
pub struct ForumIndex {
    pub categories: Vec<CategoryWithForums>,
}

/// A forum with one page of its topics.
#[derive(Debug, Clone, Serialize)]
pub struct ForumView {
    pub forum: forum::Model,
    pub topics: Vec<topic::Model>,
    pub page: u64,
    pub per_page: u64,
}

fn require_text(value: &str, field: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidInput(format!("{field} cannot be empty")));
    }
    Ok(())
}

pub(crate) fn clamp_count(count: u64) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

fn page_offset(page: u64, per_page: u64) -> u64 {
    page.saturating_sub(1).saturating_mul(per_page)
}

/// Topic service.
#[derive(Clone)]
pub struct TopicService {
    ctx: ForumContext,
    auth: AuthorizationService,
    reputation: ReputationService,
    notifications: NotificationService,
    search: SearchService,
    polls: PollService,
}

impl TopicService {
    /// Create a new topic service.
    #[must_use]
    pub const fn new(
        ctx: ForumContext,
        auth: AuthorizationService,
        reputation: ReputationService,
        notifications: NotificationService,
        search: SearchService,
        polls: PollService,
    ) -> Self {
        Self {
            ctx,
            auth,
            reputation,
            notifications,
            search,
            polls,
        }
    }

    /// Start a topic with its first post.
    pub async fn create_topic(
        &self,
        principal: &Principal,
        input: CreateTopicInput,
    ) -> AppResult<CreatedTopic> {
        principal.ensure_not_banned()?;
        input.validate()?;
        require_text(&input.title, "Title")?;
        require_text(&input.content, "Content")?;
        if let Some(poll) = &input.poll {
            poll.check()?;
        }

        let (created, forum_id) = self
            .ctx
            .retry_on_conflict("topic slug", |attempt| {
                self.create_topic_once(principal, &input, attempt)
            })
            .await?;

        self.ctx
            .invalidate(&[keys::FORUM_INDEX.to_string(), keys::forum_view(&forum_id)])
            .await;

        info!(
            topic_id = %created.topic_id,
            forum_id = %forum_id,
            user_id = %principal.user_id,
            "Topic created"
        );
        Ok(created)
    }

    async fn create_topic_once(
        &self,
        principal: &Principal,
        input: &CreateTopicInput,
        attempt: u32,
    ) -> AppResult<(CreatedTopic, String)> {
        let txn = self.ctx.begin().await?;
        let repos = &self.ctx.repos;

        let forum = repos.forums.get_by_id(&txn, &input.forum_id).await?;
        if forum.is_locked && !principal.is_admin() {
            return Err(AppError::Forbidden("Forum is locked".to_string()));
        }
        if !self.auth.can_post(principal, &forum).await? {
            return Err(AppError::Forbidden(
                "You cannot start topics in this forum".to_string(),
            ));
        }

        let now = Utc::now();
        let title = input.title.trim();
        let topic = repos
            .topics
            .create(
                &txn,
                topic::ActiveModel {
                    id: Set(self.ctx.id_gen.generate()),
                    forum_id: Set(forum.id.clone()),
                    user_id: Set(principal.user_id.clone()),
                    title: Set(title.to_string()),
                    slug: Set(slugify(title, timestamp_suffix(attempt))),
                    views: Set(0),
                    replies: Set(0),
                    is_locked: Set(false),
                    is_pinned: Set(false),
                    is_announcement: Set(forum.name == self.ctx.config.announcement_forum_name),
                    poll_id: Set(None),
                    last_post_id: Set(None),
                    last_post_user_id: Set(None),
                    last_post_at: Set(None),
                    created_at: Set(now.into()),
                    updated_at: Set(now.into()),
                },
            )
            .await?;

        let post = self
            .insert_post(&txn, &topic.id, &principal.user_id, &input.content)
            .await?;
        let last = LastPost::from(&post);
        repos.topics.set_last_post(&txn, &topic.id, Some(&last)).await?;
        repos.forums.record_post(&txn, &forum.id, &last, true).await?;

        for (action, points, reason) in [
            (ReputationAction::TopicCreated, TOPIC_CREATED_POINTS, "Created a topic"),
            (ReputationAction::PostCreated, POST_CREATED_POINTS, "Created a post"),
        ] {
            self.reputation
                .award(
                    &txn,
                    ReputationChange {
                        user_id: &principal.user_id,
                        action,
                        points,
                        reason,
                        related_id: Some(&topic.id),
                    },
                )
                .await?;
        }

        let poll_id = match &input.poll {
            Some(poll_input) => {
                let poll = self.polls.create(&txn, &topic.id, poll_input).await?;
                repos.topics.set_poll(&txn, &topic.id, &poll.id).await?;
                Some(poll.id)
            }
            None => None,
        };

        self.search.index_post(&txn, &post).await?;
        self.notifications
            .fan_out_new_topic(&txn, &forum, &topic, &post.id)
            .await?;

        txn.commit().await.map_err(map_db_err)?;

        Ok((
            CreatedTopic {
                topic_id: topic.id,
                slug: topic.slug,
                post_id: post.id,
                poll_id,
            },
            forum.id,
        ))
    }

    /// Add a reply to a topic.
    pub async fn reply(
        &self,
        topic_id: &str,
        principal: &Principal,
        input: PostContentInput,
    ) -> AppResult<post::Model> {
        principal.ensure_not_banned()?;
        input.validate()?;
        require_text(&input.content, "Content")?;

        let txn = self.ctx.begin().await?;
        let repos = &self.ctx.repos;

        let topic = repos.topics.get_by_id(&txn, topic_id).await?;
        let forum = repos.forums.get_by_id(&txn, &topic.forum_id).await?;
        if (topic.is_locked || forum.is_locked) && !principal.is_admin() {
            return Err(AppError::Forbidden("Topic is locked".to_string()));
        }

        let post = self
            .insert_post(&txn, &topic.id, &principal.user_id, &input.content)
            .await?;
        let last = LastPost::from(&post);
        repos.topics.record_reply(&txn, &topic.id, &last).await?;
        repos.forums.record_post(&txn, &forum.id, &last, false).await?;

        self.search.index_post(&txn, &post).await?;
        let notified = self
            .notifications
            .fan_out_reply(&txn, &topic, &post.id, &principal.user_id)
            .await?;

        txn.commit().await.map_err(map_db_err)?;

        self.invalidate_topic(&forum.id, &topic.slug).await;
        info!(
            topic_id = %topic.id,
            post_id = %post.id,
            user_id = %principal.user_id,
            notified,
            "Reply created"
        );
        Ok(post)
    }

    /// Replace a post's content.
    pub async fn edit_post(
        &self,
        post_id: &str,
        principal: &Principal,
        input: PostContentInput,
    ) -> AppResult<post::Model> {
        principal.ensure_not_banned()?;
        input.validate()?;
        require_text(&input.content, "Content")?;

        let txn = self.ctx.begin().await?;
        let repos = &self.ctx.repos;

        let post = repos.posts.lock_by_id(&txn, post_id).await?;
        if post.is_deleted {
            return Err(AppError::NotFound(format!("Post {post_id}")));
        }
        principal.ensure_can_modify(&post.user_id)?;

        repos
            .posts
            .update_content(&txn, post_id, &input.content, &principal.user_id, Utc::now().into())
            .await?;
        self.search.reindex_post(&txn, post_id, &input.content).await?;

        let topic = repos.topics.get_by_id(&txn, &post.topic_id).await?;
        let updated = repos.posts.get_by_id(&txn, post_id).await?;
        txn.commit().await.map_err(map_db_err)?;

        self.ctx.invalidate(&[keys::topic_view(&topic.slug)]).await;
        Ok(updated)
    }

    /// Soft-delete a post as its author or an admin.
    pub async fn soft_delete_post(&self, post_id: &str, principal: &Principal) -> AppResult<()> {
        principal.ensure_not_banned()?;

        let txn = self.ctx.begin().await?;
        let repos = &self.ctx.repos;

        let post = repos.posts.lock_by_id(&txn, post_id).await?;
        principal.ensure_can_modify(&post.user_id)?;
        if post.is_deleted {
            return Err(AppError::InvalidInput("Post is already deleted".to_string()));
        }

        let topic = repos.topics.get_by_id(&txn, &post.topic_id).await?;
        self.soft_delete_in(&txn, &post, &topic, &principal.user_id)
            .await?;
        txn.commit().await.map_err(map_db_err)?;

        self.invalidate_topic(&topic.forum_id, &topic.slug).await;
        info!(post_id = %post_id, actor = %principal.user_id, "Post deleted");
        Ok(())
    }

    /// Hard-delete a topic as its author or an admin.
    pub async fn delete_topic(&self, topic_id: &str, principal: &Principal) -> AppResult<()> {
        principal.ensure_not_banned()?;

        let txn = self.ctx.begin().await?;
        let topic = self.ctx.repos.topics.get_by_id(&txn, topic_id).await?;
        principal.ensure_can_modify(&topic.user_id)?;

        self.delete_topic_in(&txn, &topic).await?;
        txn.commit().await.map_err(map_db_err)?;

        self.invalidate_topic(&topic.forum_id, &topic.slug).await;
        info!(topic_id = %topic_id, actor = %principal.user_id, "Topic deleted");
        Ok(())
    }

    /// Flag a post deleted and bring counters and pointers back in line.
    /// The caller holds the post's row lock and has checked that it is live.
    pub async fn soft_delete_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        post: &post::Model,
        topic: &topic::Model,
        actor_id: &str,
    ) -> AppResult<()> {
        let repos = &self.ctx.repos;
        repos
            .posts
            .set_deleted(conn, &post.id, Some((actor_id, Utc::now().into())))
            .await?;
        repos.topics.adjust_replies(conn, &topic.id, -1).await?;
        repos.forums.adjust_counts(conn, &topic.forum_id, 0, -1).await?;
        self.refresh_pointers(conn, &topic.id, &topic.forum_id).await
    }

    /// Undo a soft delete. The caller holds the post's row lock and has
    /// checked that it is deleted.
    pub async fn restore_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        post: &post::Model,
        topic: &topic::Model,
    ) -> AppResult<()> {
        let repos = &self.ctx.repos;
        repos.posts.set_deleted(conn, &post.id, None).await?;

        // The restored post may be the first one, so count instead of adding.
        let live = repos.posts.count_live_in_topic(conn, &topic.id).await?;
        repos
            .topics
            .set_replies(conn, &topic.id, clamp_count(live.saturating_sub(1)))
            .await?;
        repos.forums.adjust_counts(conn, &topic.forum_id, 0, 1).await?;
        self.refresh_pointers(conn, &topic.id, &topic.forum_id).await
    }

    /// Remove a topic with everything hanging off it and take its live
    /// posts out of the forum counters.
    pub async fn delete_topic_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        topic: &topic::Model,
    ) -> AppResult<()> {
        let repos = &self.ctx.repos;
        let live = repos.posts.count_live_in_topic(conn, &topic.id).await?;
        repos.topics.delete(conn, &topic.id).await?;
        repos
            .forums
            .adjust_counts(conn, &topic.forum_id, -1, -clamp_count(live))
            .await?;
        self.refresh_forum_pointer(conn, &topic.forum_id).await
    }

    /// Re-derive the topic and forum last-post pointers.
    pub async fn refresh_pointers<C: ConnectionTrait>(
        &self,
        conn: &C,
        topic_id: &str,
        forum_id: &str,
    ) -> AppResult<()> {
        let latest = self.ctx.repos.posts.latest_in_topic(conn, topic_id).await?;
        let last = latest.as_ref().map(LastPost::from);
        self.ctx
            .repos
            .topics
            .set_last_post(conn, topic_id, last.as_ref())
            .await?;
        self.refresh_forum_pointer(conn, forum_id).await
    }

    /// Re-derive the forum last-post pointer.
    pub async fn refresh_forum_pointer<C: ConnectionTrait>(
        &self,
        conn: &C,
        forum_id: &str,
    ) -> AppResult<()> {
        let latest = self.ctx.repos.posts.latest_in_forum(conn, forum_id).await?;
        let last = latest.as_ref().map(LastPost::from);
        self.ctx
            .repos
            .forums
            .set_last_post(conn, forum_id, last.as_ref())
            .await
    }

    async fn insert_post<C: ConnectionTrait>(
        &self,
        conn: &C,
        topic_id: &str,
        user_id: &str,
        content: &str,
    ) -> AppResult<post::Model> {
        self.ctx
            .repos
            .posts
            .create(
                conn,
                post::ActiveModel {
                    id: Set(self.ctx.id_gen.generate()),
                    topic_id: Set(topic_id.to_string()),
                    user_id: Set(user_id.to_string()),
                    content: Set(content.to_string()),
                    edited_by: Set(None),
                    edited_at: Set(None),
                    is_deleted: Set(false),
                    deleted_by: Set(None),
                    deleted_at: Set(None),
                    created_at: Set(Utc::now().into()),
                },
            )
            .await
    }

    async fn invalidate_topic(&self, forum_id: &str, slug: &str) {
        self.ctx
            .invalidate(&[
                keys::FORUM_INDEX.to_string(),
                keys::forum_view(forum_id),
                keys::topic_view(slug),
            ])
            .await;
    }

    /// Count one view of a topic.
    pub async fn record_view(&self, slug: &str) -> AppResult<()> {
        if !self.ctx.repos.topics.increment_views(slug).await? {
            return Err(AppError::NotFound(format!("Topic {slug}")));
        }
        Ok(())
    }

    /// A topic with one page of posts.
    pub async fn view_topic(
        &self,
        slug: &str,
        page: Option<u64>,
        per_page: Option<u64>,
    ) -> AppResult<TopicView> {
        let repos = &self.ctx.repos;
        let topic = repos
            .topics
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Topic {slug}")))?;
        let forum = repos.forums.get_by_id(self.ctx.db.as_ref(), &topic.forum_id).await?;

        let (page, per_page) = self.ctx.page_window(page, per_page);
        let posts = repos
            .posts
            .list_by_topic(&topic.id, per_page, page_offset(page, per_page))
            .await?;

        let poll = match topic.poll_id {
            Some(_) => self.polls.find_by_topic(&topic.id).await?,
            None => None,
        };

        Ok(TopicView {
            forum_id: forum.id,
            forum_name: forum.name,
            poll,
            posts: posts.into_iter().map(PostView::from).collect(),
            topic,
            page,
            per_page,
        })
    }

    /// Every category with its forums.
    pub async fn forum_index(&self) -> AppResult<ForumIndex> {
        let categories = self.ctx.repos.categories.list_ordered().await?;
        let forums = self.ctx.repos.forums.list_ordered().await?;

        let categories = categories
            .into_iter()
            .map(|category| CategoryWithForums {
                forums: forums
                    .iter()
                    .filter(|f| f.category_id == category.id)
                    .cloned()
                    .collect(),
                category,
            })
            .collect();

        Ok(ForumIndex { categories })
    }

    /// A forum with one page of topics, pinned first.
    pub async fn forum_view(
        &self,
        forum_id: &str,
        page: Option<u64>,
        per_page: Option<u64>,
    ) -> AppResult<ForumView> {
        let forum = self
            .ctx
            .repos
            .forums
            .get_by_id(self.ctx.db.as_ref(), forum_id)
            .await?;

        let (page, per_page) = self.ctx.page_window(page, per_page);
        let topics = self
            .ctx
            .repos
            .topics
            .list_by_forum(forum_id, per_page, page_offset(page, per_page))
            .await?;

        Ok(ForumView {
            forum,
            topics,
            page,
            per_page,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use agora_common::{ForumConfig, NoOpResponseCache};
    use agora_db::entities::user::UserRole;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::Arc;

    fn service_over(db: DatabaseConnection) -> TopicService {
        let ctx = ForumContext::new(
            Arc::new(db),
            Arc::new(NoOpResponseCache),
            ForumConfig::default(),
        );
        TopicService::new(
            ctx.clone(),
            AuthorizationService::new(ctx.clone()),
            ReputationService::new(ctx.clone()),
            NotificationService::new(ctx.clone()),
            SearchService::new(ctx.clone()),
            PollService::new(ctx),
        )
    }

    fn empty_service() -> TopicService {
        service_over(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
    }

    fn member(user_id: &str) -> Principal {
        Principal {
            user_id: user_id.to_string(),
            username: format!("{user_id}_name"),
            role: UserRole::User,
            group_ids: vec![],
            in_moderator_group: false,
            in_admin_group: false,
            banned: false,
        }
    }

    fn create_test_topic(is_locked: bool) -> topic::Model {
        topic::Model {
            id: "t1".to_string(),
            forum_id: "f1".to_string(),
            user_id: "author".to_string(),
            title: "Hello World".to_string(),
            slug: "hello-world-1".to_string(),
            views: 0,
            replies: 0,
            is_locked,
            is_pinned: false,
            is_announcement: false,
            poll_id: None,
            last_post_id: None,
            last_post_user_id: None,
            last_post_at: None,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    fn create_test_forum() -> forum::Model {
        forum::Model {
            id: "f1".to_string(),
            category_id: "c1".to_string(),
            name: "General".to_string(),
            description: None,
            display_order: 0,
            is_locked: false,
            topics_count: 1,
            posts_count: 1,
            last_post_id: None,
            last_post_topic_id: None,
            last_post_user_id: None,
            last_post_at: None,
            created_at: Utc::now().into(),
        }
    }

    fn create_test_post(is_deleted: bool) -> post::Model {
        post::Model {
            id: "p1".to_string(),
            topic_id: "t1".to_string(),
            user_id: "author".to_string(),
            content: "first".to_string(),
            edited_by: None,
            edited_at: None,
            is_deleted,
            deleted_by: None,
            deleted_at: None,
            created_at: Utc::now().into(),
        }
    }

    fn topic_input(title: &str, content: &str) -> CreateTopicInput {
        CreateTopicInput {
            forum_id: "f1".to_string(),
            title: title.to_string(),
            content: content.to_string(),
            poll: None,
        }
    }

    #[tokio::test]
    async fn test_create_topic_blank_title() {
        let result = empty_service()
            .create_topic(&member("u1"), topic_input("   ", "body"))
            .await;
        assert!(matches!(result, Err(AppError::InvalidInput(msg)) if msg.contains("Title")));
    }

    #[tokio::test]
    async fn test_create_topic_blank_content() {
        let result = empty_service()
            .create_topic(&member("u1"), topic_input("Hello", "\n"))
            .await;
        assert!(matches!(result, Err(AppError::InvalidInput(msg)) if msg.contains("Content")));
    }

    #[tokio::test]
    async fn test_create_topic_with_single_option_poll() {
        let mut input = topic_input("Hello", "body");
        input.poll = Some(CreatePollInput {
            question: "Which?".to_string(),
            choices: vec!["only".to_string()],
            allow_revote: false,
            expires_in: None,
        });
        let result = empty_service().create_topic(&member("u1"), input).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_create_topic_missing_forum() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<forum::Model>::new()])
            .into_connection();
        let result = service_over(db)
            .create_topic(&member("u1"), topic_input("Hello", "body"))
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_banned_user_cannot_create_topic() {
        let mut banned = member("u1");
        banned.banned = true;
        let result = empty_service()
            .create_topic(&banned, topic_input("Hello", "body"))
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(msg)) if msg == "banned"));
    }

    #[tokio::test]
    async fn test_reply_to_missing_topic() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<topic::Model>::new()])
            .into_connection();
        let result = service_over(db)
            .reply(
                "t1",
                &member("u1"),
                PostContentInput {
                    content: "hi".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_reply_to_locked_topic_forbidden() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_topic(true)]])
            .append_query_results([[create_test_forum()]])
            .into_connection();
        let result = service_over(db)
            .reply(
                "t1",
                &member("u1"),
                PostContentInput {
                    content: "hi".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_edit_deleted_post_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_post(true)]])
            .into_connection();
        let result = service_over(db)
            .edit_post(
                "p1",
                &member("author"),
                PostContentInput {
                    content: "new".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_edit_by_other_user_forbidden() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_post(false)]])
            .into_connection();
        let result = service_over(db)
            .edit_post(
                "p1",
                &member("someone-else"),
                PostContentInput {
                    content: "new".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_soft_delete_twice_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_post(true)]])
            .into_connection();
        let result = service_over(db)
            .soft_delete_post("p1", &member("author"))
            .await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_delete_topic_by_other_user_forbidden() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_topic(false)]])
            .into_connection();
        let result = service_over(db).delete_topic("t1", &member("u1")).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_deleted_post_view_hides_content() {
        let view = PostView::from(create_test_post(true));
        assert!(view.is_deleted);
        assert_eq!(view.content, None);

        let view = PostView::from(create_test_post(false));
        assert_eq!(view.content.as_deref(), Some("first"));
    }

    #[test]
    fn test_page_offset() {
        assert_eq!(page_offset(1, 20), 0);
        assert_eq!(page_offset(3, 20), 40);
        assert_eq!(page_offset(0, 20), 0);
    }
}
