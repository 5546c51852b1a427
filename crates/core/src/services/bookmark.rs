//! Topic bookmarks.

use agora_common::{AppError, AppResult};
use agora_db::entities::{bookmark, topic};
use chrono::Utc;
use sea_orm::Set;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Serialize;

use crate::context::ForumContext;
use crate::services::authorization::Principal;

/// A bookmark with the topic it points at.
#[derive(Debug, Clone, Serialize)]
pub struct BookmarkedTopic {
    pub bookmark_id: String,
    pub bookmarked_at: DateTimeWithTimeZone,
    pub topic: topic::Model,
}

/// Bookmark service.
#[derive(Clone)]
pub struct BookmarkService {
    ctx: ForumContext,
}

impl BookmarkService {
    /// Create a new bookmark service.
    #[must_use]
    pub const fn new(ctx: ForumContext) -> Self {
        Self { ctx }
    }

    /// Bookmark a topic.
    pub async fn add(&self, principal: &Principal, topic_id: &str) -> AppResult<bookmark::Model> {
        self.ctx
            .repos
            .topics
            .get_by_id(self.ctx.db.as_ref(), topic_id)
            .await?;

        let repo = &self.ctx.repos.bookmarks;
        if repo.find(&principal.user_id, topic_id).await?.is_some() {
            return Err(AppError::Conflict("Already bookmarked".to_string()));
        }

        repo.create(bookmark::ActiveModel {
            id: Set(self.ctx.id_gen.generate()),
            user_id: Set(principal.user_id.clone()),
            topic_id: Set(topic_id.to_string()),
            created_at: Set(Utc::now().into()),
        })
        .await
    }

    /// Remove a bookmark.
    pub async fn remove(&self, principal: &Principal, topic_id: &str) -> AppResult<()> {
        if !self
            .ctx
            .repos
            .bookmarks
            .delete(&principal.user_id, topic_id)
            .await?
        {
            return Err(AppError::NotFound("Bookmark".to_string()));
        }
        Ok(())
    }

    /// The principal's bookmarks, newest first. Bookmarks whose topic has
    /// gone are skipped.
    pub async fn list(
        &self,
        principal: &Principal,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<BookmarkedTopic>> {
        let bookmarks = self
            .ctx
            .repos
            .bookmarks
            .list_by_user(&principal.user_id, limit, until_id)
            .await?;

        let topic_ids: Vec<String> = bookmarks.iter().map(|b| b.topic_id.clone()).collect();
        let topics = self.ctx.repos.topics.find_by_ids(&topic_ids).await?;

        Ok(bookmarks
            .into_iter()
            .filter_map(|b| {
                let topic = topics.iter().find(|t| t.id == b.topic_id)?.clone();
                Some(BookmarkedTopic {
                    bookmark_id: b.id,
                    bookmarked_at: b.created_at,
                    topic,
                })
            })
            .collect())
    }
}
