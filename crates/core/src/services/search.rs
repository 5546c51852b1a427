//! Search index maintenance and topic search.

use agora_common::{AppError, AppResult};
use agora_db::entities::{post, search_index, topic};
use agora_db::repositories::{SearchFilter, SearchSort};
use chrono::Utc;
use sea_orm::{ConnectionTrait, Set};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::ForumContext;

/// Posts read per batch while rebuilding the index.
const REBUILD_BATCH: u64 = 500;

/// Search request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchInput {
    #[serde(rename = "q")]
    pub query: String,
    pub forum_id: Option<String>,
    pub author: Option<String>,
    #[serde(default)]
    pub sort: SearchSort,
    /// One-based page number.
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// A page of matching topics.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub topics: Vec<topic::Model>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Search service.
#[derive(Clone)]
pub struct SearchService {
    ctx: ForumContext,
}

impl SearchService {
    /// Create a new search service.
    #[must_use]
    pub const fn new(ctx: ForumContext) -> Self {
        Self { ctx }
    }

    /// Index a freshly created post.
    pub async fn index_post<C: ConnectionTrait>(
        &self,
        conn: &C,
        post: &post::Model,
    ) -> AppResult<()> {
        let now = Utc::now();
        self.ctx
            .repos
            .search
            .create(
                conn,
                search_index::ActiveModel {
                    id: Set(self.ctx.id_gen.generate()),
                    post_id: Set(post.id.clone()),
                    topic_id: Set(post.topic_id.clone()),
                    user_id: Set(post.user_id.clone()),
                    content_text: Set(post.content.clone()),
                    created_at: Set(now.into()),
                    updated_at: Set(now.into()),
                },
            )
            .await?;
        Ok(())
    }

    /// Replace the indexed text of an edited post.
    pub async fn reindex_post<C: ConnectionTrait>(
        &self,
        conn: &C,
        post_id: &str,
        content: &str,
    ) -> AppResult<()> {
        self.ctx
            .repos
            .search
            .update_content(conn, post_id, content)
            .await
    }

    /// Drop every entry and index all posts again, deleted ones included so
    /// a later restore is searchable. Returns the number of posts indexed.
    pub async fn rebuild<C: ConnectionTrait>(&self, conn: &C) -> AppResult<u64> {
        let cleared = self.ctx.repos.search.delete_all(conn).await?;
        debug!(cleared, "Search index cleared");

        let mut indexed = 0;
        let mut after: Option<String> = None;
        loop {
            let batch = self
                .ctx
                .repos
                .posts
                .list_after(conn, after.as_deref(), REBUILD_BATCH)
                .await?;
            let Some(last) = batch.last() else {
                break;
            };
            after = Some(last.id.clone());

            for post in &batch {
                self.index_post(conn, post).await?;
            }
            indexed += batch.len() as u64;
        }
        Ok(indexed)
    }

    /// Find topics whose live posts contain the query.
    pub async fn search(&self, input: SearchInput) -> AppResult<SearchResults> {
        let query = input.query.trim();
        let min_len = self.ctx.config.search_min_query_len;
        if query.chars().count() < min_len {
            return Err(AppError::InvalidInput(format!(
                "Search query must be at least {min_len} characters"
            )));
        }

        let per_page = self.ctx.page_size(input.per_page);
        let page = input.page.unwrap_or(1).max(1);

        let filter = SearchFilter {
            query: query.to_string(),
            forum_id: input.forum_id,
            author: input.author.map(|a| a.trim().to_string()),
            sort: input.sort,
            limit: per_page,
            offset: (page - 1).saturating_mul(per_page),
        };

        let (topics, total) = self.ctx.repos.search.search(&filter).await?;
        Ok(SearchResults {
            topics,
            total,
            page,
            per_page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_common::{ForumConfig, NoOpResponseCache};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn service() -> SearchService {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        SearchService::new(ForumContext::new(
            db,
            Arc::new(NoOpResponseCache),
            ForumConfig::default(),
        ))
    }

    #[tokio::test]
    async fn test_short_query_rejected() {
        let result = service()
            .search(SearchInput {
                query: "  ab  ".to_string(),
                ..SearchInput::default()
            })
            .await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_blank_query_rejected() {
        let result = service().search(SearchInput::default()).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
}
