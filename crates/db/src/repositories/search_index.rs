//! Search index repository.
//!
//! One entry per post. Entries outlive soft deletion; deleted posts are
//! filtered out when querying.

use std::sync::Arc;

use crate::entities::{Post, SearchIndex, Topic, User, post, search_index, topic, user};
use crate::map_db_err;
use agora_common::AppResult;
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, Query, SelectStatement};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
};
use serde::Deserialize;

/// Result ordering for searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchSort {
    /// Most viewed topics first.
    #[default]
    Relevance,
    /// Most recently active topics first.
    Recent,
    /// Topics with the most replies first.
    Replies,
}

/// Search parameters.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    /// Text to look for, already trimmed.
    pub query: String,
    /// Restrict to one forum.
    pub forum_id: Option<String>,
    /// Restrict to topics started by users whose name contains this.
    pub author: Option<String>,
    /// Result order.
    pub sort: SearchSort,
    /// Page size.
    pub limit: u64,
    /// Page offset.
    pub offset: u64,
}

/// Search index repository.
#[derive(Clone)]
pub struct SearchIndexRepository {
    db: Arc<DatabaseConnection>,
}

/// `%text%` with LIKE metacharacters escaped, lowercased.
fn contains_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('%');
    for c in text.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

impl SearchIndexRepository {
    /// Create a new search index repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Index a post.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: search_index::ActiveModel,
    ) -> AppResult<search_index::Model> {
        model.insert(conn).await.map_err(map_db_err)
    }

    /// Replace the indexed text of a post.
    pub async fn update_content<C: ConnectionTrait>(
        &self,
        conn: &C,
        post_id: &str,
        content: &str,
    ) -> AppResult<()> {
        SearchIndex::update_many()
            .col_expr(
                search_index::Column::ContentText,
                Expr::value(content.to_string()),
            )
            .col_expr(
                search_index::Column::UpdatedAt,
                Expr::value(sea_orm::prelude::DateTimeWithTimeZone::from(Utc::now())),
            )
            .filter(search_index::Column::PostId.eq(post_id))
            .exec(conn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    /// Remove every entry. Returns how many were removed.
    pub async fn delete_all<C: ConnectionTrait>(&self, conn: &C) -> AppResult<u64> {
        let result = SearchIndex::delete_many()
            .exec(conn)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected)
    }

    /// Topics with at least one live post containing the query, plus the
    /// total number of matches.
    pub async fn search(&self, filter: &SearchFilter) -> AppResult<(Vec<topic::Model>, u64)> {
        let total = self
            .matching_topics(filter)
            .count(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        let query = match filter.sort {
            SearchSort::Relevance => self
                .matching_topics(filter)
                .order_by_desc(topic::Column::Views),
            SearchSort::Recent => self
                .matching_topics(filter)
                .order_by_desc(topic::Column::UpdatedAt),
            SearchSort::Replies => self
                .matching_topics(filter)
                .order_by_desc(topic::Column::Replies),
        };

        let topics = query
            .order_by_desc(topic::Column::Id)
            .offset(filter.offset)
            .limit(filter.limit)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok((topics, total))
    }

    fn matching_topics(&self, filter: &SearchFilter) -> Select<Topic> {
        let mut query = Topic::find().filter(topic::Column::Id.in_subquery(content_match(&filter.query)));

        if let Some(forum_id) = &filter.forum_id {
            query = query.filter(topic::Column::ForumId.eq(forum_id.as_str()));
        }

        if let Some(author) = filter.author.as_deref().filter(|a| !a.is_empty()) {
            query = query.filter(topic::Column::UserId.in_subquery(author_match(author)));
        }

        query
    }
}

/// Topic IDs whose live posts contain `text`, case-insensitively.
fn content_match(text: &str) -> SelectStatement {
    Query::select()
        .column((SearchIndex, search_index::Column::TopicId))
        .from(SearchIndex)
        .inner_join(
            Post,
            Expr::col((Post, post::Column::Id))
                .equals((SearchIndex, search_index::Column::PostId)),
        )
        .and_where(Expr::col((Post, post::Column::IsDeleted)).eq(false))
        .and_where(
            Expr::expr(Func::lower(Expr::col((
                SearchIndex,
                search_index::Column::ContentText,
            ))))
            .like(contains_pattern(text)),
        )
        .to_owned()
}

/// User IDs whose username contains `name`, case-insensitively.
fn author_match(name: &str) -> SelectStatement {
    Query::select()
        .column(user::Column::Id)
        .from(User)
        .and_where(Expr::expr(Func::lower(Expr::col(user::Column::Username))).like(contains_pattern(name)))
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern() {
        assert_eq!(contains_pattern("Rust"), "%rust%");
        assert_eq!(contains_pattern("100%_"), "%100\\%\\_%");
    }

    #[test]
    fn test_default_sort_is_relevance() {
        assert_eq!(SearchSort::default(), SearchSort::Relevance);
        let sort: SearchSort = serde_json::from_str("\"replies\"").unwrap_or_default();
        assert_eq!(sort, SearchSort::Replies);
    }
}
