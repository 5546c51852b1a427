//! Post report repository.

use std::sync::Arc;

use crate::entities::{Report, report, report::ReportStatus};
use crate::map_db_err;
use agora_common::{AppError, AppResult};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

/// How a report was closed.
#[derive(Debug, Clone, Copy)]
pub struct ReportClosure<'a> {
    /// `Resolved` or `Dismissed`.
    pub status: ReportStatus,
    /// Resolution kind, e.g. `delete_post`.
    pub resolution: &'a str,
    pub resolved_by: &'a str,
    pub note: Option<&'a str>,
    pub resolved_at: DateTimeWithTimeZone,
}

/// Post report repository.
#[derive(Clone)]
pub struct ReportRepository {
    db: Arc<DatabaseConnection>,
}

impl ReportRepository {
    /// Create a new report repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert a report.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: report::ActiveModel,
    ) -> AppResult<report::Model> {
        model.insert(conn).await.map_err(map_db_err)
    }

    /// Get a report by ID and hold a row lock on it until the transaction ends.
    pub async fn lock_by_id<C: ConnectionTrait>(&self, conn: &C, id: &str) -> AppResult<report::Model> {
        Report::find_by_id(id)
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| AppError::NotFound(format!("Report {id}")))
    }

    /// A reporter's open report on a post.
    pub async fn find_pending_by<C: ConnectionTrait>(
        &self,
        conn: &C,
        reporter_id: &str,
        post_id: &str,
    ) -> AppResult<Option<report::Model>> {
        Report::find()
            .filter(report::Column::ReporterId.eq(reporter_id))
            .filter(report::Column::PostId.eq(post_id))
            .filter(report::Column::Status.eq(ReportStatus::Pending))
            .one(conn)
            .await
            .map_err(map_db_err)
    }

    /// Open reports, newest first.
    pub async fn pending(&self, limit: u64, offset: u64) -> AppResult<Vec<report::Model>> {
        Report::find()
            .filter(report::Column::Status.eq(ReportStatus::Pending))
            .order_by_desc(report::Column::CreatedAt)
            .order_by_desc(report::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Number of open reports.
    pub async fn count_pending(&self) -> AppResult<u64> {
        Report::find()
            .filter(report::Column::Status.eq(ReportStatus::Pending))
            .count(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Close a pending report. Returns `Conflict` if it was no longer pending.
    pub async fn close<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
        closure: ReportClosure<'_>,
    ) -> AppResult<()> {
        let result = Report::update_many()
            .col_expr(report::Column::Status, Expr::value(closure.status))
            .col_expr(
                report::Column::Resolution,
                Expr::value(closure.resolution.to_string()),
            )
            .col_expr(
                report::Column::ResolvedBy,
                Expr::value(closure.resolved_by.to_string()),
            )
            .col_expr(
                report::Column::ResolutionNote,
                Expr::value(closure.note.map(ToString::to_string)),
            )
            .col_expr(report::Column::ResolvedAt, Expr::value(closure.resolved_at))
            .filter(report::Column::Id.eq(id))
            .filter(report::Column::Status.eq(ReportStatus::Pending))
            .exec(conn)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(AppError::Conflict(format!("Report {id} is already closed")));
        }
        Ok(())
    }
}
