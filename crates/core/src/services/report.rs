//! Post reports and the moderation queue.
//!
//! Members file reports against posts. Moderators work through the pending
//! queue and close each report either by dismissing it or by applying a
//! moderation action to the reported post or its author. The action, the
//! closure and its audit entry commit together.

use agora_common::{AppError, AppResult};
use agora_db::entities::{
    ban::BanType,
    moderation_log::{ModerationLogAction, ModerationTarget},
    report::{self, ReportStatus},
};
use agora_db::map_db_err;
use agora_db::repositories::ReportClosure;
use chrono::Utc;
use sea_orm::Set;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::context::ForumContext;
use crate::services::authorization::Principal;
use crate::services::moderation::{LogLine, ModerationAction, ModerationService};

/// Longest accepted report reason, in characters.
pub const MAX_REASON_CHARS: usize = 2000;

/// Input for reporting a post.
#[derive(Debug, Clone, Deserialize)]
pub struct FileReportInput {
    pub post_id: String,
    pub reason: String,
}

/// How a moderator closes a report.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ReportResolution {
    Dismiss,
    DeletePost,
    WarnUser {
        points: Option<i32>,
    },
    BanUser {
        ban_type: BanType,
        expires_at: Option<DateTimeWithTimeZone>,
    },
}

impl ReportResolution {
    /// Stored name of this resolution.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Dismiss => "dismiss",
            Self::DeletePost => "delete_post",
            Self::WarnUser { .. } => "warn_user",
            Self::BanUser { .. } => "ban_user",
        }
    }

    const fn status(&self) -> ReportStatus {
        match self {
            Self::Dismiss => ReportStatus::Dismissed,
            _ => ReportStatus::Resolved,
        }
    }

    /// The moderation action this resolution applies to a report's target.
    #[must_use]
    pub fn action_for(&self, report: &report::Model) -> Option<ModerationAction> {
        match self {
            Self::Dismiss => None,
            Self::DeletePost => Some(ModerationAction::DeletePost {
                post_id: report.post_id.clone(),
            }),
            Self::WarnUser { points } => Some(ModerationAction::WarnUser {
                user_id: report.target_user_id.clone(),
                points: *points,
                expires_at: None,
            }),
            Self::BanUser {
                ban_type,
                expires_at,
            } => Some(ModerationAction::BanUser {
                user_id: report.target_user_id.clone(),
                ban_type: *ban_type,
                expires_at: *expires_at,
            }),
        }
    }
}

/// A page of the pending queue.
#[derive(Debug, Clone, Serialize)]
pub struct ReportPage {
    pub reports: Vec<report::Model>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

fn checked_reason(reason: &str) -> AppResult<&str> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(AppError::InvalidInput("A reason is required".to_string()));
    }
    if reason.chars().count() > MAX_REASON_CHARS {
        return Err(AppError::InvalidInput("Report reason too long".to_string()));
    }
    Ok(reason)
}

/// Report service.
#[derive(Clone)]
pub struct ReportService {
    ctx: ForumContext,
    moderation: ModerationService,
}

impl ReportService {
    /// Create a new report service.
    #[must_use]
    pub const fn new(ctx: ForumContext, moderation: ModerationService) -> Self {
        Self { ctx, moderation }
    }

    /// Report a live post. One open report per reporter and post.
    pub async fn file(
        &self,
        principal: &Principal,
        input: FileReportInput,
    ) -> AppResult<report::Model> {
        principal.ensure_not_banned()?;
        let reason = checked_reason(&input.reason)?;

        let repos = &self.ctx.repos;
        let conn = self.ctx.db.as_ref();

        let post = repos.posts.get_by_id(conn, &input.post_id).await?;
        if post.is_deleted {
            return Err(AppError::NotFound(format!("Post {}", input.post_id)));
        }
        if post.user_id == principal.user_id {
            return Err(AppError::InvalidInput(
                "Cannot report your own post".to_string(),
            ));
        }
        if repos
            .reports
            .find_pending_by(conn, &principal.user_id, &post.id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Post already reported".to_string()));
        }

        let report = repos
            .reports
            .create(
                conn,
                report::ActiveModel {
                    id: Set(self.ctx.id_gen.generate()),
                    reporter_id: Set(principal.user_id.clone()),
                    post_id: Set(post.id.clone()),
                    topic_id: Set(post.topic_id.clone()),
                    target_user_id: Set(post.user_id.clone()),
                    reason: Set(reason.to_string()),
                    status: Set(ReportStatus::Pending),
                    resolution: Set(None),
                    resolved_by: Set(None),
                    resolution_note: Set(None),
                    created_at: Set(Utc::now().into()),
                    resolved_at: Set(None),
                },
            )
            .await?;

        info!(report_id = %report.id, post_id = %post.id, reporter = %principal.user_id, "Report filed");
        Ok(report)
    }

    /// One page of open reports, newest first. Moderators only.
    pub async fn pending(
        &self,
        principal: &Principal,
        page: Option<u64>,
        per_page: Option<u64>,
    ) -> AppResult<ReportPage> {
        principal.ensure_can_moderate()?;

        let per_page = self.ctx.page_size(per_page);
        let page = page.unwrap_or(1).max(1);
        let offset = (page - 1).saturating_mul(per_page);

        let reports = self.ctx.repos.reports.pending(per_page, offset).await?;
        let total = self.ctx.repos.reports.count_pending().await?;
        Ok(ReportPage {
            reports,
            total,
            page,
            per_page,
        })
    }

    /// Close a pending report, applying the chosen action. Moderators only.
    pub async fn resolve(
        &self,
        principal: &Principal,
        report_id: &str,
        resolution: ReportResolution,
        reason: Option<String>,
    ) -> AppResult<report::Model> {
        principal.ensure_can_moderate()?;
        principal.ensure_not_banned()?;

        let repos = &self.ctx.repos;
        let txn = self.ctx.begin().await?;

        let report = repos.reports.lock_by_id(&txn, report_id).await?;
        if report.status != ReportStatus::Pending {
            return Err(AppError::InvalidInput("Report already resolved".to_string()));
        }

        let mut stale = Vec::new();
        if let Some(action) = resolution.action_for(&report) {
            // Another report may already have taken the post down.
            let already_done = matches!(action, ModerationAction::DeletePost { .. })
                && repos.posts.lock_by_id(&txn, &report.post_id).await?.is_deleted;
            if !already_done {
                let (_, keys) = self
                    .moderation
                    .apply_in(&txn, principal, &action, reason.as_deref())
                    .await?;
                stale = keys;
            }
        }

        let note = reason.as_deref().map(str::trim).filter(|r| !r.is_empty());
        repos
            .reports
            .close(
                &txn,
                report_id,
                ReportClosure {
                    status: resolution.status(),
                    resolution: resolution.as_str(),
                    resolved_by: &principal.user_id,
                    note,
                    resolved_at: Utc::now().into(),
                },
            )
            .await?;
        self.moderation
            .record(
                &txn,
                principal,
                LogLine {
                    kind: ModerationLogAction::ResolveReport,
                    target_type: ModerationTarget::Report,
                    target_id: report_id,
                    reason: note,
                    details: Some(format!("Closed with {}", resolution.as_str())),
                },
            )
            .await?;

        let closed = repos.reports.lock_by_id(&txn, report_id).await?;
        txn.commit().await.map_err(map_db_err)?;
        self.ctx.invalidate(&stale).await;

        info!(
            report_id = %report_id,
            moderator = %principal.user_id,
            resolution = resolution.as_str(),
            "Report closed"
        );
        Ok(closed)
    }
}
