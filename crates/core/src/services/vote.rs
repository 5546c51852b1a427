//! Post voting.
//!
//! Each (post, voter) pair is in one of three states: no vote, up or down.
//! Pressing the current direction again retracts the vote; pressing the
//! other direction flips it. The post author's reputation moves by the net
//! difference, recorded as one ledger entry per transition.

use agora_common::{AppError, AppResult};
use agora_db::entities::{
    post_vote::{self, VoteType},
    reputation_log::ReputationAction,
};
use agora_db::map_db_err;
use chrono::Utc;
use sea_orm::{ConnectionTrait, Set};
use serde::Serialize;
use tracing::info;

use crate::context::ForumContext;
use crate::services::authorization::Principal;
use crate::services::reputation::{
    DOWNVOTE_POINTS, ReputationChange, ReputationService, UPVOTE_POINTS,
};

/// What happens to the stored vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteEffect {
    Insert(VoteType),
    Delete,
    Update(VoteType),
}

/// One step of the vote state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteTransition {
    pub effect: VoteEffect,
    /// Net change to the author's reputation.
    pub delta: i32,
    /// The voter's vote afterwards.
    pub resulting: Option<VoteType>,
}

impl VoteTransition {
    const fn ledger_action(&self) -> ReputationAction {
        match self.effect {
            VoteEffect::Insert(VoteType::Up) => ReputationAction::PostUpvoted,
            VoteEffect::Insert(VoteType::Down) => ReputationAction::PostDownvoted,
            VoteEffect::Delete => ReputationAction::VoteRetracted,
            VoteEffect::Update(_) => ReputationAction::VoteChanged,
        }
    }
}

const fn points(vote: VoteType) -> i32 {
    match vote {
        VoteType::Up => UPVOTE_POINTS,
        VoteType::Down => DOWNVOTE_POINTS,
    }
}

/// Compute the transition for pressing `pressed` while in `current`.
#[must_use]
pub fn transition(current: Option<VoteType>, pressed: VoteType) -> VoteTransition {
    match current {
        None => VoteTransition {
            effect: VoteEffect::Insert(pressed),
            delta: points(pressed),
            resulting: Some(pressed),
        },
        Some(existing) if existing == pressed => VoteTransition {
            effect: VoteEffect::Delete,
            delta: -points(existing),
            resulting: None,
        },
        Some(existing) => VoteTransition {
            effect: VoteEffect::Update(pressed),
            delta: points(pressed) - points(existing),
            resulting: Some(pressed),
        },
    }
}

/// Vote totals for a post and the caller's own vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoteSummary {
    pub upvotes: u64,
    pub downvotes: u64,
    pub user_vote: Option<VoteType>,
}

/// Vote service.
#[derive(Clone)]
pub struct VoteService {
    ctx: ForumContext,
    reputation: ReputationService,
}

impl VoteService {
    /// Create a new vote service.
    #[must_use]
    pub const fn new(ctx: ForumContext, reputation: ReputationService) -> Self {
        Self { ctx, reputation }
    }

    /// Press the up or down button on a post.
    pub async fn vote(
        &self,
        post_id: &str,
        principal: &Principal,
        pressed: VoteType,
    ) -> AppResult<VoteSummary> {
        principal.ensure_not_banned()?;

        // A concurrent first vote by the same user surfaces as a unique
        // violation, and a vote changed under us as a stale update. The
        // retry reads the stored vote again and transitions from it.
        self.ctx
            .retry_on_conflict("vote", |_| self.vote_once(post_id, principal, pressed))
            .await
    }

    async fn vote_once(
        &self,
        post_id: &str,
        principal: &Principal,
        pressed: VoteType,
    ) -> AppResult<VoteSummary> {
        let txn = self.ctx.begin().await?;
        let repos = &self.ctx.repos;

        // Serializes voters on the same post until commit.
        let post = repos.posts.lock_by_id(&txn, post_id).await?;
        if post.is_deleted {
            return Err(AppError::NotFound(format!("Post {post_id}")));
        }
        if post.user_id == principal.user_id {
            return Err(AppError::Forbidden("Cannot vote on your own post".to_string()));
        }

        let existing = repos.votes.find(&txn, post_id, &principal.user_id).await?;
        let step = transition(existing.as_ref().map(|v| v.vote_type), pressed);

        self.apply(&txn, post_id, &principal.user_id, existing.as_ref(), step)
            .await?;

        self.reputation
            .award(
                &txn,
                ReputationChange {
                    user_id: &post.user_id,
                    action: step.ledger_action(),
                    points: step.delta,
                    reason: "Vote on post",
                    related_id: Some(post_id),
                },
            )
            .await?;

        let tally = repos.votes.tally(&txn, post_id).await?;
        txn.commit().await.map_err(map_db_err)?;

        info!(
            post_id = %post_id,
            voter = %principal.user_id,
            delta = step.delta,
            "Vote recorded"
        );

        Ok(VoteSummary {
            upvotes: tally.upvotes,
            downvotes: tally.downvotes,
            user_vote: step.resulting,
        })
    }

    async fn apply<C: ConnectionTrait>(
        &self,
        conn: &C,
        post_id: &str,
        voter_id: &str,
        existing: Option<&post_vote::Model>,
        step: VoteTransition,
    ) -> AppResult<()> {
        let votes = &self.ctx.repos.votes;
        match (step.effect, existing) {
            (VoteEffect::Insert(vote_type), _) => {
                votes
                    .create(
                        conn,
                        post_vote::ActiveModel {
                            id: Set(self.ctx.id_gen.generate()),
                            post_id: Set(post_id.to_string()),
                            user_id: Set(voter_id.to_string()),
                            vote_type: Set(vote_type),
                            created_at: Set(Utc::now().into()),
                        },
                    )
                    .await?;
            }
            (VoteEffect::Delete, Some(vote)) => {
                votes.delete(conn, &vote.id, vote.vote_type).await?;
            }
            (VoteEffect::Update(vote_type), Some(vote)) => {
                votes
                    .update_type(conn, &vote.id, vote.vote_type, vote_type)
                    .await?;
            }
            (_, None) => {
                return Err(AppError::Internal("Vote transition without a stored vote".to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::authorization::Principal;
    use agora_common::{ForumConfig, NoOpResponseCache};
    use agora_db::entities::{post, user::UserRole};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    #[test]
    fn test_transition_table() {
        let cases = [
            (None, VoteType::Up, 3, Some(VoteType::Up)),
            (None, VoteType::Down, -1, Some(VoteType::Down)),
            (Some(VoteType::Up), VoteType::Up, -3, None),
            (Some(VoteType::Down), VoteType::Down, 1, None),
            (Some(VoteType::Up), VoteType::Down, -4, Some(VoteType::Down)),
            (Some(VoteType::Down), VoteType::Up, 4, Some(VoteType::Up)),
        ];
        for (current, pressed, delta, resulting) in cases {
            let step = transition(current, pressed);
            assert_eq!(step.delta, delta, "{current:?} + {pressed:?}");
            assert_eq!(step.resulting, resulting, "{current:?} + {pressed:?}");
        }
    }

    #[test]
    fn test_vote_twice_returns_to_start() {
        for pressed in [VoteType::Up, VoteType::Down] {
            let first = transition(None, pressed);
            let second = transition(first.resulting, pressed);
            assert_eq!(first.delta + second.delta, 0);
            assert_eq!(second.resulting, None);
        }
    }

    #[test]
    fn test_ledger_actions() {
        assert_eq!(
            transition(None, VoteType::Up).ledger_action(),
            ReputationAction::PostUpvoted
        );
        assert_eq!(
            transition(Some(VoteType::Up), VoteType::Up).ledger_action(),
            ReputationAction::VoteRetracted
        );
        assert_eq!(
            transition(Some(VoteType::Down), VoteType::Up).ledger_action(),
            ReputationAction::VoteChanged
        );
    }

    fn create_test_post(user_id: &str, is_deleted: bool) -> post::Model {
        post::Model {
            id: "p1".to_string(),
            topic_id: "t1".to_string(),
            user_id: user_id.to_string(),
            content: "hello".to_string(),
            edited_by: None,
            edited_at: None,
            is_deleted,
            deleted_by: None,
            deleted_at: None,
            created_at: Utc::now().into(),
        }
    }

    fn voter() -> Principal {
        Principal {
            user_id: "u1".to_string(),
            username: "alice".to_string(),
            role: UserRole::User,
            group_ids: vec![],
            in_moderator_group: false,
            in_admin_group: false,
            banned: false,
        }
    }

    fn service(posts: Vec<post::Model>) -> VoteService {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([posts])
                .into_connection(),
        );
        let ctx = ForumContext::new(db, Arc::new(NoOpResponseCache), ForumConfig::default());
        VoteService::new(ctx.clone(), ReputationService::new(ctx))
    }

    #[tokio::test]
    async fn test_self_vote_forbidden() {
        let result = service(vec![create_test_post("u1", false)])
            .vote("p1", &voter(), VoteType::Up)
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_vote_on_deleted_post_not_found() {
        let result = service(vec![create_test_post("u2", true)])
            .vote("p1", &voter(), VoteType::Up)
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_vote_on_missing_post_not_found() {
        let result = service(vec![]).vote("p1", &voter(), VoteType::Down).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_banned_voter_forbidden() {
        let mut banned = voter();
        banned.banned = true;
        let result = service(vec![]).vote("p1", &banned, VoteType::Up).await;
        assert!(matches!(result, Err(AppError::Forbidden(msg)) if msg == "banned"));
    }
}
