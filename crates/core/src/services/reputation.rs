//! Reputation ledger, badges and tiers.

use agora_common::AppResult;
use agora_db::entities::{
    reputation_log::{self, ReputationAction},
    user, user_badge,
};
use chrono::Utc;
use sea_orm::{ConnectionTrait, Set};
use serde::Serialize;
use tracing::info;

use crate::context::ForumContext;

/// Points for starting a topic.
pub const TOPIC_CREATED_POINTS: i32 = 5;
/// Points for every post, including a topic's first post.
pub const POST_CREATED_POINTS: i32 = 2;
/// Points an author gains per up vote.
pub const UPVOTE_POINTS: i32 = 3;
/// Points an author loses per down vote.
pub const DOWNVOTE_POINTS: i32 = -1;

/// Ledger entries shown in a reputation summary.
pub const HISTORY_LIMIT: u64 = 50;

/// Reputation milestones and the badge each one earns.
pub const BADGE_THRESHOLDS: [(i32, &str); 5] = [
    (100, "Rising Star"),
    (500, "Respected Member"),
    (1000, "Community Veteran"),
    (2500, "Expert Contributor"),
    (5000, "Community Legend"),
];

/// Badge type string for a threshold.
#[must_use]
pub fn badge_type(threshold: i32) -> String {
    format!("REPUTATION_{threshold}")
}

/// Thresholds at or below `reputation`.
pub fn earned_thresholds(reputation: i32) -> impl Iterator<Item = (i32, &'static str)> {
    BADGE_THRESHOLDS
        .into_iter()
        .filter(move |(threshold, _)| *threshold <= reputation)
}

/// Standing derived from reputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReputationTier {
    Newcomer,
    RisingStar,
    Respected,
    Veteran,
    Expert,
    Legend,
}

impl ReputationTier {
    #[must_use]
    pub const fn for_reputation(reputation: i32) -> Self {
        match reputation {
            i32::MIN..=99 => Self::Newcomer,
            100..=499 => Self::RisingStar,
            500..=999 => Self::Respected,
            1000..=2499 => Self::Veteran,
            2500..=4999 => Self::Expert,
            _ => Self::Legend,
        }
    }
}

/// A user's reputation at a glance.
#[derive(Debug, Clone, Serialize)]
pub struct ReputationSummary {
    pub user_id: String,
    pub username: String,
    pub reputation: i32,
    pub tier: ReputationTier,
    pub badges: Vec<user_badge::Model>,
    pub history: Vec<reputation_log::Model>,
}

/// One leaderboard row.
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: String,
    pub username: String,
    pub reputation: i32,
    pub tier: ReputationTier,
}

/// A change to record in the ledger.
#[derive(Debug, Clone)]
pub struct ReputationChange<'a> {
    pub user_id: &'a str,
    pub action: ReputationAction,
    pub points: i32,
    pub reason: &'a str,
    pub related_id: Option<&'a str>,
}

/// Reputation service.
#[derive(Clone)]
pub struct ReputationService {
    ctx: ForumContext,
}

impl ReputationService {
    /// Create a new reputation service.
    #[must_use]
    pub const fn new(ctx: ForumContext) -> Self {
        Self { ctx }
    }

    /// Append a ledger entry, apply it to the cached total and award any
    /// newly reached badges. Returns the new total.
    pub async fn award<C: ConnectionTrait>(
        &self,
        conn: &C,
        change: ReputationChange<'_>,
    ) -> AppResult<i32> {
        let repos = &self.ctx.repos;

        repos
            .reputation
            .append(
                conn,
                reputation_log::ActiveModel {
                    id: Set(self.ctx.id_gen.generate()),
                    user_id: Set(change.user_id.to_string()),
                    action: Set(change.action),
                    points: Set(change.points),
                    reason: Set(Some(change.reason.to_string())),
                    related_id: Set(change.related_id.map(ToString::to_string)),
                    created_at: Set(Utc::now().into()),
                },
            )
            .await?;

        let reputation = repos
            .users
            .add_reputation(conn, change.user_id, change.points)
            .await?;

        self.award_badges(conn, change.user_id, reputation).await?;
        Ok(reputation)
    }

    /// Award every threshold badge `reputation` has reached and the user
    /// does not hold yet. Badges are never taken away.
    pub async fn award_badges<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &str,
        reputation: i32,
    ) -> AppResult<Vec<user_badge::Model>> {
        let mut awarded = Vec::new();
        if reputation < BADGE_THRESHOLDS[0].0 {
            return Ok(awarded);
        }

        let held = self.ctx.repos.reputation.badges_for_user(conn, user_id).await?;

        for (threshold, name) in earned_thresholds(reputation) {
            let kind = badge_type(threshold);
            if held.iter().any(|b| b.badge_type == kind) {
                continue;
            }

            let badge = self
                .ctx
                .repos
                .reputation
                .award_badge(
                    conn,
                    user_badge::ActiveModel {
                        id: Set(self.ctx.id_gen.generate()),
                        user_id: Set(user_id.to_string()),
                        badge_type: Set(kind),
                        name: Set(name.to_string()),
                        description: Set(Some(format!("Reached {threshold} reputation"))),
                        earned_at: Set(Utc::now().into()),
                    },
                )
                .await?;

            info!(user_id = %user_id, badge = %badge.name, "Badge awarded");
            awarded.push(badge);
        }

        Ok(awarded)
    }

    /// Reputation, tier, badges and recent ledger entries for a user.
    pub async fn summary(&self, user_id: &str) -> AppResult<ReputationSummary> {
        let repos = &self.ctx.repos;
        let user = repos.users.get_by_id(self.ctx.db.as_ref(), user_id).await?;
        let badges = repos
            .reputation
            .badges_for_user(self.ctx.db.as_ref(), user_id)
            .await?;
        let history = repos.reputation.history(user_id, HISTORY_LIMIT).await?;

        Ok(ReputationSummary {
            user_id: user.id,
            username: user.username,
            reputation: user.reputation,
            tier: ReputationTier::for_reputation(user.reputation),
            badges,
            history,
        })
    }

    /// Users with positive reputation, highest first.
    pub async fn leaderboard(&self, limit: u64) -> AppResult<Vec<LeaderboardEntry>> {
        let users = self.ctx.repos.users.leaderboard(limit).await?;
        Ok(users
            .into_iter()
            .enumerate()
            .map(|(i, user)| leaderboard_entry(i + 1, user))
            .collect())
    }
}

fn leaderboard_entry(rank: usize, user: user::Model) -> LeaderboardEntry {
    LeaderboardEntry {
        rank,
        tier: ReputationTier::for_reputation(user.reputation),
        user_id: user.id,
        username: user.username,
        reputation: user.reputation,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tiers() {
        assert_eq!(ReputationTier::for_reputation(-20), ReputationTier::Newcomer);
        assert_eq!(ReputationTier::for_reputation(99), ReputationTier::Newcomer);
        assert_eq!(ReputationTier::for_reputation(100), ReputationTier::RisingStar);
        assert_eq!(ReputationTier::for_reputation(999), ReputationTier::Respected);
        assert_eq!(ReputationTier::for_reputation(1000), ReputationTier::Veteran);
        assert_eq!(ReputationTier::for_reputation(2500), ReputationTier::Expert);
        assert_eq!(ReputationTier::for_reputation(5000), ReputationTier::Legend);
    }

    #[test]
    fn test_earned_thresholds() {
        assert_eq!(earned_thresholds(99).count(), 0);
        let earned: Vec<_> = earned_thresholds(1000).map(|(t, _)| t).collect();
        assert_eq!(earned, vec![100, 500, 1000]);
        assert_eq!(earned_thresholds(10_000).count(), 5);
    }

    #[test]
    fn test_badge_type() {
        assert_eq!(badge_type(2500), "REPUTATION_2500");
    }
}
