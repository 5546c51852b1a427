//! Topic polls.

use agora_common::{AppError, AppResult};
use agora_db::entities::{poll, poll_vote};
use chrono::{Duration, Utc};
use sea_orm::{ConnectionTrait, Set};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use validator::Validate;

use crate::context::ForumContext;
use crate::services::authorization::Principal;

/// Fewest options a poll may offer.
pub const MIN_CHOICES: usize = 2;
/// Most options a poll may offer.
pub const MAX_CHOICES: usize = 10;
/// Longest allowed poll duration (30 days).
const MAX_DURATION_SECS: i64 = 2_592_000;

/// Input for a poll attached to a new topic.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePollInput {
    #[validate(length(min = 1, max = 255))]
    pub question: String,

    pub choices: Vec<String>,

    #[serde(default)]
    pub allow_revote: bool,

    /// Duration in seconds.
    pub expires_in: Option<i64>,
}

impl CreatePollInput {
    /// Check the option list.
    pub fn check(&self) -> AppResult<()> {
        self.validate()?;

        if self.choices.len() < MIN_CHOICES {
            return Err(AppError::InvalidInput(format!(
                "Poll must have at least {MIN_CHOICES} choices"
            )));
        }
        if self.choices.len() > MAX_CHOICES {
            return Err(AppError::InvalidInput(format!(
                "Poll cannot have more than {MAX_CHOICES} choices"
            )));
        }
        for choice in &self.choices {
            if choice.trim().is_empty() {
                return Err(AppError::InvalidInput(
                    "Poll choices cannot be empty".to_string(),
                ));
            }
            if choice.chars().count() > 100 {
                return Err(AppError::InvalidInput(
                    "Poll choice is too long (max 100 chars)".to_string(),
                ));
            }
        }
        if self.expires_in.is_some_and(|secs| secs <= 0) {
            return Err(AppError::InvalidInput(
                "Poll duration must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parse the JSON counts array of a poll.
fn vote_counts(poll: &poll::Model) -> AppResult<Vec<i32>> {
    serde_json::from_value(poll.votes.clone())
        .map_err(|e| AppError::Internal(format!("Invalid poll votes: {e}")))
}

/// Poll service.
#[derive(Clone)]
pub struct PollService {
    ctx: ForumContext,
}

impl PollService {
    /// Create a new poll service.
    #[must_use]
    pub const fn new(ctx: ForumContext) -> Self {
        Self { ctx }
    }

    /// Create a poll for a topic. The input must already have passed
    /// [`CreatePollInput::check`].
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        topic_id: &str,
        input: &CreatePollInput,
    ) -> AppResult<poll::Model> {
        let expires_at = input.expires_in.map(|seconds| {
            let duration = Duration::seconds(seconds.min(MAX_DURATION_SECS));
            (Utc::now() + duration).into()
        });

        let choices: Vec<String> = input.choices.iter().map(|c| c.trim().to_string()).collect();
        let votes = json!(vec![0i32; choices.len()]);

        self.ctx
            .repos
            .polls
            .create(
                conn,
                poll::ActiveModel {
                    id: Set(self.ctx.id_gen.generate()),
                    topic_id: Set(topic_id.to_string()),
                    question: Set(input.question.trim().to_string()),
                    choices: Set(json!(choices)),
                    votes: Set(votes),
                    allow_revote: Set(input.allow_revote),
                    expires_at: Set(expires_at),
                    voters_count: Set(0),
                    created_at: Set(Utc::now().into()),
                },
            )
            .await
    }

    /// The poll attached to a topic, if any.
    pub async fn find_by_topic(&self, topic_id: &str) -> AppResult<Option<poll::Model>> {
        self.ctx.repos.polls.find_by_topic(topic_id).await
    }

    /// Vote on a poll, or change an earlier vote when the poll allows it.
    pub async fn vote(
        &self,
        poll_id: &str,
        principal: &Principal,
        choice: i32,
    ) -> AppResult<poll::Model> {
        principal.ensure_not_banned()?;

        let txn = self.ctx.begin().await?;
        let repo = &self.ctx.repos.polls;
        // The vote counts are rewritten whole, so voters take turns.
        let poll = repo.lock_by_id(&txn, poll_id).await?;

        // Check if poll is expired
        if poll.expires_at.is_some_and(|at| at < Utc::now()) {
            return Err(AppError::InvalidInput("Poll has ended".to_string()));
        }

        let mut votes = vote_counts(&poll)?;
        let index = usize::try_from(choice)
            .ok()
            .filter(|i| *i < votes.len())
            .ok_or_else(|| AppError::InvalidInput("Invalid choice".to_string()))?;

        let voters_delta = match repo.find_vote(&txn, poll_id, &principal.user_id).await? {
            Some(_) if !poll.allow_revote => {
                return Err(AppError::Conflict("Already voted".to_string()));
            }
            Some(existing) if existing.choice == choice => return Ok(poll),
            Some(existing) => {
                if let Some(previous) = usize::try_from(existing.choice)
                    .ok()
                    .and_then(|i| votes.get_mut(i))
                {
                    *previous = (*previous - 1).max(0);
                }
                repo.update_vote_choice(&txn, &existing.id, choice).await?;
                0
            }
            None => {
                repo.create_vote(
                    &txn,
                    poll_vote::ActiveModel {
                        id: Set(self.ctx.id_gen.generate()),
                        poll_id: Set(poll_id.to_string()),
                        user_id: Set(principal.user_id.clone()),
                        choice: Set(choice),
                        created_at: Set(Utc::now().into()),
                    },
                )
                .await?;
                1
            }
        };

        votes[index] += 1;
        repo.update_votes(&txn, poll_id, json!(votes), voters_delta)
            .await?;
        let updated = repo.get_by_id(&txn, poll_id).await?;
        txn.commit().await.map_err(agora_db::map_db_err)?;

        info!(poll_id = %poll_id, user_id = %principal.user_id, choice, "Poll vote recorded");
        Ok(updated)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input(choices: &[&str]) -> CreatePollInput {
        CreatePollInput {
            question: "Favourite editor?".to_string(),
            choices: choices.iter().map(ToString::to_string).collect(),
            allow_revote: false,
            expires_in: None,
        }
    }

    #[test]
    fn test_choice_count_bounds() {
        assert!(matches!(input(&["a"]).check(), Err(AppError::InvalidInput(_))));
        assert!(input(&["a", "b"]).check().is_ok());

        let eleven: Vec<String> = (0..11).map(|i| i.to_string()).collect();
        let refs: Vec<&str> = eleven.iter().map(String::as_str).collect();
        assert!(matches!(input(&refs).check(), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_blank_choice_rejected() {
        assert!(matches!(input(&["a", "  "]).check(), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_blank_question_rejected() {
        let mut poll = input(&["a", "b"]);
        poll.question = String::new();
        assert!(matches!(poll.check(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_non_positive_duration_rejected() {
        let mut poll = input(&["a", "b"]);
        poll.expires_in = Some(0);
        assert!(matches!(poll.check(), Err(AppError::InvalidInput(_))));
    }
}
