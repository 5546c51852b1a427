//! End-to-end forum service tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test forum_flow -- --ignored`

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use agora_common::{AppError, ForumConfig, NoOpResponseCache};
use agora_core::{
    CreatePollInput, CreateTopicInput, FileReportInput, ForumContext, ForumServices,
    ModerationAction, PostContentInput, Principal, ReportResolution, SearchInput,
};
use agora_db::entities::{
    ban::BanType, moderation_log::ModerationLogAction, post_vote::VoteType,
    report::ReportStatus, subscription::SubscriptionScope, user::UserRole,
};
use agora_db::test_utils::TestDatabase;
use sea_orm::ConnectionTrait;

fn services(db: &TestDatabase) -> ForumServices {
    let ctx = ForumContext::new(
        db.shared(),
        Arc::new(NoOpResponseCache),
        ForumConfig::default(),
    );
    ForumServices::new(ctx)
}

async fn principal(services: &ForumServices, db: &TestDatabase, role: UserRole) -> Principal {
    let user = db.seed_user(role).await.unwrap();
    services.auth.principal_for(&user).await.unwrap()
}

fn topic_input(forum_id: &str, title: &str) -> CreateTopicInput {
    CreateTopicInput {
        forum_id: forum_id.to_string(),
        title: title.to_string(),
        content: format!("{title} body"),
        poll: None,
    }
}

fn reply_input(content: &str) -> PostContentInput {
    PostContentInput {
        content: content.to_string(),
    }
}

async fn reputation_of(services: &ForumServices, user_id: &str) -> i32 {
    services.reputation.summary(user_id).await.unwrap().reputation
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_hello_world_topic() {
    let db = TestDatabase::create_unique().await.unwrap();
    let services = services(&db);
    let forum = db.seed_forum("General").await.unwrap();
    let author = principal(&services, &db, UserRole::User).await;

    let created = services
        .topics
        .create_topic(&author, topic_input(&forum.id, "Hello World"))
        .await
        .unwrap();
    assert!(created.slug.starts_with("hello-world-"));

    let forum_view = services.topics.forum_view(&forum.id, None, None).await.unwrap();
    assert_eq!(forum_view.forum.topics_count, 1);
    assert_eq!(forum_view.forum.posts_count, 1);
    assert_eq!(forum_view.forum.last_post_id.as_deref(), Some(created.post_id.as_str()));

    let view = services.topics.view_topic(&created.slug, None, None).await.unwrap();
    assert_eq!(view.topic.replies, 0);
    assert_eq!(view.posts.len(), 1);
    assert_eq!(reputation_of(&services, &author.user_id).await, 7);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_identical_titles_get_distinct_slugs() {
    let db = TestDatabase::create_unique().await.unwrap();
    let services = services(&db);
    let forum = db.seed_forum("General").await.unwrap();
    let author = principal(&services, &db, UserRole::User).await;

    let first = services
        .topics
        .create_topic(&author, topic_input(&forum.id, "Same title"))
        .await
        .unwrap();
    let second = services
        .topics
        .create_topic(&author, topic_input(&forum.id, "Same title"))
        .await
        .unwrap();
    assert_ne!(first.slug, second.slug);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_counters_follow_replies_and_deletes() {
    let db = TestDatabase::create_unique().await.unwrap();
    let services = services(&db);
    let forum = db.seed_forum("General").await.unwrap();
    let author = principal(&services, &db, UserRole::User).await;
    let replier = principal(&services, &db, UserRole::User).await;

    let created = services
        .topics
        .create_topic(&author, topic_input(&forum.id, "Counters"))
        .await
        .unwrap();
    let first = services
        .topics
        .reply(&created.topic_id, &replier, reply_input("first"))
        .await
        .unwrap();
    let second = services
        .topics
        .reply(&created.topic_id, &replier, reply_input("second"))
        .await
        .unwrap();

    let view = services.topics.view_topic(&created.slug, None, None).await.unwrap();
    assert_eq!(view.topic.replies, 2);
    assert_eq!(view.topic.last_post_id.as_deref(), Some(second.id.as_str()));

    services
        .topics
        .soft_delete_post(&second.id, &replier)
        .await
        .unwrap();

    let view = services.topics.view_topic(&created.slug, None, None).await.unwrap();
    assert_eq!(view.topic.replies, 1);
    assert_eq!(view.topic.last_post_id.as_deref(), Some(first.id.as_str()));
    assert!(view.posts.iter().any(|p| p.id == second.id && p.content.is_none()));

    let forum_view = services.topics.forum_view(&forum.id, None, None).await.unwrap();
    assert_eq!(forum_view.forum.topics_count, 1);
    assert_eq!(forum_view.forum.posts_count, 2);
    assert_eq!(forum_view.forum.last_post_id.as_deref(), Some(first.id.as_str()));

    services
        .topics
        .delete_topic(&created.topic_id, &author)
        .await
        .unwrap();
    let forum_view = services.topics.forum_view(&forum.id, None, None).await.unwrap();
    assert_eq!(forum_view.forum.topics_count, 0);
    assert_eq!(forum_view.forum.posts_count, 0);
    assert!(forum_view.forum.last_post_id.is_none());

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_locked_topic_admits_only_admins() {
    let db = TestDatabase::create_unique().await.unwrap();
    let services = services(&db);
    let forum = db.seed_forum("General").await.unwrap();
    let author = principal(&services, &db, UserRole::User).await;
    let moderator = principal(&services, &db, UserRole::Moderator).await;
    let admin = principal(&services, &db, UserRole::Admin).await;

    let created = services
        .topics
        .create_topic(&author, topic_input(&forum.id, "Locked"))
        .await
        .unwrap();
    services
        .moderation
        .apply(
            &moderator,
            ModerationAction::LockTopic {
                topic_id: created.topic_id.clone(),
            },
            Some("cooling off".to_string()),
        )
        .await
        .unwrap();

    let refused = services
        .topics
        .reply(&created.topic_id, &author, reply_input("me too"))
        .await;
    assert!(matches!(refused, Err(AppError::Forbidden(_))));

    services
        .topics
        .reply(&created.topic_id, &admin, reply_input("closing note"))
        .await
        .unwrap();

    let logs = services.moderation.logs(&moderator, 10, None).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].target_id, created.topic_id);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_vote_round_trip_and_switch() {
    let db = TestDatabase::create_unique().await.unwrap();
    let services = services(&db);
    let forum = db.seed_forum("General").await.unwrap();
    let author = principal(&services, &db, UserRole::User).await;
    let voter = principal(&services, &db, UserRole::User).await;

    let created = services
        .topics
        .create_topic(&author, topic_input(&forum.id, "Votes"))
        .await
        .unwrap();
    let base = reputation_of(&services, &author.user_id).await;

    let summary = services
        .votes
        .vote(&created.post_id, &voter, VoteType::Up)
        .await
        .unwrap();
    assert_eq!(summary.upvotes, 1);
    assert_eq!(summary.user_vote, Some(VoteType::Up));
    assert_eq!(reputation_of(&services, &author.user_id).await, base + 3);

    let summary = services
        .votes
        .vote(&created.post_id, &voter, VoteType::Up)
        .await
        .unwrap();
    assert_eq!(summary.upvotes, 0);
    assert_eq!(summary.user_vote, None);
    assert_eq!(reputation_of(&services, &author.user_id).await, base);

    services
        .votes
        .vote(&created.post_id, &voter, VoteType::Up)
        .await
        .unwrap();
    let summary = services
        .votes
        .vote(&created.post_id, &voter, VoteType::Down)
        .await
        .unwrap();
    assert_eq!(summary.downvotes, 1);
    assert_eq!(reputation_of(&services, &author.user_id).await, base - 1);

    let own = services
        .votes
        .vote(&created.post_id, &author, VoteType::Up)
        .await;
    assert!(matches!(own, Err(AppError::Forbidden(_))));

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_ban_blocks_posting_and_cannot_repeat() {
    let db = TestDatabase::create_unique().await.unwrap();
    let services = services(&db);
    let forum = db.seed_forum("General").await.unwrap();
    let moderator = principal(&services, &db, UserRole::Moderator).await;
    let target = principal(&services, &db, UserRole::User).await;

    let ban = ModerationAction::BanUser {
        user_id: target.user_id.clone(),
        ban_type: BanType::Permanent,
        expires_at: None,
    };
    services
        .moderation
        .apply(&moderator, ban.clone(), Some("spam".to_string()))
        .await
        .unwrap();

    let again = services
        .moderation
        .apply(&moderator, ban, Some("more spam".to_string()))
        .await;
    assert!(matches!(again, Err(AppError::Conflict(_))));

    let refreshed = services
        .auth
        .resolve_principal(&target_token(&db, &target.user_id).await)
        .await
        .unwrap()
        .unwrap();
    assert!(refreshed.banned);
    let refused = services
        .topics
        .create_topic(&refreshed, topic_input(&forum.id, "Let me in"))
        .await;
    assert!(matches!(refused, Err(AppError::Forbidden(_))));

    services
        .moderation
        .apply(
            &moderator,
            ModerationAction::UnbanUser {
                user_id: target.user_id.clone(),
            },
            None,
        )
        .await
        .unwrap();
    let page = services
        .notifications
        .list(&target.user_id, 10, None, false)
        .await
        .unwrap();
    assert_eq!(page.unread_count, 1);

    db.drop_database().await.unwrap();
}

async fn target_token(db: &TestDatabase, user_id: &str) -> String {
    use agora_db::entities::User;
    use sea_orm::EntityTrait;
    User::find_by_id(user_id)
        .one(db.connection())
        .await
        .unwrap()
        .unwrap()
        .token
        .unwrap()
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_reply_notifies_topic_subscribers() {
    let db = TestDatabase::create_unique().await.unwrap();
    let services = services(&db);
    let forum = db.seed_forum("General").await.unwrap();
    let author = principal(&services, &db, UserRole::User).await;
    let replier = principal(&services, &db, UserRole::User).await;

    let created = services
        .topics
        .create_topic(&author, topic_input(&forum.id, "Watched"))
        .await
        .unwrap();
    services
        .subscriptions
        .subscribe(&author, SubscriptionScope::Topic(created.topic_id.clone()), true)
        .await
        .unwrap();

    services
        .topics
        .reply(&created.topic_id, &replier, reply_input("hi"))
        .await
        .unwrap();
    services
        .topics
        .reply(&created.topic_id, &author, reply_input("thanks"))
        .await
        .unwrap();

    let page = services
        .notifications
        .list(&author.user_id, 10, None, false)
        .await
        .unwrap();
    assert_eq!(page.notifications.len(), 1);
    assert_eq!(
        page.notifications[0].content.as_deref(),
        Some("New reply in: Watched")
    );

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_recount_repairs_drift_and_badges_once() {
    let db = TestDatabase::create_unique().await.unwrap();
    let services = services(&db);
    let forum = db.seed_forum("General").await.unwrap();
    let author = principal(&services, &db, UserRole::User).await;
    let admin = principal(&services, &db, UserRole::Admin).await;

    let created = services
        .topics
        .create_topic(&author, topic_input(&forum.id, "Drift"))
        .await
        .unwrap();

    db.conn
        .execute_unprepared(&format!(
            "UPDATE forum SET topics_count = 42, posts_count = 99 WHERE id = '{}'; \
             UPDATE forum_topic SET replies = 17 WHERE id = '{}'; \
             INSERT INTO reputation_log (id, user_id, action, points, reason, related_id, created_at) \
             VALUES ('drift-{}', '{}', 'topic_created', 200, NULL, NULL, now())",
            forum.id, created.topic_id, author.user_id, author.user_id
        ))
        .await
        .unwrap();

    let report = services.recount.recount_all(&admin).await.unwrap();
    assert_eq!(report.forums, 1);
    assert_eq!(report.topics, 1);

    let forum_view = services.topics.forum_view(&forum.id, None, None).await.unwrap();
    assert_eq!(forum_view.forum.topics_count, 1);
    assert_eq!(forum_view.forum.posts_count, 1);
    let view = services.topics.view_topic(&created.slug, None, None).await.unwrap();
    assert_eq!(view.topic.replies, 0);

    let summary = services.reputation.summary(&author.user_id).await.unwrap();
    assert_eq!(summary.reputation, 207);
    assert_eq!(summary.badges.len(), 1);

    services.recount.recount_all(&admin).await.unwrap();
    let summary = services.reputation.summary(&author.user_id).await.unwrap();
    assert_eq!(summary.badges.len(), 1);

    db.drop_database().await.unwrap();
}

async fn search_total(services: &ForumServices, query: &str) -> u64 {
    services
        .search
        .search(SearchInput {
            query: query.to_string(),
            ..SearchInput::default()
        })
        .await
        .unwrap()
        .total
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_concurrent_double_press_cancels_out() {
    let db = TestDatabase::create_unique().await.unwrap();
    let services = services(&db);
    let forum = db.seed_forum("General").await.unwrap();
    let author = principal(&services, &db, UserRole::User).await;
    let voter = principal(&services, &db, UserRole::User).await;

    let created = services
        .topics
        .create_topic(&author, topic_input(&forum.id, "Racing votes"))
        .await
        .unwrap();
    let base = reputation_of(&services, &author.user_id).await;

    for _ in 0..5 {
        let (first, second) = tokio::join!(
            services.votes.vote(&created.post_id, &voter, VoteType::Up),
            services.votes.vote(&created.post_id, &voter, VoteType::Up),
        );
        first.unwrap();
        second.unwrap();

        let tally = services.ctx.repos.votes.tally_for(&created.post_id).await.unwrap();
        assert_eq!((tally.upvotes, tally.downvotes), (0, 0));
        assert_eq!(reputation_of(&services, &author.user_id).await, base);
    }

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_concurrent_soft_delete_counts_once() {
    let db = TestDatabase::create_unique().await.unwrap();
    let services = services(&db);
    let forum = db.seed_forum("General").await.unwrap();
    let author = principal(&services, &db, UserRole::User).await;
    let replier = principal(&services, &db, UserRole::User).await;

    let created = services
        .topics
        .create_topic(&author, topic_input(&forum.id, "Racing deletes"))
        .await
        .unwrap();
    let first = services
        .topics
        .reply(&created.topic_id, &replier, reply_input("first"))
        .await
        .unwrap();
    let second = services
        .topics
        .reply(&created.topic_id, &replier, reply_input("second"))
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        services.topics.soft_delete_post(&second.id, &replier),
        services.topics.soft_delete_post(&second.id, &replier),
    );
    assert_eq!(usize::from(a.is_ok()) + usize::from(b.is_ok()), 1);
    let refused = if a.is_err() { a } else { b };
    assert!(matches!(refused, Err(AppError::InvalidInput(_))));

    let view = services.topics.view_topic(&created.slug, None, None).await.unwrap();
    assert_eq!(view.topic.replies, 1);
    assert_eq!(view.topic.last_post_id.as_deref(), Some(first.id.as_str()));
    let forum_view = services.topics.forum_view(&forum.id, None, None).await.unwrap();
    assert_eq!(forum_view.forum.posts_count, 2);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_concurrent_poll_votes_all_counted() {
    let db = TestDatabase::create_unique().await.unwrap();
    let services = services(&db);
    let forum = db.seed_forum("General").await.unwrap();
    let author = principal(&services, &db, UserRole::User).await;
    let alice = principal(&services, &db, UserRole::User).await;
    let bob = principal(&services, &db, UserRole::User).await;

    let mut input = topic_input(&forum.id, "Tabs or spaces");
    input.poll = Some(CreatePollInput {
        question: "Which one?".to_string(),
        choices: vec!["tabs".to_string(), "spaces".to_string()],
        allow_revote: false,
        expires_in: None,
    });
    let created = services.topics.create_topic(&author, input).await.unwrap();
    let poll_id = created.poll_id.unwrap();

    let (a, b) = tokio::join!(
        services.polls.vote(&poll_id, &alice, 0),
        services.polls.vote(&poll_id, &bob, 1),
    );
    a.unwrap();
    b.unwrap();

    let poll = services.polls.find_by_topic(&created.topic_id).await.unwrap().unwrap();
    assert_eq!(poll.votes, serde_json::json!([1, 1]));
    assert_eq!(poll.voters_count, 2);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_move_topic_moves_counters_and_pointers() {
    let db = TestDatabase::create_unique().await.unwrap();
    let services = services(&db);
    let from = db.seed_forum("General").await.unwrap();
    let to = db.seed_forum("Offtopic").await.unwrap();
    let author = principal(&services, &db, UserRole::User).await;
    let moderator = principal(&services, &db, UserRole::Moderator).await;

    let stays = services
        .topics
        .create_topic(&author, topic_input(&from.id, "Stays"))
        .await
        .unwrap();
    let moves = services
        .topics
        .create_topic(&author, topic_input(&from.id, "Moves"))
        .await
        .unwrap();
    let reply = services
        .topics
        .reply(&moves.topic_id, &author, reply_input("wandering"))
        .await
        .unwrap();

    let entry = services
        .moderation
        .apply(
            &moderator,
            ModerationAction::MoveTopic {
                topic_id: moves.topic_id.clone(),
                to_forum_id: to.id.clone(),
            },
            Some("wrong forum".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(
        entry.details.as_deref(),
        Some(format!("Moved from forum {} to {}", from.id, to.id).as_str())
    );

    let source = services.topics.forum_view(&from.id, None, None).await.unwrap();
    assert_eq!(source.forum.topics_count, 1);
    assert_eq!(source.forum.posts_count, 1);
    assert_eq!(source.forum.last_post_id.as_deref(), Some(stays.post_id.as_str()));

    let target = services.topics.forum_view(&to.id, None, None).await.unwrap();
    assert_eq!(target.forum.topics_count, 1);
    assert_eq!(target.forum.posts_count, 2);
    assert_eq!(target.forum.last_post_id.as_deref(), Some(reply.id.as_str()));

    let view = services.topics.view_topic(&moves.slug, None, None).await.unwrap();
    assert_eq!(view.forum_id, to.id);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_restore_post_recounts_replies() {
    let db = TestDatabase::create_unique().await.unwrap();
    let services = services(&db);
    let forum = db.seed_forum("General").await.unwrap();
    let author = principal(&services, &db, UserRole::User).await;
    let moderator = principal(&services, &db, UserRole::Moderator).await;

    let created = services
        .topics
        .create_topic(&author, topic_input(&forum.id, "Restorable"))
        .await
        .unwrap();
    let first = services
        .topics
        .reply(&created.topic_id, &author, reply_input("first"))
        .await
        .unwrap();
    let second = services
        .topics
        .reply(&created.topic_id, &author, reply_input("second"))
        .await
        .unwrap();

    for action in [
        ModerationAction::DeletePost {
            post_id: second.id.clone(),
        },
        ModerationAction::DeletePost {
            post_id: first.id.clone(),
        },
    ] {
        services.moderation.apply(&moderator, action, None).await.unwrap();
    }
    let view = services.topics.view_topic(&created.slug, None, None).await.unwrap();
    assert_eq!(view.topic.replies, 0);
    assert_eq!(view.topic.last_post_id.as_deref(), Some(created.post_id.as_str()));

    services
        .moderation
        .apply(
            &moderator,
            ModerationAction::RestorePost {
                post_id: second.id.clone(),
            },
            None,
        )
        .await
        .unwrap();

    let view = services.topics.view_topic(&created.slug, None, None).await.unwrap();
    assert_eq!(view.topic.replies, 1);
    assert_eq!(view.topic.last_post_id.as_deref(), Some(second.id.as_str()));
    let forum_view = services.topics.forum_view(&forum.id, None, None).await.unwrap();
    assert_eq!(forum_view.forum.posts_count, 2);
    assert_eq!(forum_view.forum.last_post_id.as_deref(), Some(second.id.as_str()));

    let again = services
        .moderation
        .apply(
            &moderator,
            ModerationAction::RestorePost {
                post_id: second.id.clone(),
            },
            None,
        )
        .await;
    assert!(matches!(again, Err(AppError::InvalidInput(_))));

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_edit_post_updates_search_entry() {
    let db = TestDatabase::create_unique().await.unwrap();
    let services = services(&db);
    let forum = db.seed_forum("General").await.unwrap();
    let author = principal(&services, &db, UserRole::User).await;

    let created = services
        .topics
        .create_topic(&author, topic_input(&forum.id, "Original wording"))
        .await
        .unwrap();
    assert_eq!(search_total(&services, "original wording").await, 1);

    services
        .topics
        .edit_post(&created.post_id, &author, reply_input("Rewritten phrasing"))
        .await
        .unwrap();

    assert_eq!(search_total(&services, "original wording").await, 0);
    assert_eq!(search_total(&services, "rewritten").await, 1);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_warning_notifies_user() {
    let db = TestDatabase::create_unique().await.unwrap();
    let services = services(&db);
    let moderator = principal(&services, &db, UserRole::Moderator).await;
    let target = principal(&services, &db, UserRole::User).await;

    services
        .moderation
        .apply(
            &moderator,
            ModerationAction::WarnUser {
                user_id: target.user_id.clone(),
                points: Some(2),
                expires_at: None,
            },
            Some("  be nice  ".to_string()),
        )
        .await
        .unwrap();

    let page = services
        .notifications
        .list(&target.user_id, 10, None, false)
        .await
        .unwrap();
    assert_eq!(page.notifications.len(), 1);
    assert_eq!(
        page.notifications[0].content.as_deref(),
        Some("You have received a warning: be nice")
    );

    let (warnings, ban) = services
        .moderation
        .record_for(&moderator, &target.user_id)
        .await
        .unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].points, 2);
    assert!(ban.is_none());

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_report_resolution_applies_action_and_logs() {
    let db = TestDatabase::create_unique().await.unwrap();
    let services = services(&db);
    let forum = db.seed_forum("General").await.unwrap();
    let author = principal(&services, &db, UserRole::User).await;
    let spammer = principal(&services, &db, UserRole::User).await;
    let reporter = principal(&services, &db, UserRole::User).await;
    let moderator = principal(&services, &db, UserRole::Moderator).await;

    let created = services
        .topics
        .create_topic(&author, topic_input(&forum.id, "Reported"))
        .await
        .unwrap();
    let spam = services
        .topics
        .reply(&created.topic_id, &spammer, reply_input("buy now"))
        .await
        .unwrap();

    let report = services
        .reports
        .file(
            &reporter,
            FileReportInput {
                post_id: spam.id.clone(),
                reason: "spam".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(report.target_user_id, spammer.user_id);

    let queue = services.reports.pending(&moderator, None, None).await.unwrap();
    assert_eq!(queue.total, 1);
    assert_eq!(queue.reports[0].id, report.id);

    let closed = services
        .reports
        .resolve(
            &moderator,
            &report.id,
            ReportResolution::DeletePost,
            Some("spam link".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(closed.status, ReportStatus::Resolved);
    assert_eq!(closed.resolution.as_deref(), Some("delete_post"));
    assert_eq!(closed.resolved_by.as_deref(), Some(moderator.user_id.as_str()));

    let view = services.topics.view_topic(&created.slug, None, None).await.unwrap();
    assert_eq!(view.topic.replies, 0);

    let logs = services.moderation.logs(&moderator, 10, None).await.unwrap();
    let kinds: Vec<_> = logs.iter().map(|l| l.action).collect();
    assert_eq!(
        kinds,
        vec![ModerationLogAction::ResolveReport, ModerationLogAction::DeletePost]
    );
    assert_eq!(logs[0].target_id, report.id);

    let queue = services.reports.pending(&moderator, None, None).await.unwrap();
    assert_eq!(queue.total, 0);

    let again = services
        .reports
        .resolve(&moderator, &report.id, ReportResolution::Dismiss, None)
        .await;
    assert!(matches!(again, Err(AppError::InvalidInput(_))));

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_rebuild_search_index_restores_entries() {
    let db = TestDatabase::create_unique().await.unwrap();
    let services = services(&db);
    let forum = db.seed_forum("General").await.unwrap();
    let author = principal(&services, &db, UserRole::User).await;
    let admin = principal(&services, &db, UserRole::Admin).await;

    let created = services
        .topics
        .create_topic(&author, topic_input(&forum.id, "Indexed"))
        .await
        .unwrap();
    services
        .topics
        .reply(&created.topic_id, &author, reply_input("ownership rules"))
        .await
        .unwrap();

    db.conn
        .execute_unprepared("DELETE FROM search_index_entry")
        .await
        .unwrap();
    assert_eq!(search_total(&services, "ownership").await, 0);

    let indexed = services.recount.rebuild_search_index(&admin).await.unwrap();
    assert_eq!(indexed, 2);
    assert_eq!(search_total(&services, "ownership").await, 1);

    let refused = services.recount.rebuild_search_index(&author).await;
    assert!(matches!(refused, Err(AppError::Forbidden(_))));

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_muted_subscription_gets_no_reply_notice() {
    let db = TestDatabase::create_unique().await.unwrap();
    let services = services(&db);
    let forum = db.seed_forum("General").await.unwrap();
    let author = principal(&services, &db, UserRole::User).await;
    let replier = principal(&services, &db, UserRole::User).await;

    let created = services
        .topics
        .create_topic(&author, topic_input(&forum.id, "Muted"))
        .await
        .unwrap();
    let scope = SubscriptionScope::Topic(created.topic_id.clone());
    let subscription = services
        .subscriptions
        .subscribe(&author, scope.clone(), true)
        .await
        .unwrap();

    let refused = services
        .subscriptions
        .update_settings(&replier, &subscription.id, false)
        .await;
    assert!(matches!(refused, Err(AppError::Forbidden(_))));

    services
        .subscriptions
        .update_settings(&author, &subscription.id, false)
        .await
        .unwrap();
    let checked = services.subscriptions.check(&author, &scope).await.unwrap();
    assert_eq!(checked.map(|s| s.notify_replies), Some(false));
    assert!(services.subscriptions.check(&replier, &scope).await.unwrap().is_none());

    services
        .topics
        .reply(&created.topic_id, &replier, reply_input("hello"))
        .await
        .unwrap();
    let page = services
        .notifications
        .list(&author.user_id, 10, None, false)
        .await
        .unwrap();
    assert!(page.notifications.is_empty());

    db.drop_database().await.unwrap();
}
