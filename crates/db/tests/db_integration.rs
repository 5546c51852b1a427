//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `agora_test`)
//!   `TEST_DB_PASSWORD` (default: `agora_test`)
//!   `TEST_DB_NAME` (default: `agora_test`)

#![allow(clippy::unwrap_used)]

use agora_common::{AppError, IdGenerator};
use agora_db::entities::{post, post_vote, search_index, topic, user::UserRole};
use agora_db::repositories::{
    ForumRepository, LastPost, PostRepository, SearchFilter, SearchIndexRepository, SearchSort,
    TopicRepository, VoteRepository,
};
use agora_db::test_utils::{TestDatabase, TestDbConfig};
use chrono::Utc;
use sea_orm::Set;

async fn insert_topic(
    db: &TestDatabase,
    forum_id: &str,
    user_id: &str,
    title: &str,
) -> (topic::Model, post::Model) {
    let conn = db.shared();
    let ids = IdGenerator::new();
    let now = Utc::now();

    let topic = TopicRepository::new(conn.clone())
        .create(
            conn.as_ref(),
            topic::ActiveModel {
                id: Set(ids.generate()),
                forum_id: Set(forum_id.to_string()),
                user_id: Set(user_id.to_string()),
                title: Set(title.to_string()),
                slug: Set(format!("{}-{}", title.to_lowercase(), ids.generate())),
                views: Set(0),
                replies: Set(0),
                is_locked: Set(false),
                is_pinned: Set(false),
                is_announcement: Set(false),
                poll_id: Set(None),
                last_post_id: Set(None),
                last_post_user_id: Set(None),
                last_post_at: Set(None),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            },
        )
        .await
        .unwrap();

    let post = insert_post(db, &topic.id, user_id, title).await;
    (topic, post)
}

async fn insert_post(db: &TestDatabase, topic_id: &str, user_id: &str, content: &str) -> post::Model {
    let conn = db.shared();
    let ids = IdGenerator::new();
    let now = Utc::now();

    let post = PostRepository::new(conn.clone())
        .create(
            conn.as_ref(),
            post::ActiveModel {
                id: Set(ids.generate()),
                topic_id: Set(topic_id.to_string()),
                user_id: Set(user_id.to_string()),
                content: Set(content.to_string()),
                edited_by: Set(None),
                edited_at: Set(None),
                is_deleted: Set(false),
                deleted_by: Set(None),
                deleted_at: Set(None),
                created_at: Set(now.into()),
            },
        )
        .await
        .unwrap();

    SearchIndexRepository::new(conn.clone())
        .create(
            conn.as_ref(),
            search_index::ActiveModel {
                id: Set(ids.generate()),
                post_id: Set(post.id.clone()),
                topic_id: Set(topic_id.to_string()),
                user_id: Set(user_id.to_string()),
                content_text: Set(content.to_string()),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            },
        )
        .await
        .unwrap();

    post
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_database_connection() {
    let config = TestDbConfig::default();
    let result = TestDatabase::with_config(config).await;
    assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_floored_counter_never_negative() {
    let db = TestDatabase::create_unique().await.unwrap();
    let conn = db.shared();
    let forum = db.seed_forum("General").await.unwrap();
    let forums = ForumRepository::new(conn.clone());

    forums.adjust_counts(conn.as_ref(), &forum.id, 1, 2).await.unwrap();
    forums.adjust_counts(conn.as_ref(), &forum.id, -5, -5).await.unwrap();

    let forum = forums.get_by_id(conn.as_ref(), &forum.id).await.unwrap();
    assert_eq!(forum.topics_count, 0);
    assert_eq!(forum.posts_count, 0);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_latest_post_skips_deleted() {
    let db = TestDatabase::create_unique().await.unwrap();
    let conn = db.shared();
    let user = db.seed_user(UserRole::User).await.unwrap();
    let forum = db.seed_forum("General").await.unwrap();
    let posts = PostRepository::new(conn.clone());

    let (topic, first) = insert_topic(&db, &forum.id, &user.id, "Hello").await;
    let second = insert_post(&db, &topic.id, &user.id, "second").await;

    let latest = posts.latest_in_topic(conn.as_ref(), &topic.id).await.unwrap();
    assert_eq!(latest.map(|p| p.id), Some(second.id.clone()));

    posts
        .set_deleted(conn.as_ref(), &second.id, Some((&user.id, Utc::now().into())))
        .await
        .unwrap();
    let latest = posts.latest_in_forum(conn.as_ref(), &forum.id).await.unwrap();
    assert_eq!(latest.map(|p| p.id), Some(first.id.clone()));
    assert_eq!(posts.count_live_in_forum(conn.as_ref(), &forum.id).await.unwrap(), 1);

    let topics = TopicRepository::new(conn.clone());
    topics
        .set_last_post(conn.as_ref(), &topic.id, Some(&LastPost::from(&first)))
        .await
        .unwrap();
    let topic = topics.get_by_id(conn.as_ref(), &topic.id).await.unwrap();
    assert_eq!(topic.last_post_id, Some(first.id));

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_duplicate_vote_is_conflict() {
    let db = TestDatabase::create_unique().await.unwrap();
    let conn = db.shared();
    let author = db.seed_user(UserRole::User).await.unwrap();
    let voter = db.seed_user(UserRole::User).await.unwrap();
    let forum = db.seed_forum("General").await.unwrap();
    let (_, post) = insert_topic(&db, &forum.id, &author.id, "Votes").await;
    let votes = VoteRepository::new(conn.clone());
    let ids = IdGenerator::new();

    let vote = |id: String| post_vote::ActiveModel {
        id: Set(id),
        post_id: Set(post.id.clone()),
        user_id: Set(voter.id.clone()),
        vote_type: Set(post_vote::VoteType::Up),
        created_at: Set(Utc::now().into()),
    };

    votes.create(conn.as_ref(), vote(ids.generate())).await.unwrap();
    let result = votes.create(conn.as_ref(), vote(ids.generate())).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    let tally = votes.tally_for(&post.id).await.unwrap();
    assert_eq!((tally.upvotes, tally.downvotes), (1, 0));

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_search_hides_deleted_posts() {
    let db = TestDatabase::create_unique().await.unwrap();
    let conn = db.shared();
    let user = db.seed_user(UserRole::User).await.unwrap();
    let forum = db.seed_forum("General").await.unwrap();
    let (topic, post) = insert_topic(&db, &forum.id, &user.id, "Borrowing").await;
    let search = SearchIndexRepository::new(conn.clone());

    let filter = SearchFilter {
        query: "BORROW".to_string(),
        sort: SearchSort::Recent,
        limit: 10,
        ..SearchFilter::default()
    };
    let (found, total) = search.search(&filter).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(found[0].id, topic.id);

    PostRepository::new(conn.clone())
        .set_deleted(conn.as_ref(), &post.id, Some((&user.id, Utc::now().into())))
        .await
        .unwrap();
    let (found, total) = search.search(&filter).await.unwrap();
    assert_eq!(total, 0);
    assert!(found.is_empty());

    let again = PostRepository::new(conn.clone())
        .set_deleted(conn.as_ref(), &post.id, Some((&user.id, Utc::now().into())))
        .await;
    assert!(matches!(again, Err(AppError::Conflict(_))));

    db.drop_database().await.unwrap();
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(!config.username.is_empty());
    assert!(!config.database.is_empty());
}

#[test]
fn test_postgres_url_format() {
    let config = TestDbConfig::default();
    let url = config.postgres_url();
    assert!(url.ends_with("/postgres"));
}
