//! Database migrations.
//!
//! Schema migrations for the forum database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_user_tables;
mod m20250101_000002_create_forum_tables;
mod m20250101_000003_create_topic_post_tables;
mod m20250101_000004_create_reputation_tables;
mod m20250101_000005_create_moderation_tables;
mod m20250101_000006_create_engagement_tables;
mod m20250101_000007_create_poll_tables;
mod m20250101_000008_create_report_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_user_tables::Migration),
            Box::new(m20250101_000002_create_forum_tables::Migration),
            Box::new(m20250101_000003_create_topic_post_tables::Migration),
            Box::new(m20250101_000004_create_reputation_tables::Migration),
            Box::new(m20250101_000005_create_moderation_tables::Migration),
            Box::new(m20250101_000006_create_engagement_tables::Migration),
            Box::new(m20250101_000007_create_poll_tables::Migration),
            Box::new(m20250101_000008_create_report_table::Migration),
        ]
    }
}
