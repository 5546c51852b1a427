//! Create topic, post and search index tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ForumTopic::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ForumTopic::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ForumTopic::ForumId).string_len(32).not_null())
                    .col(ColumnDef::new(ForumTopic::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(ForumTopic::Title).string_len(512).not_null())
                    .col(
                        ColumnDef::new(ForumTopic::Slug)
                            .string_len(600)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(ForumTopic::Views)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ForumTopic::Replies)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ForumTopic::IsLocked)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ForumTopic::IsPinned)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ForumTopic::IsAnnouncement)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(ForumTopic::PollId).string_len(32))
                    .col(ColumnDef::new(ForumTopic::LastPostId).string_len(32))
                    .col(ColumnDef::new(ForumTopic::LastPostUserId).string_len(32))
                    .col(ColumnDef::new(ForumTopic::LastPostAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(ForumTopic::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ForumTopic::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_forum_topic_forum")
                            .from(ForumTopic::Table, ForumTopic::ForumId)
                            .to(Forum::Table, Forum::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_forum_topic_user")
                            .from(ForumTopic::Table, ForumTopic::UserId)
                            .to(ForumUser::Table, ForumUser::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (forum_id, is_pinned, last_post_at) for forum listings
        manager
            .create_index(
                Index::create()
                    .name("idx_forum_topic_listing")
                    .table(ForumTopic::Table)
                    .col(ForumTopic::ForumId)
                    .col(ForumTopic::IsPinned)
                    .col(ForumTopic::LastPostAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ForumPost::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ForumPost::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ForumPost::TopicId).string_len(32).not_null())
                    .col(ColumnDef::new(ForumPost::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(ForumPost::Content).text().not_null())
                    .col(ColumnDef::new(ForumPost::EditedBy).string_len(32))
                    .col(ColumnDef::new(ForumPost::EditedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(ForumPost::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(ForumPost::DeletedBy).string_len(32))
                    .col(ColumnDef::new(ForumPost::DeletedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(ForumPost::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_forum_post_topic")
                            .from(ForumPost::Table, ForumPost::TopicId)
                            .to(ForumTopic::Table, ForumTopic::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_forum_post_user")
                            .from(ForumPost::Table, ForumPost::UserId)
                            .to(ForumUser::Table, ForumUser::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (topic_id, is_deleted, created_at) for last-post recomputation
        manager
            .create_index(
                Index::create()
                    .name("idx_forum_post_topic_created")
                    .table(ForumPost::Table)
                    .col(ForumPost::TopicId)
                    .col(ForumPost::IsDeleted)
                    .col(ForumPost::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SearchIndexEntry::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SearchIndexEntry::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SearchIndexEntry::PostId)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(SearchIndexEntry::TopicId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SearchIndexEntry::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(SearchIndexEntry::ContentText).text().not_null())
                    .col(
                        ColumnDef::new(SearchIndexEntry::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(SearchIndexEntry::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_search_index_entry_post")
                            .from(SearchIndexEntry::Table, SearchIndexEntry::PostId)
                            .to(ForumPost::Table, ForumPost::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_search_index_entry_topic")
                            .from(SearchIndexEntry::Table, SearchIndexEntry::TopicId)
                            .to(ForumTopic::Table, ForumTopic::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_search_index_entry_topic_id")
                    .table(SearchIndexEntry::Table)
                    .col(SearchIndexEntry::TopicId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SearchIndexEntry::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ForumPost::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ForumTopic::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ForumTopic {
    Table,
    Id,
    ForumId,
    UserId,
    Title,
    Slug,
    Views,
    Replies,
    IsLocked,
    IsPinned,
    IsAnnouncement,
    PollId,
    LastPostId,
    LastPostUserId,
    LastPostAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ForumPost {
    Table,
    Id,
    TopicId,
    UserId,
    Content,
    EditedBy,
    EditedAt,
    IsDeleted,
    DeletedBy,
    DeletedAt,
    CreatedAt,
}

#[derive(Iden)]
enum SearchIndexEntry {
    Table,
    Id,
    PostId,
    TopicId,
    UserId,
    ContentText,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Forum {
    Table,
    Id,
}

#[derive(Iden)]
enum ForumUser {
    Table,
    Id,
}
