//! Create subscription, notification and bookmark tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ForumSubscription::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ForumSubscription::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ForumSubscription::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ForumSubscription::TopicId).string_len(32))
                    .col(ColumnDef::new(ForumSubscription::ForumId).string_len(32))
                    .col(
                        ColumnDef::new(ForumSubscription::NotifyReplies)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ForumSubscription::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    // Exactly one scope per row
                    .check(Expr::cust("(topic_id IS NULL) <> (forum_id IS NULL)"))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_forum_subscription_user")
                            .from(ForumSubscription::Table, ForumSubscription::UserId)
                            .to(ForumUser::Table, ForumUser::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_forum_subscription_topic")
                            .from(ForumSubscription::Table, ForumSubscription::TopicId)
                            .to(ForumTopic::Table, ForumTopic::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_forum_subscription_forum")
                            .from(ForumSubscription::Table, ForumSubscription::ForumId)
                            .to(Forum::Table, Forum::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // NULL scopes never collide, so these two cover both kinds of row.
        manager
            .create_index(
                Index::create()
                    .name("idx_forum_subscription_user_topic")
                    .table(ForumSubscription::Table)
                    .col(ForumSubscription::UserId)
                    .col(ForumSubscription::TopicId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_forum_subscription_user_forum")
                    .table(ForumSubscription::Table)
                    .col(ForumSubscription::UserId)
                    .col(ForumSubscription::ForumId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ForumNotification::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ForumNotification::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ForumNotification::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ForumNotification::NotificationType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ForumNotification::TopicId).string_len(32))
                    .col(ColumnDef::new(ForumNotification::PostId).string_len(32))
                    .col(ColumnDef::new(ForumNotification::FromUserId).string_len(32))
                    .col(ColumnDef::new(ForumNotification::Content).text())
                    .col(
                        ColumnDef::new(ForumNotification::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ForumNotification::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_forum_notification_user")
                            .from(ForumNotification::Table, ForumNotification::UserId)
                            .to(ForumUser::Table, ForumUser::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_forum_notification_topic")
                            .from(ForumNotification::Table, ForumNotification::TopicId)
                            .to(ForumTopic::Table, ForumTopic::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_forum_notification_post")
                            .from(ForumNotification::Table, ForumNotification::PostId)
                            .to(ForumPost::Table, ForumPost::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (user_id, is_read) for unread count
        manager
            .create_index(
                Index::create()
                    .name("idx_forum_notification_user_is_read")
                    .table(ForumNotification::Table)
                    .col(ForumNotification::UserId)
                    .col(ForumNotification::IsRead)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TopicBookmark::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TopicBookmark::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TopicBookmark::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(TopicBookmark::TopicId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(TopicBookmark::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_topic_bookmark_user")
                            .from(TopicBookmark::Table, TopicBookmark::UserId)
                            .to(ForumUser::Table, ForumUser::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_topic_bookmark_topic")
                            .from(TopicBookmark::Table, TopicBookmark::TopicId)
                            .to(ForumTopic::Table, ForumTopic::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_topic_bookmark_user_topic")
                    .table(TopicBookmark::Table)
                    .col(TopicBookmark::UserId)
                    .col(TopicBookmark::TopicId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TopicBookmark::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ForumNotification::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ForumSubscription::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ForumSubscription {
    Table,
    Id,
    UserId,
    TopicId,
    ForumId,
    NotifyReplies,
    CreatedAt,
}

#[derive(Iden)]
enum ForumNotification {
    Table,
    Id,
    UserId,
    NotificationType,
    TopicId,
    PostId,
    FromUserId,
    Content,
    IsRead,
    CreatedAt,
}

#[derive(Iden)]
enum TopicBookmark {
    Table,
    Id,
    UserId,
    TopicId,
    CreatedAt,
}

#[derive(Iden)]
enum ForumUser {
    Table,
    Id,
}

#[derive(Iden)]
enum Forum {
    Table,
    Id,
}

#[derive(Iden)]
enum ForumTopic {
    Table,
    Id,
}

#[derive(Iden)]
enum ForumPost {
    Table,
    Id,
}
