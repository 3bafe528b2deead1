//! Create `pending_deletion` table.

use sea_orm_migration::prelude::*;

use super::m20250301_000001_create_user_table::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PendingDeletion::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PendingDeletion::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PendingDeletion::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PendingDeletion::DeletionDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PendingDeletion::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pending_deletion_user")
                            .from(PendingDeletion::Table, PendingDeletion::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one pending deletion per user; concurrent schedulers race
        // on this index and the loser surfaces ALREADY_SCHEDULED
        manager
            .create_index(
                Index::create()
                    .name("idx_pending_deletion_user_id")
                    .table(PendingDeletion::Table)
                    .col(PendingDeletion::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index on deletion_date for the due sweep
        manager
            .create_index(
                Index::create()
                    .name("idx_pending_deletion_deletion_date")
                    .table(PendingDeletion::Table)
                    .col(PendingDeletion::DeletionDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PendingDeletion::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PendingDeletion {
    Table,
    Id,
    UserId,
    DeletionDate,
    CreatedAt,
}
