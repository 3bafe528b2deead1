//! Create `archived_user` table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ArchivedUser::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ArchivedUser::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ArchivedUser::FirstName)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ArchivedUser::LastName)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ArchivedUser::RegisteredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ArchivedUser::DeletedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ArchivedUser::EventsParticipated)
                            .json_binary()
                            .not_null()
                            .default("[]"),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ArchivedUser::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ArchivedUser {
    Table,
    Id,
    FirstName,
    LastName,
    RegisteredAt,
    DeletedAt,
    EventsParticipated,
}
