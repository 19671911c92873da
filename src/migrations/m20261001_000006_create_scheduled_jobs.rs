//! Migration: Create scheduled_jobs table (persisted scheduler job definitions)

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ScheduledJobs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScheduledJobs::Id)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ScheduledJobs::TriggerUnit)
                            .string_len(10)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ScheduledJobs::TriggerInterval)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ScheduledJobs::MaxInstances)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(ScheduledJobs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ScheduledJobs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(ScheduledJobs::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
enum ScheduledJobs {
    Table,
    Id,
    TriggerUnit,
    TriggerInterval,
    MaxInstances,
    CreatedAt,
    UpdatedAt,
}
