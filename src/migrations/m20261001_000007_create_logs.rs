//! Migration: Create logs table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Logs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Logs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Logs::LogName).string_len(20).not_null())
                    .col(ColumnDef::new(Logs::Level).string_len(10).not_null())
                    .col(ColumnDef::new(Logs::Msg).text().not_null())
                    .col(
                        ColumnDef::new(Logs::Time)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_logs_time")
                    .table(Logs::Table)
                    .col(Logs::Time)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Logs::Table).if_exists().to_owned())
            .await
    }
}

#[derive(Iden)]
enum Logs {
    Table,
    Id,
    LogName,
    Level,
    Msg,
    Time,
}
