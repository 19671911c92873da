//! Migration: Create notification_config table (single row)

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(NotificationConfig::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(NotificationConfig::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(NotificationConfig::NotifyUnit)
                            .string_len(10)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(NotificationConfig::NotifyInterval)
                            .integer()
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
                    .table(NotificationConfig::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
enum NotificationConfig {
    Table,
    Id,
    NotifyUnit,
    NotifyInterval,
}
