//! Migration: Create user_to_event junction table (event recipients)

use sea_orm_migration::prelude::*;

use super::m20261001_000002_create_users::Users;
use super::m20261001_000003_create_events::Events;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserToEvent::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UserToEvent::EventId).big_integer().not_null())
                    .col(ColumnDef::new(UserToEvent::UserId).big_integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(UserToEvent::EventId)
                            .col(UserToEvent::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(UserToEvent::Table, UserToEvent::EventId)
                            .to(Events::Table, Events::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(UserToEvent::Table, UserToEvent::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserToEvent::Table).if_exists().to_owned())
            .await
    }
}

#[derive(Iden)]
enum UserToEvent {
    Table,
    EventId,
    UserId,
}
