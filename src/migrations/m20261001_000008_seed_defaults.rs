use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        seed_roles(db).await?;
        seed_notification_config(db).await?;

        Ok(())
    }

    async fn down(&self, _manager: &SchemaManager) -> Result<(), DbErr> {
        // Seeding is not reversible - data may have been modified
        Ok(())
    }
}

async fn seed_roles(db: &SchemaManagerConnection<'_>) -> Result<(), DbErr> {
    use crate::models::prelude::*;
    use crate::models::role;

    if Role::find().count(db).await? > 0 {
        return Ok(());
    }

    let default_roles = [
        (role::ADMIN, "Full administrator access"),
        (role::STANDARD, "Standard user, can be notified about events"),
    ];

    for (name, description) in default_roles {
        role::ActiveModel {
            name: Set(name.to_string()),
            description: Set(Some(description.to_string())),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    Ok(())
}

async fn seed_notification_config(db: &SchemaManagerConnection<'_>) -> Result<(), DbErr> {
    use crate::models::notification_config;
    use crate::models::prelude::*;

    if NotificationConfig::find().count(db).await? > 0 {
        return Ok(());
    }

    notification_config::ActiveModel {
        notify_unit: Set("hours".to_string()),
        notify_interval: Set(1),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(())
}
