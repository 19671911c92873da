pub use sea_orm_migration::prelude::*;

mod m20261001_000001_create_roles;
mod m20261001_000002_create_users;
mod m20261001_000003_create_events;
mod m20261001_000004_create_user_to_event;
mod m20261001_000005_create_notification_config;
mod m20261001_000006_create_scheduled_jobs;
mod m20261001_000007_create_logs;
mod m20261001_000008_seed_defaults;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_000001_create_roles::Migration),
            Box::new(m20261001_000002_create_users::Migration),
            Box::new(m20261001_000003_create_events::Migration),
            Box::new(m20261001_000004_create_user_to_event::Migration),
            Box::new(m20261001_000005_create_notification_config::Migration),
            Box::new(m20261001_000006_create_scheduled_jobs::Migration),
            Box::new(m20261001_000007_create_logs::Migration),
            Box::new(m20261001_000008_seed_defaults::Migration),
        ]
    }
}
