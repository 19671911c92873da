use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;

use crate::config::CONFIG;
use crate::error::{AppError, Result};
use crate::migrations::Migrator;

pub type DbConn = DatabaseConnection;

/// Open the configured database and bring its schema up to date
pub async fn connect() -> Result<DbConn> {
    connect_with_url(&CONFIG.database.database_url).await
}

/// Open a database by URL and run pending migrations
pub async fn connect_with_url(database_url: &str) -> Result<DbConn> {
    let sqlite = database_url.starts_with("sqlite:");
    tracing::info!(
        backend = if sqlite { "sqlite" } else { "postgres" },
        "Connecting to database"
    );

    let mut opts = ConnectOptions::new(database_url);
    // SQLite: concurrent writers on separate connections fail with "database is locked"
    opts.max_connections(if sqlite { 1 } else { 10 })
        .min_connections(1)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(30))
        .sqlx_logging(false);

    let db = Database::connect(opts)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to connect to database: {}", e)))?;

    let pending = Migrator::get_pending_migrations(&db)
        .await
        .map(|m| m.len())
        .unwrap_or_default();
    Migrator::up(&db, None)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to run migrations: {}", e)))?;
    tracing::info!(applied = pending, "Database schema is up to date");

    Ok(db)
}
