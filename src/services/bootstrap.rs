//! First-start setup: administrator account and notification job resume

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::application::logging::MAIN;
use crate::config::auth::AdminBootstrap;
use crate::error::{AppError, Result};
use crate::models::prelude::*;
use crate::models::{role, user};
use crate::services::scheduler::{JobScheduler, PeriodicTask};
use crate::services::security::hash_password;

/// Create the configured administrator unless an account with that username
/// or email already exists. Returns the account when one was created.
pub async fn ensure_admin(
    db: &DatabaseConnection,
    admin: &AdminBootstrap,
) -> Result<Option<user::Model>> {
    let existing = User::find()
        .filter(
            user::Column::Username
                .eq(&admin.username)
                .or(user::Column::Email.eq(&admin.email)),
        )
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(None);
    }

    let admin_role = Role::find()
        .filter(role::Column::Name.eq(role::ADMIN))
        .one(db)
        .await?
        .ok_or_else(|| AppError::Internal("Admin role is missing".to_string()))?;

    let created = user::ActiveModel {
        username: Set(admin.username.clone()),
        email: Set(admin.email.clone()),
        password_hash: Set(hash_password(&admin.password)?),
        access_granted: Set(true),
        failed_login_attempts: Set(0),
        pass_change_req: Set(false),
        role_id: Set(admin_role.id),
        last_seen: Set(None),
        creation_date: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!(target: MAIN, "Administrator account \"{}\" created", created.username);
    Ok(Some(created))
}

/// Re-register a notification job left in the job table by a previous run.
///
/// Returns whether a job was resumed.
pub async fn resume_notification_job(
    scheduler: &JobScheduler,
    task: Arc<dyn PeriodicTask>,
) -> Result<bool> {
    let Some(trigger) = scheduler.persisted_trigger().await? else {
        return Ok(false);
    };
    scheduler.start(trigger, task).await?;
    tracing::info!(target: MAIN, "Notification service resumed, runs {}", trigger);
    Ok(true)
}
