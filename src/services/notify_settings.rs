//! Admin control over the notification service
//!
//! Applies one submission of the settings form: mail fields are staged into the
//! runtime cache, the recurrence is persisted, and the job is started, replaced
//! or stopped depending on the requested state and a live SMTP test.

use std::sync::Arc;

use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, Set};
use serde::Serialize;

use crate::application::logging::ADMIN;
use crate::error::Result;
use crate::models::notification_config;
use crate::models::prelude::*;
use crate::schemas::{NotifySettingsForm, NotifySettingsResponse, NotifyStatus};
use crate::services::mail::MailTransport;
use crate::services::runtime_config::{
    RuntimeConfig, MAIL_PASSWORD, MAIL_PORT, MAIL_SECURITY, MAIL_SERVER, MAIL_USERNAME,
};
use crate::services::scheduler::{IntervalUnit, JobScheduler, PeriodicTask, Trigger};

pub const SERVICE_STARTED: &str =
    "Connection with mail server established correctly! The notify service is running!";
pub const SERVICE_STOPPED: &str = "The notify service has been turned off!";
pub const SERVICE_CONFIG_CHANGED: &str = "The notification service config has been changed!";
pub const SERVICE_UNCHANGED: &str = "No changes have been made.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotifyOutcome {
    /// Job registered after a successful mail test
    Started,
    /// Running job replaced with a new trigger
    Reconfigured,
    Stopped,
    /// Settings changed without a change of job state
    ConfigChanged,
    NoChange,
    /// Mail test rejected the credentials; job left stopped
    AuthenticationFailed,
    /// Mail test failed for any other reason; job left stopped
    ConnectionFailed,
}

impl NotifyOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            NotifyOutcome::AuthenticationFailed | NotifyOutcome::ConnectionFailed
        )
    }

    pub fn message(&self) -> &'static str {
        match self {
            NotifyOutcome::Started => SERVICE_STARTED,
            NotifyOutcome::Reconfigured | NotifyOutcome::ConfigChanged => SERVICE_CONFIG_CHANGED,
            NotifyOutcome::Stopped => SERVICE_STOPPED,
            NotifyOutcome::NoChange => SERVICE_UNCHANGED,
            NotifyOutcome::AuthenticationFailed => "Connection issue. Check your credentials!",
            NotifyOutcome::ConnectionFailed => "Connection issue. Check mail configuration!",
        }
    }
}

#[derive(Clone)]
pub struct NotifySettingsController {
    db: DatabaseConnection,
    runtime_config: RuntimeConfig,
    scheduler: JobScheduler,
    mailer: Arc<dyn MailTransport>,
    task: Arc<dyn PeriodicTask>,
}

impl NotifySettingsController {
    pub fn new(
        db: DatabaseConnection,
        runtime_config: RuntimeConfig,
        scheduler: JobScheduler,
        mailer: Arc<dyn MailTransport>,
        task: Arc<dyn PeriodicTask>,
    ) -> Self {
        Self {
            db,
            runtime_config,
            scheduler,
            mailer,
            task,
        }
    }

    /// Settings as the admin form shows them
    pub async fn current(&self) -> std::result::Result<NotifySettingsResponse, DbErr> {
        let config = load_config(&self.db).await?;
        let field = |key: &str| self.runtime_config.get(key).unwrap_or_default();

        Ok(NotifySettingsResponse {
            service_running: self.scheduler.is_running(),
            notify_unit: config.notify_unit,
            notify_interval: config.notify_interval,
            mail_server: field(MAIL_SERVER),
            mail_port: field(MAIL_PORT),
            mail_security: field(MAIL_SECURITY),
            mail_username: field(MAIL_USERNAME),
            mail_password_set: !field(MAIL_PASSWORD).is_empty(),
        })
    }

    pub async fn apply(&self, form: &NotifySettingsForm) -> Result<NotifyOutcome> {
        let mail_changed = self.stage_mail_fields(form);
        let schedule_changed = self.persist_schedule(form).await?;
        let changed = mail_changed || schedule_changed;

        let interval = u32::try_from(form.notify_interval.max(1)).unwrap_or(1);
        let trigger = Trigger::new(interval, form.notify_unit);
        let running = self.scheduler.is_running();

        let outcome = match form.notify_status {
            NotifyStatus::Off if running => {
                self.scheduler.stop().await?;
                NotifyOutcome::Stopped
            }
            NotifyStatus::Off if changed => NotifyOutcome::ConfigChanged,
            NotifyStatus::Off => NotifyOutcome::NoChange,
            NotifyStatus::On => match self.test_mail().await {
                Err(authentication) => {
                    if running {
                        self.scheduler.stop().await?;
                    }
                    if authentication {
                        NotifyOutcome::AuthenticationFailed
                    } else {
                        NotifyOutcome::ConnectionFailed
                    }
                }
                Ok(()) if !running => {
                    self.scheduler.start(trigger, self.task.clone()).await?;
                    NotifyOutcome::Started
                }
                Ok(()) if self.scheduler.current_trigger() != Some(trigger) => {
                    self.scheduler.start(trigger, self.task.clone()).await?;
                    NotifyOutcome::Reconfigured
                }
                Ok(()) if changed => NotifyOutcome::ConfigChanged,
                Ok(()) => NotifyOutcome::NoChange,
            },
        };

        if outcome.is_failure() {
            tracing::warn!(target: ADMIN, "Notification service: {}", outcome.message());
        } else if outcome != NotifyOutcome::NoChange {
            tracing::info!(target: ADMIN, "Notification service: {}", outcome.message());
        }
        Ok(outcome)
    }

    /// Write every non-blank submitted mail field that differs from the cache
    fn stage_mail_fields(&self, form: &NotifySettingsForm) -> bool {
        let submitted = [
            (MAIL_SERVER, form.mail_server.clone()),
            (MAIL_PORT, form.mail_port.map(|p| p.to_string())),
            (MAIL_SECURITY, form.mail_security.map(|s| s.as_str().to_string())),
            (MAIL_USERNAME, form.mail_username.clone()),
            (MAIL_PASSWORD, form.mail_password.clone()),
        ];

        let mut changed = false;
        for (key, value) in submitted {
            let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
                continue;
            };
            // Secrets are stored exactly as typed
            let value = if key == MAIL_PASSWORD { value } else { value.trim().to_string() };
            if self.runtime_config.get(key).as_deref() != Some(value.as_str()) {
                self.runtime_config.set(key, value);
                tracing::info!(target: ADMIN, "Notification service: {} updated", key);
                changed = true;
            }
        }
        changed
    }

    async fn persist_schedule(&self, form: &NotifySettingsForm) -> std::result::Result<bool, DbErr> {
        let config = load_config(&self.db).await?;
        let unit = form.notify_unit.as_str();
        if config.notify_unit == unit && config.notify_interval == form.notify_interval {
            return Ok(false);
        }

        let mut active: notification_config::ActiveModel = config.into();
        active.notify_unit = Set(unit.to_string());
        active.notify_interval = Set(form.notify_interval);
        active.update(&self.db).await?;
        Ok(true)
    }

    /// `Err(true)` on an authentication failure, `Err(false)` on any other failure
    async fn test_mail(&self) -> std::result::Result<(), bool> {
        let settings = self.runtime_config.mail_settings().map_err(|e| e.is_authentication())?;
        self.mailer
            .test_connection(&settings)
            .await
            .map_err(|e| e.is_authentication())
    }
}

/// The singleton notification config row, created with defaults when missing
pub async fn load_config(
    db: &DatabaseConnection,
) -> std::result::Result<notification_config::Model, DbErr> {
    if let Some(config) = NotificationConfig::find().one(db).await? {
        return Ok(config);
    }
    notification_config::ActiveModel {
        notify_unit: Set(IntervalUnit::Hours.as_str().to_string()),
        notify_interval: Set(1),
        ..Default::default()
    }
    .insert(db)
    .await
}
