//! Notification engine
//!
//! One sweep finds every due event, mails its recipients over a single SMTP
//! session and marks the event sent right after its attempt. Recipients the
//! server rejects are logged but never hold back the mark, so an event is
//! mailed at most once.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, DbErr};
use thiserror::Error;

use crate::application::logging::ADMIN;
use crate::config::scheduler::FailurePolicy;
use crate::models::event;
use crate::services::event_store;
use crate::services::mail::{MailError, MailTransport, Recipient, NOTIFICATION_SUBJECT};
use crate::services::runtime_config::RuntimeConfig;
use crate::services::scheduler::{JobScheduler, PeriodicTask};

/// Outcome of one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Due events found
    pub candidates: usize,
    /// Events marked sent
    pub marked: usize,
    pub delivered: usize,
    pub undelivered: usize,
    /// Events left unmarked after an error (skip-event policy only)
    pub skipped: usize,
}

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error(transparent)]
    Mail(#[from] MailError),
}

pub struct NotificationEngine {
    runtime_config: RuntimeConfig,
    mailer: Arc<dyn MailTransport>,
    scheduler: JobScheduler,
    policy: FailurePolicy,
}

impl NotificationEngine {
    pub fn new(
        runtime_config: RuntimeConfig,
        mailer: Arc<dyn MailTransport>,
        scheduler: JobScheduler,
        policy: FailurePolicy,
    ) -> Self {
        Self {
            runtime_config,
            mailer,
            scheduler,
            policy,
        }
    }

    /// Notify every event due at `now`
    pub async fn sweep(
        &self,
        db: &DatabaseConnection,
        now: DateTime<Utc>,
    ) -> Result<SweepReport, SweepError> {
        let events = event_store::find_due_events(db, now).await?;
        let mut report = SweepReport {
            candidates: events.len(),
            ..Default::default()
        };

        for event in &events {
            match self.notify_event(db, event).await {
                Ok((delivered, undelivered)) => {
                    report.marked += 1;
                    report.delivered += delivered;
                    report.undelivered += undelivered;
                }
                Err(e) if self.policy == FailurePolicy::SkipEvent => {
                    tracing::error!(
                        target: ADMIN,
                        "Notification service: event \"{}\" (id {}) skipped: {}",
                        event.title,
                        event.id,
                        e
                    );
                    report.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(report)
    }

    /// Mail one event and mark it sent; returns (delivered, undelivered) counts
    async fn notify_event(
        &self,
        db: &DatabaseConnection,
        event: &event::Model,
    ) -> Result<(usize, usize), SweepError> {
        let recipients: Vec<Recipient> = event_store::recipients_of(db, event.id)
            .await?
            .iter()
            .map(Recipient::from)
            .collect();

        let mut counts = (0, 0);
        if !recipients.is_empty() {
            let settings = self.runtime_config.mail_settings()?;
            let delivered = self
                .mailer
                .send(&settings, NOTIFICATION_SUBJECT, &recipients, event)
                .await?;

            let undelivered: Vec<String> = recipients
                .iter()
                .filter(|r| !delivered.contains(r))
                .map(|r| r.username.clone())
                .collect();

            if !delivered.is_empty() {
                let names: Vec<&str> = delivered.iter().map(|r| r.username.as_str()).collect();
                tracing::info!(
                    target: ADMIN,
                    "Notification service: notification has been sent to: {}",
                    names.join(", ")
                );
            }
            if !undelivered.is_empty() {
                tracing::warn!(
                    target: ADMIN,
                    "Notification service: event \"{}\" was not delivered to: {}",
                    event.title,
                    undelivered.join(", ")
                );
            }
            counts = (delivered.len(), undelivered.len());
        }

        event_store::mark_sent(db, event.id).await?;
        Ok(counts)
    }
}

#[async_trait]
impl PeriodicTask for NotificationEngine {
    fn name(&self) -> &'static str {
        "notification_sweep"
    }

    async fn run(&self, db: &DatabaseConnection) -> anyhow::Result<()> {
        match self.sweep(db, Utc::now()).await {
            Ok(report) => {
                tracing::debug!(
                    candidates = report.candidates,
                    marked = report.marked,
                    delivered = report.delivered,
                    undelivered = report.undelivered,
                    skipped = report.skipped,
                    "Notification sweep finished"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    target: ADMIN,
                    "Notification service: unexpected error, the service has been stopped: {}",
                    e
                );
                if let Err(stop_err) = self.scheduler.stop().await {
                    tracing::error!(error = %stop_err, "Failed to remove the notification job");
                }
                Err(e.into())
            }
        }
    }
}
