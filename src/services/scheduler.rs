//! Single-job interval scheduler
//!
//! Runs at most one named job, `notification-job`, on a fixed interval. The job
//! row in `scheduled_jobs` exists exactly while the job is registered, so a
//! restart can tell whether the service was on.
//!
//! Jobs implement [`PeriodicTask`]. Replacing the trigger swaps the running
//! loop for a new one; a shared run lock keeps ticks from overlapping, even
//! across a replacement, and a tick that finds the lock taken is skipped.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::application::logging::ADMIN;
use crate::models::prelude::*;
use crate::models::scheduled_job;

/// Identifier of the notification job
pub const NOTIFICATION_JOB_ID: &str = "notification-job";

/// Trait for periodic background tasks
#[async_trait]
pub trait PeriodicTask: Send + Sync {
    /// Task name for logging
    fn name(&self) -> &'static str;

    /// Execute the task
    async fn run(&self, db: &DatabaseConnection) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum IntervalUnit {
    Seconds,
    Minutes,
    Hours,
}

impl IntervalUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntervalUnit::Seconds => "seconds",
            IntervalUnit::Minutes => "minutes",
            IntervalUnit::Hours => "hours",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "seconds" => Some(IntervalUnit::Seconds),
            "minutes" => Some(IntervalUnit::Minutes),
            "hours" => Some(IntervalUnit::Hours),
            _ => None,
        }
    }

    fn seconds(&self) -> u64 {
        match self {
            IntervalUnit::Seconds => 1,
            IntervalUnit::Minutes => 60,
            IntervalUnit::Hours => 3600,
        }
    }
}

/// Fixed-interval trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger {
    pub interval: u32,
    pub unit: IntervalUnit,
}

impl Trigger {
    pub fn new(interval: u32, unit: IntervalUnit) -> Self {
        Self { interval, unit }
    }

    /// Time between ticks; never zero
    pub fn period(&self) -> Duration {
        Duration::from_secs(u64::from(self.interval.max(1)) * self.unit.seconds())
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "every {} {}", self.interval, self.unit.as_str())
    }
}

struct RunningJob {
    trigger: Trigger,
    stop_tx: watch::Sender<bool>,
}

/// Handle to the scheduler; clones share the same job slot
#[derive(Clone)]
pub struct JobScheduler {
    db: DatabaseConnection,
    slot: Arc<Mutex<Option<RunningJob>>>,
    run_lock: Arc<tokio::sync::Mutex<()>>,
    /// Serializes start and stop so the slot and the job row agree
    control: Arc<tokio::sync::Mutex<()>>,
}

impl JobScheduler {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            slot: Arc::new(Mutex::new(None)),
            run_lock: Arc::new(tokio::sync::Mutex::new(())),
            control: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    pub fn is_running(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Trigger of the registered job, if any
    pub fn current_trigger(&self) -> Option<Trigger> {
        self.slot.lock().as_ref().map(|job| job.trigger)
    }

    /// Register the job, replacing any existing one.
    ///
    /// The first tick fires one period from now. A tick already in flight for
    /// the replaced job finishes undisturbed.
    pub async fn start(&self, trigger: Trigger, task: Arc<dyn PeriodicTask>) -> Result<(), DbErr> {
        let _control = self.control.lock().await;
        self.persist(trigger).await?;

        let (stop_tx, stop_rx) = watch::channel(false);
        let previous = self.slot.lock().replace(RunningJob { trigger, stop_tx });
        let replaced = previous.is_some();
        if let Some(previous) = previous {
            let _ = previous.stop_tx.send(true);
        }

        tokio::spawn(run_job(
            task,
            self.db.clone(),
            trigger,
            self.run_lock.clone(),
            stop_rx,
        ));

        if replaced {
            tracing::info!(target: ADMIN, "Scheduler: job '{}' rescheduled {}", NOTIFICATION_JOB_ID, trigger);
        } else {
            tracing::info!(target: ADMIN, "Scheduler: job '{}' added, runs {}", NOTIFICATION_JOB_ID, trigger);
        }
        Ok(())
    }

    /// Deregister the job. No-op when nothing is registered.
    ///
    /// Prevents future ticks only; a tick in flight runs to completion.
    pub async fn stop(&self) -> Result<(), DbErr> {
        let _control = self.control.lock().await;
        let previous = self.slot.lock().take();
        if let Some(job) = previous {
            let _ = job.stop_tx.send(true);
            tracing::info!(target: ADMIN, "Scheduler: job '{}' removed", NOTIFICATION_JOB_ID);
        }

        ScheduledJob::delete_by_id(NOTIFICATION_JOB_ID.to_string())
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// Trigger stored in the job table by a previous run of the process
    pub async fn persisted_trigger(&self) -> Result<Option<Trigger>, DbErr> {
        let row = ScheduledJob::find_by_id(NOTIFICATION_JOB_ID.to_string())
            .one(&self.db)
            .await?;

        Ok(row.and_then(|job| {
            let unit = IntervalUnit::parse(&job.trigger_unit)?;
            let interval = u32::try_from(job.trigger_interval).ok()?;
            Some(Trigger::new(interval, unit))
        }))
    }

    async fn persist(&self, trigger: Trigger) -> Result<(), DbErr> {
        let now = Utc::now();
        let existing = ScheduledJob::find_by_id(NOTIFICATION_JOB_ID.to_string())
            .one(&self.db)
            .await?;

        let interval = i32::try_from(trigger.interval).unwrap_or(i32::MAX);
        match existing {
            Some(job) => {
                let mut job: scheduled_job::ActiveModel = job.into();
                job.trigger_unit = Set(trigger.unit.as_str().to_string());
                job.trigger_interval = Set(interval);
                job.updated_at = Set(now);
                job.update(&self.db).await?;
            }
            None => {
                scheduled_job::ActiveModel {
                    id: Set(NOTIFICATION_JOB_ID.to_string()),
                    trigger_unit: Set(trigger.unit.as_str().to_string()),
                    trigger_interval: Set(interval),
                    max_instances: Set(1),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(&self.db)
                .await?;
            }
        }
        Ok(())
    }
}

async fn run_job(
    task: Arc<dyn PeriodicTask>,
    db: DatabaseConnection,
    trigger: Trigger,
    run_lock: Arc<tokio::sync::Mutex<()>>,
    mut stop_rx: watch::Receiver<bool>,
) {
    let period = trigger.period();
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
                continue;
            }
        }

        if *stop_rx.borrow() {
            break;
        }

        let Ok(_guard) = run_lock.try_lock() else {
            tracing::warn!(task = task.name(), "Previous run still in progress, skipping tick");
            continue;
        };

        tracing::debug!(task = task.name(), "Running periodic task");

        match task.run(&db).await {
            Ok(()) => {
                tracing::debug!(task = task.name(), "Periodic task completed");
            }
            Err(e) => {
                tracing::error!(task = task.name(), error = %e, "Periodic task failed");
            }
        }
    }

    tracing::debug!(task = task.name(), "Job loop finished");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_unit_parse() {
        assert_eq!(IntervalUnit::parse("Minutes"), Some(IntervalUnit::Minutes));
        assert_eq!(IntervalUnit::parse(" hours "), Some(IntervalUnit::Hours));
        assert_eq!(IntervalUnit::parse("days"), None);
    }

    #[test]
    fn test_trigger_period() {
        assert_eq!(Trigger::new(5, IntervalUnit::Minutes).period(), Duration::from_secs(300));
        assert_eq!(Trigger::new(1, IntervalUnit::Hours).period(), Duration::from_secs(3600));
        assert_eq!(Trigger::new(0, IntervalUnit::Seconds).period(), Duration::from_secs(1));
    }

    #[test]
    fn test_trigger_display() {
        assert_eq!(Trigger::new(2, IntervalUnit::Hours).to_string(), "every 2 hours");
    }
}
