//! Logging setup
//!
//! Everything goes through `tracing`. Records on the three application
//! channels ([`MAIN`], [`AUTH`], [`ADMIN`]) are additionally persisted to the
//! `logs` table by [`DatabaseSink`], which hands them to a dedicated writer
//! task. The writer never logs on those channels itself, so persisting a record
//! cannot produce another one.

use std::fs::OpenOptions;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;
use crate::models::log;
use crate::services::search::SearchService;

/// General application events (event CRUD)
pub const MAIN: &str = "main";
/// Logins, lockouts and password changes
pub const AUTH: &str = "auth";
/// Admin portal actions, mail and notification service
pub const ADMIN: &str = "admin";

pub const CHANNELS: [&str; 3] = [MAIN, AUTH, ADMIN];

/// A log line captured for the database
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub log_name: String,
    pub level: String,
    pub msg: String,
    pub time: DateTime<Utc>,
}

pub type LogReceiver = mpsc::UnboundedReceiver<LogRecord>;

/// Layer forwarding channel records to the log writer task
pub struct DatabaseSink {
    tx: mpsc::UnboundedSender<LogRecord>,
}

impl DatabaseSink {
    pub fn new() -> (Self, LogReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl<S: Subscriber> Layer<S> for DatabaseSink {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if !CHANNELS.contains(&meta.target()) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        // Receiver gone means shutdown; nothing left to persist to
        let _ = self.tx.send(LogRecord {
            log_name: meta.target().to_string(),
            level: meta.level().to_string(),
            msg: visitor.finish(),
            time: Utc::now(),
        });
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<String>,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else {
            format!("{} {}", self.message, self.fields.join(" "))
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }
}

fn default_filter(level: &str) -> String {
    format!(
        "reminder={level},{MAIN}={level},{AUTH}={level},{ADMIN}={level},tower_http=info"
    )
}

/// Install the global subscriber: stdout, optional file, and the database sink.
///
/// Returns the receiving end of the sink; records queue there until
/// [`spawn_log_writer`] is started.
pub fn init(config: &Config) -> anyhow::Result<LogReceiver> {
    let (sink, rx) = DatabaseSink::new();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(&config.log_level)));

    let (plain, json) = if config.log_json {
        (None, Some(fmt::layer().json()))
    } else {
        (Some(fmt::layer().with_ansi(false)), None)
    };

    let file = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(plain)
        .with(json)
        .with(file)
        .with(sink)
        .try_init()?;

    Ok(rx)
}

/// Drain captured records into the `logs` table, one insert per record, and
/// mirror each row into the search index.
pub fn spawn_log_writer(
    mut rx: LogReceiver,
    db: DatabaseConnection,
    search: SearchService,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(record) = rx.recv().await {
            let row = log::ActiveModel {
                log_name: Set(record.log_name),
                level: Set(record.level),
                msg: Set(record.msg),
                time: Set(record.time),
                ..Default::default()
            };

            match row.insert(&db).await {
                Ok(saved) => search.index_log(&saved).await,
                Err(e) => tracing::warn!(error = %e, "Failed to persist log record"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_sink_keeps_only_application_channels() {
        let (sink, mut rx) = DatabaseSink::new();
        let subscriber = tracing_subscriber::registry().with(sink);

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: ADMIN, "Notification service has been started");
            tracing::warn!(target: AUTH, user = "bob", "Account locked");
            tracing::info!(target: "reminder::services", "internal detail");
        });

        let first = rx.try_recv().unwrap();
        assert_eq!(first.log_name, "admin");
        assert_eq!(first.level, "INFO");
        assert_eq!(first.msg, "Notification service has been started");

        let second = rx.try_recv().unwrap();
        assert_eq!(second.log_name, "auth");
        assert_eq!(second.level, "WARN");
        assert_eq!(second.msg, "Account locked user=bob");

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_default_filter_enables_channels() {
        let filter = default_filter("debug");
        assert!(filter.contains("admin=debug"));
        assert!(filter.contains("auth=debug"));
        assert!(filter.contains("main=debug"));
    }
}
