pub mod account;
pub mod bootstrap;
pub mod event_store;
pub mod mail;
pub mod notifier;
pub mod notify_settings;
pub mod runtime_config;
pub mod scheduler;
pub mod search;
pub mod security;

pub use mail::{MailError, MailTransport, SmtpMailer};
pub use notifier::NotificationEngine;
pub use notify_settings::NotifySettingsController;
pub use runtime_config::RuntimeConfig;
pub use scheduler::JobScheduler;
pub use search::SearchService;
pub use security::*;
