pub mod auth;
pub mod database;
pub mod mail;
pub mod scheduler;
pub mod search;
pub mod server;

use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server: server::ServerConfig,
    pub database: database::DatabaseConfig,
    pub auth: auth::AuthConfig,
    pub mail: mail::MailConfig,
    pub scheduler: scheduler::SchedulerConfig,
    pub search: search::SearchConfig,

    // Build info
    pub version: String,
    pub commit_hash: String,

    // Logging
    pub log_level: String,
    /// Emit stdout logs as JSON lines (`REMINDER_LOG_FORMAT=json`)
    pub log_json: bool,
    /// Optional plain-text log file, in addition to stdout and the `logs` table
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server: server::ServerConfig::from_env(),
            database: database::DatabaseConfig::from_env(),
            auth: auth::AuthConfig::from_env(),
            mail: mail::MailConfig::from_env(),
            scheduler: scheduler::SchedulerConfig::from_env(),
            search: search::SearchConfig::from_env(),

            // Build info
            version: env!("CARGO_PKG_VERSION").to_string(),
            commit_hash: env::var("COMMIT_HASH").unwrap_or_else(|_| "unknown".to_string()),

            // Logging
            log_level: env::var("REMINDER_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_json: env::var("REMINDER_LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
            log_file: env::var("REMINDER_LOG_FILE")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        }
    }
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);
