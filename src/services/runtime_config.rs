//! Process-wide runtime configuration cache
//!
//! Holds the mail settings the notification service uses. Seeded once from the
//! static configuration at startup and edited afterwards only by the admin
//! notify-settings controller. Never written to the database; a restart falls
//! back to the static values.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::mail::MailConfig;
use crate::services::mail::{MailError, MailSecurity, MailSettings};

pub const MAIL_SERVER: &str = "mail_server";
pub const MAIL_PORT: &str = "mail_port";
pub const MAIL_SECURITY: &str = "mail_security";
pub const MAIL_USERNAME: &str = "mail_username";
pub const MAIL_PASSWORD: &str = "mail_password";

/// Every key the cache holds, in display order
pub const MAIL_KEYS: [&str; 5] = [
    MAIL_SERVER,
    MAIL_PORT,
    MAIL_SECURITY,
    MAIL_USERNAME,
    MAIL_PASSWORD,
];

/// Shared handle to the cache; clones see the same entries
#[derive(Clone, Default)]
pub struct RuntimeConfig {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the cache from static mail configuration
    pub fn from_static(mail: &MailConfig) -> Self {
        let cache = Self::new();
        cache.set(MAIL_SERVER, &mail.server);
        cache.set(MAIL_PORT, &mail.port);
        cache.set(MAIL_SECURITY, &mail.security);
        cache.set(MAIL_USERNAME, &mail.username);
        cache.set(MAIL_PASSWORD, &mail.password);
        cache
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    pub fn set(&self, key: &str, value: impl Into<String>) {
        self.entries.write().insert(key.to_string(), value.into());
    }

    /// Snapshot of several keys taken under one lock; missing keys are left out
    pub fn get_many(&self, keys: &[&str]) -> HashMap<String, String> {
        let entries = self.entries.read();
        keys.iter()
            .filter_map(|k| entries.get(*k).map(|v| (k.to_string(), v.clone())))
            .collect()
    }

    /// Typed view of the cached mail settings
    pub fn mail_settings(&self) -> Result<MailSettings, MailError> {
        let snapshot = self.get_many(&MAIL_KEYS);
        let field = |key: &str| snapshot.get(key).cloned().unwrap_or_default();

        let server = field(MAIL_SERVER);
        if server.trim().is_empty() {
            return Err(MailError::InvalidSettings("mail server is not set".to_string()));
        }

        let port = field(MAIL_PORT)
            .trim()
            .parse::<u16>()
            .map_err(|_| MailError::InvalidSettings(format!("invalid mail port '{}'", field(MAIL_PORT))))?;

        let security = MailSecurity::parse(&field(MAIL_SECURITY)).ok_or_else(|| {
            MailError::InvalidSettings(format!("invalid mail security '{}'", field(MAIL_SECURITY)))
        })?;

        Ok(MailSettings {
            server,
            port,
            security,
            username: field(MAIL_USERNAME),
            password: field(MAIL_PASSWORD),
        })
    }
}
