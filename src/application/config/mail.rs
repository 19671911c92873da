use std::env;

/// Static mail settings, used only to seed the runtime config cache at startup
#[derive(Clone)]
pub struct MailConfig {
    pub server: String,
    pub port: String,
    pub security: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("security", &self.security)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl MailConfig {
    pub fn from_env() -> Self {
        Self {
            server: mail_var("SERVER").unwrap_or_default(),
            port: mail_var("PORT").unwrap_or_else(|| "587".to_string()),
            security: mail_var("SECURITY").unwrap_or_else(|| "tls".to_string()),
            username: mail_var("USERNAME").unwrap_or_default(),
            password: mail_var("PASSWORD").unwrap_or_default(),
        }
    }
}

/// `REMINDER_MAIL_<KEY>` with a bare `MAIL_<KEY>` fallback
fn mail_var(key: &str) -> Option<String> {
    env::var(format!("REMINDER_MAIL_{}", key))
        .or_else(|_| env::var(format!("MAIL_{}", key)))
        .ok()
}
