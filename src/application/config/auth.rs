use rand::Rng;
use std::env;

/// Credentials for the administrator account created on first start
#[derive(Clone)]
pub struct AdminBootstrap {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminBootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminBootstrap")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC key for session tokens. Random per process when `REMINDER_SECRET_KEY` is unset,
    /// which invalidates all sessions on restart.
    pub secret_key: Vec<u8>,
    pub session_ttl_secs: i64,
    /// Password assigned by admins when resetting an account
    pub user_default_password: Option<String>,
    pub admin: Option<AdminBootstrap>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("admin", &self.admin)
            .finish_non_exhaustive()
    }
}

impl AuthConfig {
    pub fn from_env() -> Self {
        let secret_key = env::var("REMINDER_SECRET_KEY")
            .or_else(|_| env::var("SECRET_KEY"))
            .ok()
            .filter(|s| !s.is_empty())
            .map(String::into_bytes)
            .unwrap_or_else(random_secret);

        let admin = match (
            env::var("REMINDER_ADMIN_USERNAME"),
            env::var("REMINDER_ADMIN_EMAIL"),
            env::var("REMINDER_ADMIN_PASSWORD"),
        ) {
            (Ok(username), Ok(email), Ok(password)) => Some(AdminBootstrap {
                username,
                email,
                password,
            }),
            _ => None,
        };

        Self {
            secret_key,
            session_ttl_secs: env::var("REMINDER_SESSION_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1800),
            user_default_password: env::var("REMINDER_USER_DEFAULT_PASS")
                .or_else(|_| env::var("USER_DEFAULT_PASS"))
                .ok()
                .filter(|s| !s.is_empty()),
            admin,
        }
    }
}

fn random_secret() -> Vec<u8> {
    let mut key = vec![0u8; 32];
    rand::rng().fill(&mut key[..]);
    key
}
