//! Mail transport for event notifications
//!
//! A [`MailTransport`] sends one logical notification to a list of recipients
//! over a single authenticated session, rendering a separate message per
//! recipient. A recipient the server rejects is reported as undelivered and the
//! batch carries on.

mod smtp;
mod template;

pub use smtp::SmtpMailer;
pub use template::{render_html, render_text};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::logging::ADMIN;
use crate::models::{event, user};

/// Subject line of every event notification
pub const NOTIFICATION_SUBJECT: &str = "Attention! Upcoming event!";

/// Connection security for the SMTP session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MailSecurity {
    /// Plain connect, then STARTTLS
    Tls,
    /// Implicit TLS from the first byte
    Ssl,
}

impl MailSecurity {
    pub fn as_str(&self) -> &'static str {
        match self {
            MailSecurity::Tls => "tls",
            MailSecurity::Ssl => "ssl",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "tls" => Some(MailSecurity::Tls),
            "ssl" => Some(MailSecurity::Ssl),
            _ => None,
        }
    }
}

impl std::fmt::Display for MailSecurity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything needed to open an authenticated SMTP session
#[derive(Clone, PartialEq, Eq)]
pub struct MailSettings {
    pub server: String,
    pub port: u16,
    pub security: MailSecurity,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for MailSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailSettings")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("security", &self.security)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// A user addressed by a notification
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Recipient {
    pub user_id: i64,
    pub username: String,
    pub email: String,
}

impl From<&user::Model> for Recipient {
    fn from(user: &user::Model) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

impl std::fmt::Display for Recipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.username, self.email)
    }
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Recipient rejected: {0}")]
    Rejected(String),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Message build failed: {0}")]
    Message(String),

    #[error("Invalid mail settings: {0}")]
    InvalidSettings(String),
}

impl MailError {
    pub fn is_authentication(&self) -> bool {
        matches!(self, MailError::Authentication(_))
    }

    /// The session itself failed, as opposed to one message or recipient
    pub fn is_session_failure(&self) -> bool {
        matches!(self, MailError::Authentication(_) | MailError::Connection(_))
    }

    /// Message shown to the administrator when a connectivity test fails
    pub fn user_message(&self) -> &'static str {
        if self.is_authentication() {
            "Connection issue. Check your credentials!"
        } else {
            "Connection issue. Check mail configuration!"
        }
    }
}

/// One rendered message, addressed to a single recipient
#[derive(Debug, Clone)]
pub struct OutgoingMail {
    pub to: Recipient,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// An open, authenticated session able to deliver messages one at a time
#[async_trait]
pub trait MailSession: Send + Sync {
    async fn deliver(&self, mail: OutgoingMail) -> Result<(), MailError>;
}

/// Render and deliver one message per recipient over `session`.
///
/// Returns the recipients the server accepted. Per-recipient failures are
/// logged and skipped. A session failure before the server has answered any
/// message is returned as an error; once the session has been up, it ends the
/// batch with what was delivered so far.
pub async fn deliver_batch<S: MailSession + ?Sized>(
    session: &S,
    subject: &str,
    recipients: &[Recipient],
    event: &event::Model,
) -> Result<Vec<Recipient>, MailError> {
    let mut delivered = Vec::with_capacity(recipients.len());
    let mut established = false;

    for recipient in recipients {
        let mail = OutgoingMail {
            to: recipient.clone(),
            subject: subject.to_string(),
            text: render_text(recipient, event),
            html: render_html(recipient, event),
        };

        match session.deliver(mail).await {
            Ok(()) => {
                established = true;
                tracing::info!(target: ADMIN, "Email service: msg has been sent to \"{}\"", recipient);
                delivered.push(recipient.clone());
            }
            Err(e) if e.is_session_failure() && !established => return Err(e),
            Err(e) if e.is_session_failure() => {
                tracing::warn!(
                    target: ADMIN,
                    "Email service: session lost before \"{}\", batch ended: {}",
                    recipient,
                    e
                );
                break;
            }
            Err(e) => {
                if matches!(e, MailError::Rejected(_)) {
                    established = true;
                }
                tracing::warn!(
                    target: ADMIN,
                    "Email service: msg to \"{}\" was not delivered: {}",
                    recipient,
                    e
                );
            }
        }
    }

    Ok(delivered)
}

/// Sends notifications and validates mail settings
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Deliver `event` to every recipient over one session, returning those accepted.
    ///
    /// Errors only when the session itself cannot be established.
    async fn send(
        &self,
        settings: &MailSettings,
        subject: &str,
        recipients: &[Recipient],
        event: &event::Model,
    ) -> Result<Vec<Recipient>, MailError>;

    /// Open a session, authenticate and close it again
    async fn test_connection(&self, settings: &MailSettings) -> Result<(), MailError>;

    async fn test(&self, settings: &MailSettings) -> bool {
        self.test_connection(settings).await.is_ok()
    }
}
