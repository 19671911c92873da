use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    address::Address,
    message::{Mailbox, MultiPart},
    transport::smtp::{self, authentication::Credentials, PoolConfig},
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use super::{deliver_batch, MailError, MailSecurity, MailSession, MailSettings, MailTransport, OutgoingMail, Recipient};
use crate::application::logging::ADMIN;
use crate::models::event;

/// Bound on every SMTP connect and command
pub const SMTP_TIMEOUT: Duration = Duration::from_secs(5);

/// SMTP transport built on lettre
#[derive(Debug, Clone)]
pub struct SmtpMailer {
    timeout: Duration,
}

impl Default for SmtpMailer {
    fn default() -> Self {
        Self::new()
    }
}

impl SmtpMailer {
    pub fn new() -> Self {
        Self {
            timeout: SMTP_TIMEOUT,
        }
    }

    /// Transport limited to one pooled connection. The first message of a
    /// batch opens the session and later messages reuse it.
    fn transport(&self, settings: &MailSettings) -> Result<AsyncSmtpTransport<Tokio1Executor>, MailError> {
        let builder = match settings.security {
            MailSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.server),
            MailSecurity::Ssl => AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.server),
        }
        .map_err(|e| MailError::Connection(format!("Failed to create SMTP transport: {}", e)))?;

        Ok(builder
            .port(settings.port)
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .timeout(Some(self.timeout))
            .pool_config(PoolConfig::new().max_size(1))
            .build())
    }

    /// Prepare a session without touching the network
    fn open(&self, settings: &MailSettings) -> Result<SmtpSession, MailError> {
        let sender: Address = settings
            .username
            .parse()
            .map_err(|e| MailError::InvalidAddress(format!("{}: {}", settings.username, e)))?;

        Ok(SmtpSession {
            transport: self.transport(settings)?,
            from: Mailbox::new(None, sender),
        })
    }
}

/// Map a lettre error onto the taxonomy callers act on. 53x replies come
/// from the AUTH exchange.
fn classify(err: smtp::Error) -> MailError {
    let status = err.status().map(|code| code.to_string());
    match status {
        Some(code) if code.starts_with("53") => MailError::Authentication(err.to_string()),
        Some(_) if err.is_permanent() => MailError::Rejected(err.to_string()),
        _ => MailError::Connection(err.to_string()),
    }
}

struct SmtpSession {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

#[async_trait]
impl MailSession for SmtpSession {
    async fn deliver(&self, mail: OutgoingMail) -> Result<(), MailError> {
        let address: Address = mail
            .to
            .email
            .parse()
            .map_err(|e| MailError::InvalidAddress(format!("{}: {}", mail.to.email, e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(Mailbox::new(Some(mail.to.username.clone()), address))
            .subject(mail.subject)
            .multipart(MultiPart::alternative_plain_html(mail.text, mail.html))
            .map_err(|e| MailError::Message(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(classify)
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(
        &self,
        settings: &MailSettings,
        subject: &str,
        recipients: &[Recipient],
        event: &event::Model,
    ) -> Result<Vec<Recipient>, MailError> {
        let session = self.open(settings)?;
        let delivered = deliver_batch(&session, subject, recipients, event).await?;

        // Dropping the transport closes the pooled connection
        drop(session);
        tracing::info!(
            target: ADMIN,
            "Email service: disconnected from \"{}:{}\"",
            settings.server,
            settings.port
        );

        Ok(delivered)
    }

    async fn test_connection(&self, settings: &MailSettings) -> Result<(), MailError> {
        let transport = self.transport(settings)?;
        let result = match transport.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(MailError::Connection(format!(
                "{}:{} did not answer",
                settings.server, settings.port
            ))),
            Err(e) => Err(classify(e)),
        };

        match &result {
            Ok(()) => tracing::info!(target: ADMIN, "Email service test: connection established"),
            Err(e) if e.is_authentication() => {
                tracing::info!(target: ADMIN, "Email service test: connection issue, wrong credentials")
            }
            Err(e) => tracing::info!(
                target: ADMIN,
                "Email service test: connection issue, wrong configuration ({})",
                e
            ),
        }

        result
    }
}
