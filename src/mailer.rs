use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::response::Code;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpSettings;

/// SMTP replies that mean the server refused our login.
const AUTH_REJECTION_CODES: [&str; 3] = ["530", "534", "535"];

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("SMTP configuration is incomplete")]
    ConfigurationMissing,

    #[error("Invalid email address format: {0}")]
    InvalidAddress(#[from] lettre::address::AddressError),

    #[error("Failed to build email message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP server rejected the credentials: {0}")]
    Authentication(String),

    #[error("SMTP delivery failed: {0}")]
    Delivery(String),
}

/// True when the SMTP reply code says the login itself was refused.
fn is_auth_rejection(code: Option<Code>) -> bool {
    code.is_some_and(|code| AUTH_REJECTION_CODES.contains(&code.to_string().as_str()))
}

impl From<lettre::transport::smtp::Error> for MailError {
    fn from(e: lettre::transport::smtp::Error) -> Self {
        if is_auth_rejection(e.status()) {
            Self::Authentication(e.to_string())
        } else {
            Self::Delivery(e.to_string())
        }
    }
}

/// A finished plain-text email. The sender is always the configured account.
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: Mailbox,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError>;
}

/// Delivers one message per call over an implicit-TLS SMTP session.
pub struct SmtpMailer {
    settings: Option<SmtpSettings>,
}

impl SmtpMailer {
    pub const fn new(settings: Option<SmtpSettings>) -> Self {
        Self { settings }
    }

    fn build_message(sender: &str, email: OutgoingEmail) -> Result<Message, MailError> {
        let from: Mailbox = sender.parse()?;
        let message = Message::builder()
            .from(from)
            .to(email.to)
            .subject(email.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(email.body)?;
        Ok(message)
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        let settings = self
            .settings
            .as_ref()
            .ok_or(MailError::ConfigurationMissing)?;

        let recipient = email.to.to_string();
        let subject = email.subject.clone();
        let message = Self::build_message(&settings.sender, email)?;

        let creds = Credentials::new(settings.sender.clone(), settings.password.clone());

        // Dropped at the end of this call, which closes the session on every path
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.server)?
            .port(settings.port)
            .credentials(creds)
            .build();

        tracing::info!(
            "Sending email to '{}' with subject '{}' via {}:{}",
            recipient,
            subject,
            settings.server,
            settings.port
        );

        mailer.send(message).await?;

        tracing::info!("Message to {} sent successfully", recipient);
        Ok(())
    }
}

#[cfg(test)]
pub mod testing {
    use async_trait::async_trait;

    use std::sync::Mutex;

    use super::{MailError, Mailer, OutgoingEmail};

    #[derive(Debug, Clone, Copy)]
    pub enum Outcome {
        Delivered,
        Unconfigured,
        BadCredentials,
    }

    /// Records what would have been sent instead of opening a connection.
    pub struct FakeMailer {
        outcome: Outcome,
        sent: Mutex<Vec<OutgoingEmail>>,
    }

    impl FakeMailer {
        pub fn new(outcome: Outcome) -> Self {
            Self {
                outcome,
                sent: Mutex::new(Vec::new()),
            }
        }

        pub fn attempts(&self) -> Vec<OutgoingEmail> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Mailer for FakeMailer {
        async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
            self.sent.lock().unwrap().push(email);
            match self.outcome {
                Outcome::Delivered => Ok(()),
                Outcome::Unconfigured => Err(MailError::ConfigurationMissing),
                Outcome::BadCredentials => Err(MailError::Authentication(
                    "535 5.7.8 authentication failed".to_string(),
                )),
            }
        }
    }
}
