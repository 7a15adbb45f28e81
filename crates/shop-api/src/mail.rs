//! # Email
//!
//! Plain-text email over SMTP (lettre). The mailer is optional: without
//! `SMTP_HOST` the `/email` endpoint answers 503 and checkout receipts are
//! skipped.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use thiserror::Error;

use shop_core::{Account, CheckoutQuote};

/// Implicit-TLS SMTP port
pub const DEFAULT_SMTP_PORT: u16 = 465;

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum MailError {
    /// Invalid sender or recipient address.
    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    /// Failed to build the message or transport.
    #[error("failed to build message: {0}")]
    Build(String),

    /// SMTP delivery failed.
    #[error("SMTP error: {0}")]
    Transport(String),
}

/// A plain-text message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl EmailMessage {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Order receipt sent after a successful checkout
    pub fn receipt(account: &Account, quote: &CheckoutQuote) -> Self {
        let mut body = format!(
            "Hello {},\n\nThank you for your order of {} item(s).\n\nSubtotal: {}\n",
            account.name,
            quote.item_count,
            quote.subtotal.display()
        );
        if let Some(percent) = quote.discount_percent {
            body.push_str(&format!("Coupon discount: {}%\n", percent));
        }
        body.push_str(&format!(
            "Total: {}\nLoyalty points earned: {}\n",
            quote.total.display(),
            quote.points
        ));

        Self::new(account.email.clone(), "Your order", body)
    }
}

/// Outgoing mail delivery
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError>;
}

pub type BoxedMailer = Arc<dyn Mailer>;

/// SMTP settings
#[derive(Debug)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    /// Sender, e.g. `Shop <shop@example.com>`
    pub from: String,
}

impl MailConfig {
    /// Read `SMTP_*` variables. Returns `None` when `SMTP_HOST` is unset.
    pub fn from_env() -> Result<Option<Self>, MailError> {
        let Some(host) = std::env::var("SMTP_HOST").ok().filter(|h| !h.trim().is_empty()) else {
            return Ok(None);
        };

        let port = match std::env::var("SMTP_PORT") {
            Ok(p) => p
                .parse()
                .map_err(|_| MailError::Build(format!("invalid SMTP_PORT: {}", p)))?,
            Err(_) => DEFAULT_SMTP_PORT,
        };

        let username = std::env::var("SMTP_USERNAME").ok();
        let from = std::env::var("SMTP_FROM")
            .ok()
            .or_else(|| username.clone())
            .ok_or_else(|| MailError::Build("SMTP_FROM or SMTP_USERNAME must be set".into()))?;

        Ok(Some(Self {
            host,
            port,
            username,
            password: std::env::var("SMTP_PASSWORD").ok().map(SecretString::from),
            from,
        }))
    }
}

/// lettre-backed SMTP mailer
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|_| MailError::InvalidAddress(config.from.clone()))?;

        // 465 is implicit TLS, anything else upgrades with STARTTLS
        let builder = if config.port == DEFAULT_SMTP_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        }
        .map_err(|e| MailError::Build(e.to_string()))?
        .port(config.port);

        let builder = match (&config.username, &config.password) {
            (Some(user), Some(password)) => builder.credentials(Credentials::new(
                user.clone(),
                password.expose_secret().to_string(),
            )),
            _ => builder,
        };

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|_| MailError::InvalidAddress(message.to.clone()))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(message.body)
            .map_err(|e| MailError::Build(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        Ok(())
    }
}
