//! Outbound email for verification and password-reset codes.
//!
//! Delivery is best-effort: the identity flows commit their state change
//! first and report the send outcome as a [`Notification`] instead of
//! failing the operation. SMTP delivery uses lettre.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use serde::Serialize;
use thiserror::Error;

use gildedcart_core::Email;

use crate::config::EmailConfig;

/// Outcome of a best-effort notification send, reported alongside the
/// success of the operation that triggered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Notification {
    /// The email was handed to the transport.
    Sent,
    /// Delivery failed; the triggering state change still stands and the
    /// caller can request a resend.
    Failed,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum MailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid sender address in configuration.
    #[error("invalid from address: {0}")]
    InvalidFromAddress(String),
}

/// Outbound mail transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send a plain-text email.
    async fn send(&self, to: &Email, subject: &str, body: &str) -> Result<(), MailError>;
}

/// SMTP mailer over STARTTLS.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    /// Create a mailer from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the relay parameters are invalid.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_owned(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            transport,
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &Email, subject: &str, body: &str) -> Result<(), MailError> {
        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| MailError::InvalidFromAddress(self.from_address.clone()))?,
            )
            .to(to
                .as_str()
                .parse()
                // Email is structurally validated, so this only fails on
                // addresses lettre is stricter about
                .map_err(|_| MailError::InvalidFromAddress(to.as_str().to_owned()))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_owned())?;

        self.transport.send(message).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent");
        Ok(())
    }
}

/// Subject and body for the email-verification code.
#[must_use]
pub fn verification_email(code: &str) -> (String, String) {
    let subject = "Verify Your Email - GildedCart".to_owned();
    let body = format!(
        "Dear User,\n\n\
         Thank you for registering with GildedCart!\n\n\
         Your code for email verification is: {code}\n\n\
         This code will expire in 10 minutes.\n\n\
         If you didn't request this, please ignore this email.\n\n\
         Best regards,\n\
         The GildedCart Team"
    );
    (subject, body)
}

/// Subject and body for the password-reset code.
#[must_use]
pub fn password_reset_email(code: &str) -> (String, String) {
    let subject = "Password Reset Request - GildedCart".to_owned();
    let body = format!(
        "Dear User,\n\n\
         We received a request to reset your password.\n\n\
         Your code for password reset is: {code}\n\n\
         This code will expire in 10 minutes.\n\n\
         If you didn't request this, please ignore this email and your \
         password will remain unchanged.\n\n\
         Best regards,\n\
         The GildedCart Team"
    );
    (subject, body)
}
