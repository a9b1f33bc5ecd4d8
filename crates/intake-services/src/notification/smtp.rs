//! SMTP transport for upload notifications.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use intake_core::{IntakeError, NotificationConfig, NotificationMessage};
use intake_processing::NotificationSender;

use super::template;

/// Sends upload notifications over SMTP.
#[derive(Clone)]
pub struct SmtpNotifier {
    mailer: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpNotifier {
    /// Create the notifier from config. Returns `None` if SMTP, the sender or the
    /// recipient is not configured, or an address does not parse.
    pub fn from_config(config: &NotificationConfig) -> Option<Self> {
        let host = config.smtp_host.as_deref()?;
        let from: Mailbox = match config.from.as_deref()?.parse() {
            Ok(mailbox) => mailbox,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid NOTIFICATION_FROM");
                return None;
            }
        };
        let to: Mailbox = match config.recipient.as_deref()?.parse() {
            Ok(mailbox) => mailbox,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid NOTIFICATION_EMAIL");
                return None;
            }
        };
        let port = config.smtp_port;
        let credentials = match (config.smtp_user.as_deref(), config.smtp_password.as_deref()) {
            (Some(u), Some(p)) => Some(Credentials::new(u.to_string(), p.to_string())),
            _ => None,
        };

        let mailer = if config.smtp_tls {
            let b = match AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host) {
                Ok(b) => b.port(port),
                Err(e) => {
                    tracing::warn!(host = %host, error = %e, "Invalid SMTP relay");
                    return None;
                }
            };
            let b = match credentials {
                Some(c) => b.credentials(c),
                None => b,
            };
            tracing::info!(host = %host, port = port, "SMTP notifier initialized (STARTTLS)");
            b.build()
        } else {
            let b = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(port);
            let b = match credentials {
                Some(c) => b.credentials(c),
                None => b,
            };
            tracing::info!(host = %host, port = port, "SMTP notifier initialized");
            b.build()
        };

        Some(Self {
            mailer: Arc::new(mailer),
            from,
            to,
        })
    }

    fn build_email(&self, message: &NotificationMessage) -> Result<Message, IntakeError> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(template::subject(message))
            .multipart(MultiPart::alternative_plain_html(
                template::text_body(message),
                template::html_body(message),
            ))
            .map_err(|e| IntakeError::Notification(e.to_string()))
    }

    pub async fn send(&self, message: &NotificationMessage) -> Result<(), IntakeError> {
        let email = self.build_email(message)?;
        self.mailer
            .send(email)
            .await
            .map_err(|e| IntakeError::Notification(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl NotificationSender for SmtpNotifier {
    async fn notify(&self, message: &NotificationMessage) -> bool {
        match self.send(message).await {
            Ok(()) => {
                tracing::info!(file_name = %message.file_name, "Notification email sent via SMTP");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, file_name = %message.file_name, "Failed to send notification email");
                false
            }
        }
    }
}
