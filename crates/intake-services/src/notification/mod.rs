//! Upload notification transports.
//!
//! [`build_notifier`] picks one transport from configuration: the Resend HTTP API
//! when its key is set, SMTP otherwise, and [`DisabledNotifier`] when neither is
//! usable.

#[cfg(feature = "resend")]
mod resend;
#[cfg(feature = "smtp")]
mod smtp;
pub mod template;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use intake_core::{Config, NotificationMessage};
use intake_processing::NotificationSender;

#[cfg(feature = "resend")]
pub use resend::ResendNotifier;
#[cfg(feature = "smtp")]
pub use smtp::SmtpNotifier;

/// Stand-in used when no transport is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledNotifier;

#[async_trait]
impl NotificationSender for DisabledNotifier {
    async fn notify(&self, message: &NotificationMessage) -> bool {
        tracing::warn!(
            file_name = %message.file_name,
            "Notifications not configured; skipping email"
        );
        false
    }
}

/// Select the notification transport for `config`.
pub fn build_notifier(config: &Config) -> Result<Arc<dyn NotificationSender>> {
    let notification = config.notification();

    let (Some(from), Some(recipient)) = (
        notification.from.as_deref(),
        notification.recipient.as_deref(),
    ) else {
        tracing::warn!("NOTIFICATION_FROM or NOTIFICATION_EMAIL not set; notifications disabled");
        return Ok(Arc::new(DisabledNotifier));
    };

    #[cfg(feature = "resend")]
    if let Some(api_key) = config.resend_api_key() {
        let notifier = ResendNotifier::new(
            &notification.resend_api_url,
            api_key,
            from,
            recipient,
            config.http_timeout(),
        )?;
        tracing::info!(recipient = %recipient, "Resend notifier initialized");
        return Ok(Arc::new(notifier));
    }

    #[cfg(feature = "smtp")]
    if let Some(notifier) = SmtpNotifier::from_config(notification) {
        return Ok(Arc::new(notifier));
    }

    tracing::warn!(from = %from, "No notification transport configured; notifications disabled");
    Ok(Arc::new(DisabledNotifier))
}
