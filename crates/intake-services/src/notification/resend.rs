use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use intake_core::{IntakeError, NotificationMessage};
use intake_processing::NotificationSender;

use super::template;
use crate::truncate_body;

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: String,
    html: String,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: String,
}

/// Sends upload notifications through the Resend HTTP email API.
pub struct ResendNotifier {
    http_client: Client,
    api_url: String,
    api_key: String,
    from: String,
    recipient: String,
}

impl Debug for ResendNotifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ResendNotifier")
            .field("api_url", &self.api_url)
            .field("recipient", &self.recipient)
            .finish()
    }
}

impl ResendNotifier {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        from: impl Into<String>,
        recipient: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client for Resend")?;

        Ok(Self {
            http_client,
            api_url: api_url.into(),
            api_key: api_key.into(),
            from: from.into(),
            recipient: recipient.into(),
        })
    }

    /// Send the email and return the id Resend assigned to it.
    pub async fn send(&self, message: &NotificationMessage) -> Result<String, IntakeError> {
        let request = SendEmailRequest {
            from: &self.from,
            to: [&self.recipient],
            subject: template::subject(message),
            html: template::html_body(message),
        };

        let response = self
            .http_client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| IntakeError::Notification(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(IntakeError::Notification(format!(
                "{} - {}",
                status,
                truncate_body(&error_text)
            )));
        }

        let sent: SendEmailResponse = response
            .json()
            .await
            .map_err(|e| IntakeError::Notification(format!("malformed response: {}", e)))?;

        Ok(sent.id)
    }
}

#[async_trait]
impl NotificationSender for ResendNotifier {
    async fn notify(&self, message: &NotificationMessage) -> bool {
        match self.send(message).await {
            Ok(id) => {
                tracing::info!(email_id = %id, file_name = %message.file_name, "Notification email sent");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, file_name = %message.file_name, "Failed to send notification email");
                false
            }
        }
    }
}
