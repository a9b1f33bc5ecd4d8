use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use tokio_util::io::ReaderStream;

use intake_core::constants::{TRANSFER_FILE_FIELD, TRANSFER_SUCCESS_STATUSES};
use intake_core::{Config, ReceivedFile, RemoteAsset, StorageConfig, UploadError, UploadTarget};
use intake_processing::RemoteUploader;

use super::types::{FileDescriptor, ReservationRequest, ReservationResponse};
use crate::truncate_body;

/// Two-phase UploadThing client: reserve a presigned destination, then post the
/// file to it as a multipart form.
pub struct UploadThingClient {
    http_client: Client,
    api_key: String,
    api_url: String,
    api_version: String,
    content_disposition: String,
}

impl Debug for UploadThingClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("UploadThingClient")
            .field("api_url", &self.api_url)
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl UploadThingClient {
    pub fn new(api_key: impl Into<String>, storage: &StorageConfig, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client for UploadThing")?;

        Ok(Self {
            http_client,
            api_key: api_key.into(),
            api_url: storage.api_url.clone(),
            api_version: storage.api_version.clone(),
            content_disposition: storage.content_disposition.clone(),
        })
    }

    /// Build a client from configuration. Returns `None` if no API key is set.
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        let Some(api_key) = config.uploadthing_api_key() else {
            tracing::warn!("UPLOADTHING_API_KEY not set; received files will be discarded");
            return Ok(None);
        };

        let client = Self::new(api_key, config.storage(), config.http_timeout())?;
        tracing::info!(api_url = %client.api_url, "UploadThing client initialized");
        Ok(Some(client))
    }

    /// Ask the storage service for a one-time upload destination.
    pub async fn reserve(&self, file: &ReceivedFile) -> Result<UploadTarget, UploadError> {
        let request = ReservationRequest {
            files: vec![FileDescriptor {
                name: &file.file_name,
                size: file.size,
                media_type: &file.media_type,
                content_disposition: &self.content_disposition,
            }],
        };

        let response = self
            .http_client
            .post(&self.api_url)
            .header("x-uploadthing-api-key", &self.api_key)
            .header("x-uploadthing-version", &self.api_version)
            .json(&request)
            .send()
            .await
            .map_err(|e| UploadError::Reservation(format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| UploadError::Reservation(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(UploadError::Reservation(format!(
                "{} - {}",
                status,
                truncate_body(&body)
            )));
        }

        let parsed: ReservationResponse = serde_json::from_str(&body).map_err(|e| {
            UploadError::Reservation(format!(
                "malformed response ({}): {}",
                e,
                truncate_body(&body)
            ))
        })?;

        let upload = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| UploadError::Reservation("response contained no upload".to_string()))?;

        Ok(upload.into())
    }

    /// Post the file bytes, streamed from disk, to a reserved destination.
    pub async fn transfer(
        &self,
        file: &ReceivedFile,
        target: &UploadTarget,
    ) -> Result<(), UploadError> {
        let handle = tokio::fs::File::open(&file.path)
            .await
            .map_err(|e| UploadError::Transfer(format!("failed to open local file: {}", e)))?;

        let body = Body::wrap_stream(ReaderStream::new(handle));
        let part = Part::stream_with_length(body, file.size)
            .file_name(file.file_name.clone())
            .mime_str(&file.media_type)
            .map_err(|e| UploadError::Transfer(format!("invalid media type: {}", e)))?;

        let form = target
            .fields
            .iter()
            .fold(Form::new(), |form, (key, value)| {
                form.text(key.clone(), value.clone())
            })
            .part(TRANSFER_FILE_FIELD, part);

        let response = self
            .http_client
            .post(&target.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Transfer(format!("request failed: {}", e)))?;

        let status = response.status();
        if !TRANSFER_SUCCESS_STATUSES.contains(&status.as_u16()) {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(UploadError::Transfer(format!(
                "{} - {}",
                status,
                truncate_body(&error_text)
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl RemoteUploader for UploadThingClient {
    #[tracing::instrument(skip(self, file), fields(file_name = %file.file_name, size = file.size))]
    async fn upload(&self, file: &ReceivedFile) -> Result<RemoteAsset, UploadError> {
        let target = self.reserve(file).await?;
        tracing::debug!(url = %target.url, fields = target.fields.len(), "Upload destination reserved");

        self.transfer(file, &target).await?;

        Ok(RemoteAsset {
            public_url: target.file_url,
            media_type: file.media_type.clone(),
        })
    }
}
