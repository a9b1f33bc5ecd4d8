use async_trait::async_trait;

use intake_core::{NotificationMessage, ReceivedFile, RemoteAsset, UploadError};

/// Pushes a received file to remote storage.
#[async_trait]
pub trait RemoteUploader: Send + Sync {
    /// Upload `file`. A single failure at any phase is final; there are no retries.
    async fn upload(&self, file: &ReceivedFile) -> Result<RemoteAsset, UploadError>;
}

/// Best-effort notice of a completed upload.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Send `message`. Failures are logged by the implementation and reported
    /// as `false`; they never propagate.
    async fn notify(&self, message: &NotificationMessage) -> bool;
}
