use serde::Serialize;

use super::upload::{ReceivedFile, RemoteAsset};

/// Notice of a completed upload. Only built from a confirmed [`RemoteAsset`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationMessage {
    pub file_name: String,
    pub file_type: String,
    pub public_url: String,
}

impl NotificationMessage {
    pub fn for_upload(file: &ReceivedFile, asset: &RemoteAsset) -> Self {
        Self {
            file_name: file.file_name.clone(),
            file_type: asset.media_type.clone(),
            public_url: asset.public_url.clone(),
        }
    }
}
