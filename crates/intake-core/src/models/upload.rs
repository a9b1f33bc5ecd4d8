use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_MEDIA_TYPE;

/// Infer a media type from a file name, falling back to `application/octet-stream`.
pub fn media_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string())
}

/// A file the FTP engine has finished writing to local disk.
#[derive(Debug, Clone)]
pub struct ReceivedFile {
    /// Absolute location on local disk
    pub path: PathBuf,
    /// Base name sent to the storage service
    pub file_name: String,
    /// Size in bytes
    pub size: u64,
    /// Media type inferred from the file name
    pub media_type: String,
    pub received_at: DateTime<Utc>,
}

impl ReceivedFile {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::staged(path, file_name, size)
    }

    /// A file stored under a private staging path, named after what the client sent.
    pub fn staged(path: impl Into<PathBuf>, file_name: impl Into<String>, size: u64) -> Self {
        let path = path.into();
        let file_name = file_name.into();
        let media_type = media_type_for(Path::new(&file_name));

        Self {
            path,
            file_name,
            size,
            media_type,
            received_at: Utc::now(),
        }
    }
}

/// One-time destination handed out by the storage service for a direct upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    /// Endpoint the multipart form is posted to
    pub url: String,
    /// Form fields that must be echoed back verbatim
    pub fields: BTreeMap<String, String>,
    /// Public URL the asset will have once uploaded
    pub file_url: String,
}

/// A file that now lives in remote storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAsset {
    pub public_url: String,
    pub media_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_detection() {
        assert_eq!(media_type_for(Path::new("photo.png")), "image/png");
        assert_eq!(media_type_for(Path::new("notes.txt")), "text/plain");
        assert_eq!(media_type_for(Path::new("doc.PDF")), "application/pdf");
    }

    #[test]
    fn test_media_type_falls_back_to_binary() {
        assert_eq!(
            media_type_for(Path::new("model.zzunknown")),
            "application/octet-stream"
        );
        assert_eq!(
            media_type_for(Path::new("no_extension")),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_received_file_fields() {
        let file = ReceivedFile::new("/srv/uploads/sub/part.png", 42);
        assert_eq!(file.file_name, "part.png");
        assert_eq!(file.size, 42);
        assert_eq!(file.media_type, "image/png");
    }

    #[test]
    fn test_staged_file_keeps_client_name() {
        let file = ReceivedFile::staged("/srv/uploads/scan.stl.3f2a.part", "scan.stl", 7);
        assert_eq!(file.path, PathBuf::from("/srv/uploads/scan.stl.3f2a.part"));
        assert_eq!(file.file_name, "scan.stl");
        assert_eq!(file.media_type, media_type_for(Path::new("scan.stl")));
    }
}
