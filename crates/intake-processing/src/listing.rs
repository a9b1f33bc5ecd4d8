//! Directory listing override.
//!
//! Clients never see what other clients uploaded. Every listing shows exactly one
//! entry, a welcome placeholder, which is created in the listed directory the first
//! time it is needed and left alone afterwards.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncWrite, AsyncWriteExt};

use intake_core::constants::{PLACEHOLDER_FILE_NAME, PLACEHOLDER_TEXT};
use intake_core::{DirectoryEntry, EntryKind, IntakeError};

#[derive(Debug, Clone)]
pub struct ListingOverride {
    file_name: String,
    contents: String,
}

impl Default for ListingOverride {
    fn default() -> Self {
        Self::new(PLACEHOLDER_FILE_NAME, PLACEHOLDER_TEXT)
    }
}

impl ListingOverride {
    pub fn new(file_name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            contents: contents.into(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Make sure the placeholder exists in `directory` and return its path.
    ///
    /// An existing placeholder is never rewritten, so concurrent listings of the
    /// same directory race only on creation, which `create_new` settles.
    pub async fn ensure_placeholder(&self, directory: &Path) -> Result<PathBuf, IntakeError> {
        let path = directory.join(&self.file_name);

        let created = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await;

        match created {
            Ok(file) => {
                fill_new_file(&path, file, self.contents.as_bytes()).await?;
                tracing::debug!(path = %path.display(), "Created listing placeholder");
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e.into()),
        }

        Ok(path)
    }

    /// The entries shown for `directory`: the placeholder and nothing else.
    pub async fn list(&self, directory: &Path) -> Result<Vec<DirectoryEntry>, IntakeError> {
        let path = self.ensure_placeholder(directory).await?;
        let metadata = tokio::fs::metadata(&path).await?;

        Ok(vec![DirectoryEntry {
            name: self.file_name.clone(),
            size: metadata.len(),
            modified: metadata.modified()?,
            kind: EntryKind::File,
        }])
    }
}

/// Write `contents` into a file just created at `path`.
///
/// A failed write removes the file again; otherwise `create_new` would keep
/// every later listing from filling it.
async fn fill_new_file<W: AsyncWrite + Unpin>(
    path: &Path,
    mut file: W,
    contents: &[u8],
) -> Result<(), IntakeError> {
    let written = async {
        file.write_all(contents).await?;
        file.flush().await
    }
    .await;

    if let Err(e) = written {
        drop(file);
        tracing::warn!(path = %path.display(), error = %e, "Failed to write listing placeholder");
        if let Err(cleanup) = tokio::fs::remove_file(path).await {
            tracing::error!(path = %path.display(), error = %cleanup, "Failed to remove broken placeholder");
        }
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_listing_creates_placeholder_in_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let listing = ListingOverride::default();

        let entries = listing.list(dir.path()).await.unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "readme.txt");
        assert!(!entries[0].is_dir());
        assert_eq!(entries[0].size, PLACEHOLDER_TEXT.len() as u64);

        let contents = tokio::fs::read_to_string(dir.path().join("readme.txt"))
            .await
            .unwrap();
        assert!(contents.starts_with("Welcome to the FTP Upload Service"));
    }

    #[tokio::test]
    async fn test_listing_hides_other_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["secret.pdf", "other.png"] {
            tokio::fs::write(dir.path().join(name), b"private").await.unwrap();
        }
        tokio::fs::create_dir(dir.path().join("sub")).await.unwrap();

        let entries = ListingOverride::default().list(dir.path()).await.unwrap();

        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["readme.txt"]);
    }

    #[tokio::test]
    async fn test_existing_placeholder_is_not_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("readme.txt");
        tokio::fs::write(&path, b"custom").await.unwrap();

        let entries = ListingOverride::default().list(dir.path()).await.unwrap();

        assert_eq!(entries[0].size, 6);
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"custom");
    }

    #[tokio::test]
    async fn test_concurrent_listings_create_one_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let listing = ListingOverride::default();

        let results = list_concurrently(&listing, dir.path()).await;
        for entries in results {
            assert_eq!(entries.len(), 1);
        }

        let contents = tokio::fs::read_to_string(dir.path().join("readme.txt"))
            .await
            .unwrap();
        assert_eq!(contents, PLACEHOLDER_TEXT);
    }

    async fn list_concurrently(listing: &ListingOverride, dir: &Path) -> Vec<Vec<DirectoryEntry>> {
        let (a, b, c) = tokio::join!(listing.list(dir), listing.list(dir), listing.list(dir));
        vec![a.unwrap(), b.unwrap(), c.unwrap()]
    }

    #[tokio::test]
    async fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ListingOverride::default()
            .list(&dir.path().join("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, IntakeError::Io(_)));
    }

    /// Rejects every write, as a full disk would.
    struct FullDisk;

    impl AsyncWrite for FullDisk {
        fn poll_write(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            _buf: &[u8],
        ) -> std::task::Poll<std::io::Result<usize>> {
            std::task::Poll::Ready(Err(std::io::Error::new(
                ErrorKind::Other,
                "no space left on device",
            )))
        }

        fn poll_flush(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_failed_placeholder_write_is_retried_on_next_listing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("readme.txt");
        tokio::fs::File::create(&path).await.unwrap();

        let err = fill_new_file(&path, FullDisk, PLACEHOLDER_TEXT.as_bytes())
            .await
            .unwrap_err();
        assert!(matches!(err, IntakeError::Io(_)));
        assert!(!path.exists());

        let entries = ListingOverride::default().list(dir.path()).await.unwrap();
        assert_eq!(entries[0].size, PLACEHOLDER_TEXT.len() as u64);
    }
}
