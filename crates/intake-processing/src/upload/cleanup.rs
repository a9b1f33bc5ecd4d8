//! Removal of local upload files.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use intake_core::IntakeError;

/// Delete a received file. A file that is already gone counts as deleted.
pub async fn remove_local_file(path: &Path) -> Result<(), IntakeError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Deleted local file");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "Local file already removed");
            Ok(())
        }
        Err(source) => Err(IntakeError::LocalCleanup {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Delete every regular file under `root` except placeholders named `keep`.
///
/// Used at startup to clear uploads left behind by an interrupted run. Returns the
/// number of files deleted; individual failures are logged and skipped.
pub async fn sweep_stale_uploads(root: &Path, keep: &str) -> Result<usize, IntakeError> {
    let mut pending: Vec<PathBuf> = vec![root.to_path_buf()];
    let mut removed = 0;

    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            let path = entry.path();

            if file_type.is_dir() {
                pending.push(path);
                continue;
            }
            if !file_type.is_file() || entry.file_name() == keep {
                continue;
            }

            match remove_local_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!(error = %e, "Failed to remove stale upload"),
            }
        }
    }

    if removed > 0 {
        tracing::info!(root = %root.display(), removed, "Removed stale uploads");
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_remove_local_file_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("upload.bin");
        tokio::fs::write(&path, b"data").await.expect("write");

        remove_local_file(&path).await.expect("first delete");
        assert!(!path.exists());
        remove_local_file(&path).await.expect("second delete is a no-op");
    }

    #[tokio::test]
    async fn test_remove_local_file_reports_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        // A directory cannot be removed with remove_file.
        let err = remove_local_file(dir.path())
            .await
            .expect_err("directory is not a file");
        assert!(matches!(err, IntakeError::LocalCleanup { .. }));
    }

    #[tokio::test]
    async fn test_sweep_keeps_placeholders_and_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        tokio::fs::create_dir_all(root.join("nested/deeper"))
            .await
            .expect("mkdir");
        for path in ["a.stl", "readme.txt", "nested/b.png", "nested/deeper/c", "nested/readme.txt"] {
            tokio::fs::write(root.join(path), b"x").await.expect("write");
        }

        let removed = sweep_stale_uploads(root, "readme.txt")
            .await
            .expect("sweep");

        assert_eq!(removed, 3);
        assert!(root.join("readme.txt").exists());
        assert!(root.join("nested/readme.txt").exists());
        assert!(root.join("nested/deeper").is_dir());
        assert!(!root.join("a.stl").exists());
        assert!(!root.join("nested/b.png").exists());
        assert!(!root.join("nested/deeper/c").exists());
    }
}
