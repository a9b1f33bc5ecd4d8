//! Storage backend over the local upload root.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::io::ErrorKind as IoErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use libunftp::storage::{Error, ErrorKind, Fileinfo, Metadata, Result, StorageBackend};
use tokio::io::{AsyncRead, AsyncWriteExt};
use uuid::Uuid;

use intake_core::constants::PLACEHOLDER_FILE_NAME;
use intake_core::{
    DirectoryEntry, EntryKind, FileEventHandler, IntakeError, ReceivedFile, Reply,
};
use intake_processing::remove_local_file;

use super::session::TransferSession;
use super::user::RelayUser;

/// Metadata reported to the FTP engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMetadata {
    len: u64,
    kind: EntryKind,
    modified: SystemTime,
}

impl EntryMetadata {
    fn from_fs(meta: &std::fs::Metadata) -> Self {
        Self {
            len: meta.len(),
            kind: if meta.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            },
            modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        }
    }
}

impl From<&DirectoryEntry> for EntryMetadata {
    fn from(entry: &DirectoryEntry) -> Self {
        Self {
            len: entry.size,
            kind: entry.kind,
            modified: entry.modified,
        }
    }
}

impl Metadata for EntryMetadata {
    fn len(&self) -> u64 {
        self.len
    }

    fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    fn is_symlink(&self) -> bool {
        false
    }

    fn modified(&self) -> Result<SystemTime> {
        Ok(self.modified)
    }

    fn gid(&self) -> u32 {
        0
    }

    fn uid(&self) -> u32 {
        0
    }
}

/// `libunftp` storage backend rooted at the upload directory.
///
/// Stored files are handed to the [`FileEventHandler`] as soon as they are on disk,
/// and listings come from the handler rather than from the directory itself.
#[derive(Clone)]
pub struct IntakeBackend {
    root: PathBuf,
    handler: Arc<dyn FileEventHandler>,
}

impl Debug for IntakeBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("IntakeBackend")
            .field("root", &self.root)
            .finish()
    }
}

impl IntakeBackend {
    pub fn new(root: impl Into<PathBuf>, handler: Arc<dyn FileEventHandler>) -> Self {
        Self {
            root: root.into(),
            handler,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a client path onto the upload root.
    ///
    /// Paths are resolved lexically; `..` may not climb above the root.
    pub fn resolve(&self, path: &Path) -> std::result::Result<PathBuf, IntakeError> {
        let mut relative = PathBuf::new();
        for component in path.components() {
            match component {
                Component::RootDir | Component::CurDir => {}
                Component::Normal(part) => relative.push(part),
                Component::ParentDir => {
                    if !relative.pop() {
                        return Err(IntakeError::InvalidPath(format!(
                            "{} resolves outside the upload root",
                            path.display()
                        )));
                    }
                }
                Component::Prefix(_) => {
                    return Err(IntakeError::InvalidPath(format!(
                        "{} is not a relative path",
                        path.display()
                    )));
                }
            }
        }
        Ok(self.root.join(relative))
    }
}

fn storage_error(err: IntakeError) -> Error {
    let kind = match &err {
        IntakeError::InvalidPath(_) => ErrorKind::PermissionDenied,
        IntakeError::Io(e) if e.kind() == IoErrorKind::NotFound => {
            ErrorKind::PermanentFileNotAvailable
        }
        IntakeError::Io(e) if e.kind() == IoErrorKind::PermissionDenied => {
            ErrorKind::PermissionDenied
        }
        _ => ErrorKind::LocalError,
    };
    Error::new(kind, err)
}

fn io_error(err: std::io::Error) -> Error {
    storage_error(IntakeError::Io(err))
}

/// Turn a reply recorded by the handler into the transfer's failure.
fn reply_error(reply: Reply) -> Error {
    let kind = match reply.code {
        550 => ErrorKind::PermissionDenied,
        553 => ErrorKind::FileNameNotAllowedError,
        450 => ErrorKind::TransientFileNotAvailable,
        _ => ErrorKind::LocalError,
    };
    Error::new(kind, reply.to_string())
}

fn staging_path(target: &Path, file_name: &str) -> PathBuf {
    target.with_file_name(format!(".{}.{}.part", file_name, Uuid::new_v4().simple()))
}

async fn write_staged<R: AsyncRead + Unpin>(path: &Path, input: &mut R) -> std::io::Result<u64> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    let written = tokio::io::copy(input, &mut file).await?;
    file.flush().await?;
    Ok(written)
}

fn refused(operation: &str, user: &RelayUser) -> Error {
    tracing::debug!(operation, user = %user, "Operation not permitted");
    Error::from(ErrorKind::PermissionDenied)
}

#[async_trait]
impl StorageBackend<RelayUser> for IntakeBackend {
    type Metadata = EntryMetadata;

    /// Only directories and the listing placeholder are visible.
    async fn metadata<P: AsRef<Path> + Send + Debug>(
        &self,
        _user: &RelayUser,
        path: P,
    ) -> Result<Self::Metadata> {
        let full = self.resolve(path.as_ref()).map_err(storage_error)?;
        let meta = tokio::fs::metadata(&full).await.map_err(io_error)?;

        let visible = meta.is_dir()
            || full.file_name().map_or(false, |name| name == PLACEHOLDER_FILE_NAME);
        if !visible {
            return Err(Error::from(ErrorKind::PermanentFileNotAvailable));
        }

        Ok(EntryMetadata::from_fs(&meta))
    }

    async fn list<P: AsRef<Path> + Send + Debug>(
        &self,
        user: &RelayUser,
        path: P,
    ) -> Result<Vec<Fileinfo<PathBuf, Self::Metadata>>>
    where
        <Self as StorageBackend<RelayUser>>::Metadata: Metadata,
    {
        let directory = self.resolve(path.as_ref()).map_err(storage_error)?;
        tracing::debug!(user = %user, directory = %directory.display(), "Listing directory");

        let entries = self
            .handler
            .list_directory(&directory)
            .await
            .map_err(storage_error)?;

        Ok(entries
            .iter()
            .map(|entry| Fileinfo {
                path: PathBuf::from(&entry.name),
                metadata: EntryMetadata::from(entry),
            })
            .collect())
    }

    async fn get<P: AsRef<Path> + Send + Debug>(
        &self,
        user: &RelayUser,
        _path: P,
        _start_pos: u64,
    ) -> Result<Box<dyn AsyncRead + Send + Sync + Unpin>> {
        Err(refused("RETR", user))
    }

    async fn put<P: AsRef<Path> + Send + Debug, R: AsyncRead + Send + Sync + Unpin + 'static>(
        &self,
        user: &RelayUser,
        mut input: R,
        path: P,
        start_pos: u64,
    ) -> Result<u64> {
        if start_pos > 0 {
            return Err(refused("REST+STOR", user));
        }

        let full = self.resolve(path.as_ref()).map_err(storage_error)?;
        let file_name = match full.file_name() {
            Some(name) if full != self.root => name.to_string_lossy().into_owned(),
            _ => return Err(Error::from(ErrorKind::FileNameNotAllowedError)),
        };

        // Each transfer gets its own file so same-name uploads never share one.
        let staged = staging_path(&full, &file_name);
        let written = match write_staged(&staged, &mut input).await {
            Ok(written) => written,
            Err(e) => {
                tracing::warn!(path = %staged.display(), error = %e, "Upload interrupted");
                if let Err(cleanup) = remove_local_file(&staged).await {
                    tracing::error!(error = %cleanup, "Failed to remove partial upload");
                }
                return Err(io_error(e));
            }
        };

        let session = TransferSession::new(user.identity());
        self.handler
            .on_file_received(ReceivedFile::staged(&staged, file_name, written), &session)
            .await;

        match session.into_reply() {
            Some(reply) => Err(reply_error(reply)),
            None => Ok(written),
        }
    }

    async fn del<P: AsRef<Path> + Send + Debug>(&self, user: &RelayUser, _path: P) -> Result<()> {
        Err(refused("DELE", user))
    }

    async fn mkd<P: AsRef<Path> + Send + Debug>(&self, user: &RelayUser, _path: P) -> Result<()> {
        Err(refused("MKD", user))
    }

    async fn rename<P: AsRef<Path> + Send + Debug>(
        &self,
        user: &RelayUser,
        _from: P,
        _to: P,
    ) -> Result<()> {
        Err(refused("RNFR/RNTO", user))
    }

    async fn rmd<P: AsRef<Path> + Send + Debug>(&self, user: &RelayUser, _path: P) -> Result<()> {
        Err(refused("RMD", user))
    }

    async fn cwd<P: AsRef<Path> + Send + Debug>(&self, _user: &RelayUser, path: P) -> Result<()> {
        let full = self.resolve(path.as_ref()).map_err(storage_error)?;
        let meta = tokio::fs::metadata(&full).await.map_err(io_error)?;
        if meta.is_dir() {
            Ok(())
        } else {
            Err(Error::from(ErrorKind::PermanentDirectoryNotAvailable))
        }
    }
}
