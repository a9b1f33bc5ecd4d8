//! Hooks between the intake core and the FTP engine
//!
//! The engine drives two events (a file finished uploading, a directory is being
//! listed) and offers one capability back (answer the client). These traits keep
//! the core free of any engine types: an adapter implements [`ClientSession`] and
//! calls into a [`FileEventHandler`].

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;

use async_trait::async_trait;

use crate::error::IntakeError;
use crate::models::{ClientIdentity, DirectoryEntry, ReceivedFile};

/// A protocol reply: numeric code plus human-readable text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub code: u16,
    pub message: String,
}

impl Reply {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl Display for Reply {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} {}", self.code, self.message)
    }
}

/// The connection a hook is running on.
pub trait ClientSession: Send + Sync {
    /// Rate-limit partition key for this connection.
    fn identity(&self) -> ClientIdentity;

    /// Send a reply to the client on the control connection.
    fn respond(&self, reply: Reply);
}

/// Events raised by the FTP engine.
#[async_trait]
pub trait FileEventHandler: Send + Sync {
    /// Called once per fully received upload. The handler owns `file` and is
    /// responsible for removing it from disk before returning.
    async fn on_file_received(&self, file: ReceivedFile, session: &dyn ClientSession);

    /// Entries to show the client when it lists `directory`.
    async fn list_directory(&self, directory: &Path) -> Result<Vec<DirectoryEntry>, IntakeError>;
}
