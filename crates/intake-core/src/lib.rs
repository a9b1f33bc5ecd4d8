//! Intake Core Library
//!
//! This crate provides the domain models, error taxonomy, configuration and the
//! protocol hook traits shared by every intake component. It has no knowledge of
//! the FTP engine or of the remote HTTP services.

pub mod config;
pub mod constants;
pub mod error;
pub mod hooks;
pub mod models;

// Re-export commonly used types
pub use config::{BaseConfig, Config, IntakeConfig, LogFormat, NotificationConfig, StorageConfig};
pub use error::{ErrorMetadata, IntakeError, LogLevel, UploadError};
pub use hooks::{ClientSession, FileEventHandler, Reply};
pub use models::{
    ClientIdentity, DirectoryEntry, EntryKind, NotificationMessage, ReceivedFile, RemoteAsset,
    UploadTarget,
};
