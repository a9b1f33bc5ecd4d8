//! Error types module
//!
//! Every failure the intake pipeline can run into is a variant of [`IntakeError`].
//! Only a rate-limit rejection ever reaches the FTP client; every other kind is
//! logged and contained inside the pipeline. [`ErrorMetadata`] describes how each
//! kind is reported.

use std::io;
use std::path::PathBuf;

use crate::constants::{RATE_LIMIT_REPLY_CODE, RATE_LIMIT_REPLY_MESSAGE};
use crate::hooks::Reply;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected outcomes like a client hitting its limit
    Debug,
    /// Warning level - for recoverable or configuration issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error is reported.
pub trait ErrorMetadata {
    /// FTP reply code that would describe this error
    fn reply_code(&self) -> u16;

    /// Machine-readable error code (e.g., "RATE_LIMIT_EXCEEDED")
    fn error_code(&self) -> &'static str;

    /// Whether the uploading client is told about this error
    fn is_client_visible(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Failure of one of the two phases of a remote upload.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Reservation failed: {0}")]
    Reservation(String),

    #[error("Transfer failed: {0}")]
    Transfer(String),
}

impl UploadError {
    /// Name of the phase that failed, for structured logs.
    pub fn phase(&self) -> &'static str {
        match self {
            UploadError::Reservation(_) => "reservation",
            UploadError::Transfer(_) => "transfer",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("Rate limit exceeded for {identity}")]
    RateLimitExceeded { identity: String },

    #[error("Configuration missing: {0}")]
    ConfigurationMissing(&'static str),

    #[error("Remote upload failed: {0}")]
    Upload(#[from] UploadError),

    #[error("Notification failed: {0}")]
    Notification(String),

    #[error("Failed to delete local file {path:?}: {source}")]
    LocalCleanup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Static metadata for each variant: (reply_code, error_code, client_visible, log_level).
fn intake_error_static_metadata(err: &IntakeError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        IntakeError::RateLimitExceeded { .. } => (
            RATE_LIMIT_REPLY_CODE,
            "RATE_LIMIT_EXCEEDED",
            true,
            LogLevel::Debug,
        ),
        IntakeError::ConfigurationMissing(_) => {
            (451, "CONFIGURATION_MISSING", false, LogLevel::Warn)
        }
        IntakeError::Upload(UploadError::Reservation(_)) => {
            (451, "REMOTE_RESERVATION_FAILURE", false, LogLevel::Error)
        }
        IntakeError::Upload(UploadError::Transfer(_)) => {
            (451, "REMOTE_TRANSFER_FAILURE", false, LogLevel::Error)
        }
        IntakeError::Notification(_) => (451, "NOTIFICATION_FAILURE", false, LogLevel::Warn),
        IntakeError::LocalCleanup { .. } => (451, "LOCAL_CLEANUP_FAILURE", false, LogLevel::Error),
        IntakeError::InvalidPath(_) => (553, "INVALID_PATH", false, LogLevel::Debug),
        IntakeError::Io(_) => (451, "IO_ERROR", false, LogLevel::Error),
    }
}

impl IntakeError {
    /// Reply to send to the client, if this error is one the client gets to see.
    pub fn client_reply(&self) -> Option<Reply> {
        match self {
            IntakeError::RateLimitExceeded { .. } => Some(Reply::new(
                self.reply_code(),
                RATE_LIMIT_REPLY_MESSAGE,
            )),
            _ => None,
        }
    }
}

impl ErrorMetadata for IntakeError {
    fn reply_code(&self) -> u16 {
        intake_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        intake_error_static_metadata(self).1
    }

    fn is_client_visible(&self) -> bool {
        intake_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        intake_error_static_metadata(self).3
    }
}
