//! Intake Server Library
//!
//! The FTP front end of the intake relay: a `libunftp` storage backend and
//! authenticator that hand received files and listing requests to the intake
//! handler, plus the startup and shutdown wiring used by the binary.

pub mod constants;
pub mod ftp;
pub mod setup;

pub use ftp::{AnonymousAuthenticator, EntryMetadata, IntakeBackend, RelayUser, TransferSession};
