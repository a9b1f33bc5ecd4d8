//! Domain models module
//!
//! Data types passed between the FTP adapter, the upload pipeline and the
//! remote services.

pub mod identity;
pub mod listing;
pub mod notification;
pub mod upload;

pub use identity::ClientIdentity;
pub use listing::{DirectoryEntry, EntryKind};
pub use notification::NotificationMessage;
pub use upload::{media_type_for, ReceivedFile, RemoteAsset, UploadTarget};
