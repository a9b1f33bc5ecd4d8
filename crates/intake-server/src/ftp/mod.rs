//! `libunftp` adapter.
//!
//! Anonymous logins only. Clients may enter directories, list them and store
//! files; every other file operation is refused.

mod auth;
mod backend;
mod session;
mod user;

pub use auth::AnonymousAuthenticator;
pub use backend::{EntryMetadata, IntakeBackend};
pub use session::TransferSession;
pub use user::RelayUser;
