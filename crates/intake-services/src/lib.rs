//! Intake Services Library
//!
//! Clients for the remote services an upload touches after it has been admitted:
//! the storage service the file is relayed to, and the email transports used to
//! announce it.

#[cfg(feature = "uploadthing")]
pub mod uploadthing;

pub mod notification;

#[cfg(feature = "uploadthing")]
pub use uploadthing::UploadThingClient;

pub use notification::{build_notifier, DisabledNotifier};

#[cfg(feature = "resend")]
pub use notification::ResendNotifier;

#[cfg(feature = "smtp")]
pub use notification::SmtpNotifier;

/// Shorten an upstream response body before it goes into a log line or error.
#[cfg(any(feature = "uploadthing", feature = "resend"))]
pub(crate) fn truncate_body(body: &str) -> String {
    use intake_core::constants::MAX_LOGGED_BODY_CHARS;

    let mut chars = body.chars();
    let head: String = chars.by_ref().take(MAX_LOGGED_BODY_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
