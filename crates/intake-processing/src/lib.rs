//! Intake Processing Library
//!
//! Handling of the two FTP engine events:
//! - received uploads run through [`UploadPipeline`] (rate limit, remote upload,
//!   notification, local cleanup)
//! - directory listings are answered by [`ListingOverride`]
//!
//! [`IntakeHandler`] ties both to the [`intake_core::FileEventHandler`] hook.

pub mod handler;
pub mod listing;
pub mod upload;

pub use handler::IntakeHandler;
pub use listing::ListingOverride;
pub use upload::{
    remove_local_file, sweep_stale_uploads, NotificationSender, PipelineOutcome,
    RemoteUploader, UploadPipeline,
};
