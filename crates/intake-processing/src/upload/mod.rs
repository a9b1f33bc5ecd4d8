//! Upload handling: orchestration, collaborator traits and local cleanup.

pub mod cleanup;
pub mod pipeline;
pub mod traits;

pub use cleanup::{remove_local_file, sweep_stale_uploads};
pub use pipeline::{PipelineOutcome, UploadPipeline};
pub use traits::{NotificationSender, RemoteUploader};
