use std::path::Path;

use async_trait::async_trait;

use intake_core::{ClientSession, DirectoryEntry, FileEventHandler, IntakeError, ReceivedFile};

use crate::listing::ListingOverride;
use crate::upload::UploadPipeline;

/// [`FileEventHandler`] backed by the upload pipeline and the listing override.
pub struct IntakeHandler {
    pipeline: UploadPipeline,
    listing: ListingOverride,
}

impl IntakeHandler {
    pub fn new(pipeline: UploadPipeline, listing: ListingOverride) -> Self {
        Self { pipeline, listing }
    }

    pub fn pipeline(&self) -> &UploadPipeline {
        &self.pipeline
    }

    pub fn listing(&self) -> &ListingOverride {
        &self.listing
    }
}

#[async_trait]
impl FileEventHandler for IntakeHandler {
    async fn on_file_received(&self, file: ReceivedFile, session: &dyn ClientSession) {
        let outcome = self.pipeline.run(file, session).await;
        tracing::debug!(?outcome, "Upload handled");
    }

    async fn list_directory(&self, directory: &Path) -> Result<Vec<DirectoryEntry>, IntakeError> {
        self.listing.list(directory).await
    }
}
