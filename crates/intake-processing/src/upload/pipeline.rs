//! Upload pipeline: admit → upload → notify → clean up.
//!
//! Every received file goes through [`UploadPipeline::run`] exactly once. Whatever
//! happens along the way, the local copy is deleted before `run` returns, and the
//! client only ever hears about a rate-limit rejection.

use std::sync::Arc;
use std::time::Instant;

use tracing::Instrument;
use uuid::Uuid;

use intake_core::{
    ClientIdentity, ClientSession, ErrorMetadata, IntakeError, LogLevel, NotificationMessage,
    ReceivedFile, RemoteAsset,
};
use intake_infra::{Admission, RateLimiter};

use super::cleanup::remove_local_file;
use super::traits::{NotificationSender, RemoteUploader};

/// Terminal state of one pipeline run.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// Over the rate limit; the client was told and nothing was uploaded.
    Rejected,
    /// Admitted, but remote storage is not configured.
    Discarded,
    /// Stored remotely. `notified` is whether the notification went out.
    Uploaded { asset: RemoteAsset, notified: bool },
    /// The remote upload failed; the client was not told.
    Failed(IntakeError),
}

impl PipelineOutcome {
    pub fn is_uploaded(&self) -> bool {
        matches!(self, PipelineOutcome::Uploaded { .. })
    }

    fn from_error(err: IntakeError) -> Self {
        match err {
            IntakeError::RateLimitExceeded { .. } => PipelineOutcome::Rejected,
            IntakeError::ConfigurationMissing(_) => PipelineOutcome::Discarded,
            other => PipelineOutcome::Failed(other),
        }
    }
}

pub struct UploadPipeline {
    limiter: RateLimiter,
    uploader: Option<Arc<dyn RemoteUploader>>,
    notifier: Arc<dyn NotificationSender>,
}

impl UploadPipeline {
    /// `uploader` is `None` when remote storage credentials are absent; admitted
    /// files are then discarded.
    pub fn new(
        limiter: RateLimiter,
        uploader: Option<Arc<dyn RemoteUploader>>,
        notifier: Arc<dyn NotificationSender>,
    ) -> Self {
        Self {
            limiter,
            uploader,
            notifier,
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Process a received file on behalf of `session`.
    pub async fn run(&self, file: ReceivedFile, session: &dyn ClientSession) -> PipelineOutcome {
        self.run_at(file, session, Instant::now()).await
    }

    /// [`run`](Self::run) with an explicit admission time.
    pub async fn run_at(
        &self,
        file: ReceivedFile,
        session: &dyn ClientSession,
        now: Instant,
    ) -> PipelineOutcome {
        let identity = session.identity();
        let span = tracing::info_span!(
            "upload_pipeline",
            run_id = %Uuid::new_v4(),
            identity = %identity,
            file_name = %file.file_name,
            size = file.size,
        );

        async move {
            tracing::info!(media_type = %file.media_type, "File received");

            let result = self.process(&file, &identity, now).await;

            if let Err(e) = remove_local_file(&file.path).await {
                report(&e);
            }

            match result {
                Ok(outcome) => outcome,
                Err(err) => {
                    report(&err);
                    if let Some(reply) = err.client_reply() {
                        session.respond(reply);
                    }
                    PipelineOutcome::from_error(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn process(
        &self,
        file: &ReceivedFile,
        identity: &ClientIdentity,
        now: Instant,
    ) -> Result<PipelineOutcome, IntakeError> {
        match self.limiter.check_and_record(identity, now).await {
            Admission::Admitted { remaining } => {
                tracing::debug!(remaining, "Upload admitted");
            }
            Admission::Rejected { retry_after } => {
                tracing::info!(
                    retry_after_secs = retry_after.as_secs(),
                    "Upload rejected by rate limit"
                );
                return Err(IntakeError::RateLimitExceeded {
                    identity: identity.to_string(),
                });
            }
        }

        let uploader = self
            .uploader
            .as_ref()
            .ok_or(IntakeError::ConfigurationMissing("UPLOADTHING_API_KEY"))?;

        let asset = uploader.upload(file).await?;
        tracing::info!(public_url = %asset.public_url, "File uploaded");

        let message = NotificationMessage::for_upload(file, &asset);
        let notified = self.notifier.notify(&message).await;

        Ok(PipelineOutcome::Uploaded { asset, notified })
    }
}

fn report(err: &IntakeError) {
    let code = err.error_code();
    match err.log_level() {
        LogLevel::Debug => tracing::debug!(error_code = code, error = %err, "Upload not processed"),
        LogLevel::Warn => tracing::warn!(error_code = code, error = %err, "Upload not processed"),
        LogLevel::Error => tracing::error!(error_code = code, error = %err, "Upload failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use intake_core::{Reply, UploadError};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    const HOUR: Duration = Duration::from_secs(3600);

    struct RecordingSession {
        identity: ClientIdentity,
        replies: Mutex<Vec<Reply>>,
    }

    impl RecordingSession {
        fn new(identity: &str) -> Self {
            Self {
                identity: ClientIdentity::from(identity),
                replies: Mutex::new(Vec::new()),
            }
        }

        fn replies(&self) -> Vec<Reply> {
            self.replies.lock().unwrap().clone()
        }
    }

    impl ClientSession for RecordingSession {
        fn identity(&self) -> ClientIdentity {
            self.identity.clone()
        }

        fn respond(&self, reply: Reply) {
            self.replies.lock().unwrap().push(reply);
        }
    }

    enum Behavior {
        Succeed,
        FailReservation,
        FailTransfer,
    }

    struct FakeUploader {
        behavior: Behavior,
        calls: AtomicUsize,
    }

    impl FakeUploader {
        fn new(behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl RemoteUploader for FakeUploader {
        async fn upload(&self, file: &ReceivedFile) -> Result<RemoteAsset, UploadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // The local file must still be on disk while uploading.
            assert!(file.path.exists());
            match self.behavior {
                Behavior::Succeed => Ok(RemoteAsset {
                    public_url: format!("https://utfs.io/f/{}", file.file_name),
                    media_type: file.media_type.clone(),
                }),
                Behavior::FailReservation => {
                    Err(UploadError::Reservation("500 - upstream".to_string()))
                }
                Behavior::FailTransfer => Err(UploadError::Transfer("403 - denied".to_string())),
            }
        }
    }

    #[derive(Default)]
    struct FakeNotifier {
        sent: Mutex<Vec<NotificationMessage>>,
        fail: bool,
    }

    #[async_trait]
    impl NotificationSender for FakeNotifier {
        async fn notify(&self, message: &NotificationMessage) -> bool {
            self.sent.lock().unwrap().push(message.clone());
            !self.fail
        }
    }

    async fn received(dir: &Path, name: &str) -> ReceivedFile {
        let path = dir.join(name);
        tokio::fs::write(&path, b"payload").await.unwrap();
        ReceivedFile::new(path, 7)
    }

    fn build_pipeline(
        limit: usize,
        uploader: Option<Arc<FakeUploader>>,
        notifier: Arc<FakeNotifier>,
    ) -> UploadPipeline {
        UploadPipeline::new(
            RateLimiter::new(limit, HOUR),
            uploader.map(|u| u as Arc<dyn RemoteUploader>),
            notifier,
        )
    }

    #[tokio::test]
    async fn test_successful_upload_notifies_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let uploader = FakeUploader::new(Behavior::Succeed);
        let notifier = Arc::new(FakeNotifier::default());
        let pipeline = build_pipeline(5, Some(uploader.clone()), notifier.clone());
        let session = RecordingSession::new("alice");

        let file = received(dir.path(), "part.png").await;
        let path = file.path.clone();
        let outcome = pipeline.run(file, &session).await;

        match outcome {
            PipelineOutcome::Uploaded { asset, notified } => {
                assert_eq!(asset.public_url, "https://utfs.io/f/part.png");
                assert_eq!(asset.media_type, "image/png");
                assert!(notified);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(!path.exists());
        assert!(session.replies().is_empty());

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].file_name, "part.png");
        assert_eq!(sent[0].file_type, "image/png");
        assert_eq!(sent[0].public_url, "https://utfs.io/f/part.png");
    }

    #[tokio::test]
    async fn test_sixth_upload_in_window_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let uploader = FakeUploader::new(Behavior::Succeed);
        let notifier = Arc::new(FakeNotifier::default());
        let pipeline = build_pipeline(5, Some(uploader.clone()), notifier.clone());
        let session = RecordingSession::new("alice");
        let start = Instant::now();

        for i in 0..5u64 {
            let file = received(dir.path(), &format!("f{}.bin", i)).await;
            let at = start + Duration::from_secs(i * 120);
            assert!(pipeline.run_at(file, &session, at).await.is_uploaded());
        }

        let file = received(dir.path(), "f5.bin").await;
        let path = file.path.clone();
        let outcome = pipeline
            .run_at(file, &session, start + Duration::from_secs(11 * 60))
            .await;

        assert!(matches!(outcome, PipelineOutcome::Rejected));
        assert!(!path.exists());
        assert_eq!(uploader.calls.load(Ordering::SeqCst), 5);
        assert_eq!(notifier.sent.lock().unwrap().len(), 5);
        assert_eq!(
            session.replies(),
            vec![Reply::new(550, "Rate limit exceeded. Please try again later.")]
        );
    }

    #[tokio::test]
    async fn test_missing_storage_discards_silently() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = Arc::new(FakeNotifier::default());
        let pipeline = build_pipeline(5, None, notifier.clone());
        let session = RecordingSession::new("198.51.100.4");

        let file = received(dir.path(), "a.stl").await;
        let path = file.path.clone();
        let outcome = pipeline.run(file, &session).await;

        assert!(matches!(outcome, PipelineOutcome::Discarded));
        assert!(!path.exists());
        assert!(session.replies().is_empty());
        assert!(notifier.sent.lock().unwrap().is_empty());
        // The discarded upload still counts against the identity.
        assert_eq!(
            pipeline
                .limiter()
                .remaining(&ClientIdentity::from("198.51.100.4"), Instant::now())
                .await,
            4
        );
    }

    #[tokio::test]
    async fn test_remote_failures_are_silent_and_skip_notification() {
        for behavior in [Behavior::FailReservation, Behavior::FailTransfer] {
            let dir = tempfile::tempdir().unwrap();
            let uploader = FakeUploader::new(behavior);
            let notifier = Arc::new(FakeNotifier::default());
            let pipeline = build_pipeline(5, Some(uploader.clone()), notifier.clone());
            let session = RecordingSession::new("bob");

            let file = received(dir.path(), "doc.pdf").await;
            let path = file.path.clone();
            let outcome = pipeline.run(file, &session).await;

            assert!(matches!(
                outcome,
                PipelineOutcome::Failed(IntakeError::Upload(_))
            ));
            assert!(!path.exists());
            assert!(session.replies().is_empty());
            assert!(notifier.sent.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_upload() {
        let dir = tempfile::tempdir().unwrap();
        let uploader = FakeUploader::new(Behavior::Succeed);
        let notifier = Arc::new(FakeNotifier {
            fail: true,
            ..Default::default()
        });
        let pipeline = build_pipeline(5, Some(uploader), notifier);
        let session = RecordingSession::new("carol");

        let file = received(dir.path(), "b.txt").await;
        let outcome = pipeline.run(file, &session).await;

        match outcome {
            PipelineOutcome::Uploaded { notified, .. } => assert!(!notified),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(session.replies().is_empty());
    }

    #[tokio::test]
    async fn test_file_already_gone_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = Arc::new(FakeNotifier::default());
        let pipeline = build_pipeline(5, None, notifier);
        let session = RecordingSession::new("dave");

        let file = ReceivedFile::new(dir.path().join("vanished.bin"), 0);
        let outcome = pipeline.run(file, &session).await;

        assert!(matches!(outcome, PipelineOutcome::Discarded));
        assert!(session.replies().is_empty());
    }
}
