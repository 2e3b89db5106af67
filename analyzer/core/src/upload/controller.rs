//! Upload Controller
//!
//! Owns one analysis attempt from file selection to result:
//!
//! ```text
//! idle ──(validation fails)──> idle + error
//! idle ──(validation passes)──> analyzing ──(success)──> done
//!                               analyzing ──(failure)──> idle + error
//!                               analyzing ──(cancel)───> idle
//! ```
//!
//! At most one request is in flight. The classification runs as a spawned
//! task and reports back over a channel; [`UploadController::poll`] drains it
//! without blocking and [`UploadController::next_outcome`] awaits it.
//! Completions are tagged with a request id so a result that lands after a
//! cancel is discarded instead of updating stale state.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::file::{validate, SelectedFile, UploadLimits};
use crate::analysis::SoilAnalysis;
use crate::backend::{ClassificationBackend, ImagePayload};
use crate::error::AnalysisError;
use crate::images::{ImageHandle, ImageStore};

/// Identifier of one submission
pub type RequestId = u64;

/// Controller status as seen by the Shell
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadStatus {
    /// Ready for input (an error message may be showing)
    Idle,
    /// A classification request is in flight
    Analyzing,
    /// The last request succeeded and its result was handed out
    Done,
}

impl UploadStatus {
    /// Short description for status bars
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Idle => "Waiting for an image",
            Self::Analyzing => "Analyzing soil...",
            Self::Done => "Analysis complete",
        }
    }
}

/// How a submission ended
#[derive(Debug)]
pub enum UploadOutcome {
    /// The service classified the image
    Completed {
        /// Display handle for the submitted image
        image: ImageHandle,
        /// The service's analysis, unmodified
        analysis: SoilAnalysis,
    },
    /// The request failed; the controller is input-ready again
    Failed {
        /// What went wrong
        error: AnalysisError,
    },
}

struct Completion {
    request_id: RequestId,
    file_name: String,
    media_type: String,
    result: Result<(Vec<u8>, SoilAnalysis), AnalysisError>,
}

struct InFlight {
    request_id: RequestId,
    file_name: String,
    task: JoinHandle<()>,
}

/// State machine for one upload form
pub struct UploadController<B: ClassificationBackend> {
    backend: Arc<B>,
    images: ImageStore,
    limits: UploadLimits,
    status: UploadStatus,
    error: Option<String>,
    in_flight: Option<InFlight>,
    next_request_id: RequestId,
    tx: mpsc::Sender<Completion>,
    rx: mpsc::Receiver<Completion>,
}

impl<B: ClassificationBackend> UploadController<B> {
    /// Create a controller that registers successful images in `images`
    pub fn new(backend: Arc<B>, images: ImageStore, limits: UploadLimits) -> Self {
        let (tx, rx) = mpsc::channel(4);
        Self {
            backend,
            images,
            limits,
            status: UploadStatus::Idle,
            error: None,
            in_flight: None,
            next_request_id: 1,
            tx,
            rx,
        }
    }

    /// Current status
    #[must_use]
    pub fn status(&self) -> UploadStatus {
        self.status
    }

    /// Whether a request is in flight
    #[must_use]
    pub fn is_analyzing(&self) -> bool {
        self.status == UploadStatus::Analyzing
    }

    /// Inline error message, if any
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Name of the file being analyzed
    #[must_use]
    pub fn in_flight_file(&self) -> Option<&str> {
        self.in_flight.as_ref().map(|f| f.file_name.as_str())
    }

    /// Active limits
    #[must_use]
    pub fn limits(&self) -> &UploadLimits {
        &self.limits
    }

    /// The backend requests go to
    #[must_use]
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Run the pre-flight checks without changing state
    ///
    /// # Errors
    ///
    /// See [`validate`].
    pub fn validate(&self, file: &SelectedFile) -> Result<(), AnalysisError> {
        validate(file, &self.limits)
    }

    /// Validate a file and, if it passes, start classifying it
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::Busy`] while another request is in flight (state
    ///   is left untouched)
    /// - a local validation error, which also becomes the inline message
    pub fn submit(&mut self, file: SelectedFile) -> Result<RequestId, AnalysisError> {
        if self.is_analyzing() {
            tracing::warn!(file = file.name(), "Submission ignored, analysis in progress");
            return Err(AnalysisError::Busy);
        }

        self.error = None;

        if let Err(err) = self.validate(&file) {
            tracing::info!(
                file = file.name(),
                media_type = file.media_type(),
                size = file.size(),
                kind = err.kind(),
                "File rejected before upload"
            );
            self.error = Some(err.user_message());
            self.status = UploadStatus::Idle;
            return Err(err);
        }

        let request_id = self.next_request_id;
        self.next_request_id += 1;

        tracing::info!(
            request_id,
            file = file.name(),
            size = file.size(),
            backend = self.backend.name(),
            "Submitting image for analysis"
        );

        let file_name = file.name().to_string();
        let backend = Arc::clone(&self.backend);
        let limits = self.limits;
        let tx = self.tx.clone();

        let task = tokio::spawn(async move {
            let result = classify_file(backend.as_ref(), &file, &limits).await;
            let completion = Completion {
                request_id,
                file_name: file.name().to_string(),
                media_type: file.media_type().to_string(),
                result,
            };
            // Receiver gone means the controller was dropped
            let _ = tx.send(completion).await;
        });

        self.in_flight = Some(InFlight {
            request_id,
            file_name,
            task,
        });
        self.status = UploadStatus::Analyzing;

        Ok(request_id)
    }

    /// Apply a finished request, if one is waiting (non-blocking)
    ///
    /// A request whose task ended without reporting back (it panicked) is
    /// resolved as a failure so the form never stays stuck in `analyzing`.
    pub fn poll(&mut self) -> Option<UploadOutcome> {
        // Checked before draining: a task sends its completion before it finishes
        let finished = self
            .in_flight
            .as_ref()
            .is_some_and(|f| f.task.is_finished());

        if let Some(outcome) = self.drain() {
            return Some(outcome);
        }
        if finished {
            return Some(self.abandon());
        }
        None
    }

    /// Wait for the in-flight request to finish
    ///
    /// Returns `None` immediately when nothing is in flight.
    pub async fn next_outcome(&mut self) -> Option<UploadOutcome> {
        loop {
            let in_flight = self.in_flight.as_mut()?;

            tokio::select! {
                biased;

                Some(completion) = self.rx.recv() => {
                    if self.is_current(&completion) {
                        return Some(self.finish(completion));
                    }
                    tracing::debug!(request_id = completion.request_id, "Discarding stale completion");
                }

                _ = &mut in_flight.task => {
                    return Some(match self.drain() {
                        Some(outcome) => outcome,
                        None => self.abandon(),
                    });
                }
            }
        }
    }

    /// Abort the in-flight request and return to idle
    ///
    /// Returns whether a request was actually cancelled.
    pub fn cancel(&mut self) -> bool {
        match self.in_flight.take() {
            Some(in_flight) => {
                in_flight.task.abort();
                self.status = UploadStatus::Idle;
                tracing::info!(
                    request_id = in_flight.request_id,
                    file = %in_flight.file_name,
                    "Analysis cancelled"
                );
                true
            }
            None => false,
        }
    }

    /// Cancel anything in flight and clear the form
    pub fn reset(&mut self) {
        self.cancel();
        self.status = UploadStatus::Idle;
        self.error = None;
    }

    /// Dismiss the inline error
    pub fn clear_error(&mut self) {
        self.error = None;
    }

    fn drain(&mut self) -> Option<UploadOutcome> {
        while let Ok(completion) = self.rx.try_recv() {
            if self.is_current(&completion) {
                return Some(self.finish(completion));
            }
            tracing::debug!(request_id = completion.request_id, "Discarding stale completion");
        }
        None
    }

    fn abandon(&mut self) -> UploadOutcome {
        let request_id = self.in_flight.take().map_or(0, |f| f.request_id);
        tracing::error!(request_id, "Analysis task ended without a result");
        self.fail(
            request_id,
            AnalysisError::ConnectionFailed {
                detail: "the request stopped unexpectedly".to_string(),
            },
        )
    }

    fn fail(&mut self, request_id: RequestId, error: AnalysisError) -> UploadOutcome {
        self.status = UploadStatus::Idle;
        self.error = Some(error.user_message());
        tracing::warn!(
            request_id,
            kind = error.kind(),
            error = %error,
            "Analysis failed"
        );
        UploadOutcome::Failed { error }
    }

    fn is_current(&self, completion: &Completion) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|f| f.request_id == completion.request_id)
    }

    fn finish(&mut self, completion: Completion) -> UploadOutcome {
        self.in_flight = None;

        match completion.result {
            Ok((bytes, analysis)) => {
                let image = self
                    .images
                    .create(completion.file_name, completion.media_type, bytes);
                self.status = UploadStatus::Done;
                self.error = None;
                tracing::info!(
                    request_id = completion.request_id,
                    image = %image.id(),
                    "Analysis ready"
                );
                UploadOutcome::Completed { image, analysis }
            }
            Err(error) => self.fail(completion.request_id, error),
        }
    }
}

impl<B: ClassificationBackend> Drop for UploadController<B> {
    fn drop(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.task.abort();
        }
    }
}

async fn classify_file<B: ClassificationBackend + ?Sized>(
    backend: &B,
    file: &SelectedFile,
    limits: &UploadLimits,
) -> Result<(Vec<u8>, SoilAnalysis), AnalysisError> {
    let bytes = file.read(limits).await?;
    let payload = ImagePayload::new(file.name(), file.media_type(), bytes.clone());
    let analysis = backend.classify(payload).await?;
    Ok((bytes, analysis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Level, Moisture, Texture};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct StubBackend {
        calls: AtomicUsize,
        delay: Duration,
        fail: bool,
    }

    impl StubBackend {
        fn ok() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
                fail: false,
            })
        }

        fn slow(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay,
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
                fail: true,
            })
        }
    }

    #[async_trait]
    impl ClassificationBackend for StubBackend {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn classify(&self, _image: ImagePayload) -> Result<SoilAnalysis, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(AnalysisError::ClassificationRequestFailed {
                    status: 500,
                    detail: "server error".into(),
                });
            }
            Ok(SoilAnalysis::new(
                Texture::Silty,
                Moisture::Moist,
                Level::High,
                Level::Medium,
                "Marrom",
            ))
        }
    }

    struct PanickingBackend;

    #[async_trait]
    impl ClassificationBackend for PanickingBackend {
        fn name(&self) -> &'static str {
            "panicking"
        }

        async fn classify(&self, _image: ImagePayload) -> Result<SoilAnalysis, AnalysisError> {
            panic!("backend exploded");
        }
    }

    fn panicking() -> UploadController<PanickingBackend> {
        UploadController::new(
            Arc::new(PanickingBackend),
            ImageStore::new(),
            UploadLimits::default(),
        )
    }

    fn png(size: usize) -> SelectedFile {
        SelectedFile::from_bytes("soil.png", "image/png", vec![7u8; size])
    }

    fn controller(backend: Arc<StubBackend>) -> UploadController<StubBackend> {
        UploadController::new(backend, ImageStore::new(), UploadLimits::default())
    }

    #[tokio::test]
    async fn test_starts_idle() {
        let ctl = controller(StubBackend::ok());
        assert_eq!(ctl.status(), UploadStatus::Idle);
        assert!(ctl.error().is_none());
        assert!(ctl.in_flight_file().is_none());
    }

    #[tokio::test]
    async fn test_invalid_type_sets_error_without_request() {
        let backend = StubBackend::ok();
        let mut ctl = controller(backend.clone());

        let file = SelectedFile::from_bytes("notes.txt", "text/plain", vec![1]);
        assert!(matches!(
            ctl.submit(file),
            Err(AnalysisError::InvalidFileType { .. })
        ));

        assert_eq!(ctl.status(), UploadStatus::Idle);
        assert!(ctl.error().is_some());
        tokio::task::yield_now().await;
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_success_transitions_to_done() {
        let mut ctl = controller(StubBackend::ok());

        ctl.submit(png(32)).unwrap();
        assert_eq!(ctl.status(), UploadStatus::Analyzing);
        assert_eq!(ctl.in_flight_file(), Some("soil.png"));

        match ctl.next_outcome().await {
            Some(UploadOutcome::Completed { image, analysis }) => {
                assert_eq!(image.size(), 32);
                assert_eq!(image.media_type(), "image/png");
                assert_eq!(analysis.texture, Texture::Silty);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(ctl.status(), UploadStatus::Done);
        assert!(ctl.in_flight_file().is_none());
    }

    #[tokio::test]
    async fn test_panicked_task_fails_next_outcome() {
        let mut ctl = panicking();

        ctl.submit(png(8)).unwrap();
        let outcome = tokio::time::timeout(Duration::from_secs(5), ctl.next_outcome())
            .await
            .expect("next_outcome must not hang on a dead task");

        match outcome {
            Some(UploadOutcome::Failed { error }) => {
                assert!(matches!(error, AnalysisError::ConnectionFailed { .. }));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(ctl.status(), UploadStatus::Idle);
        assert!(ctl.error().is_some());
        assert!(ctl.in_flight_file().is_none());
        assert!(ctl.next_outcome().await.is_none());
    }

    #[tokio::test]
    async fn test_panicked_task_fails_poll() {
        let mut ctl = panicking();
        ctl.submit(png(8)).unwrap();

        let mut outcome = None;
        for _ in 0..200 {
            outcome = ctl.poll();
            if outcome.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert!(matches!(outcome, Some(UploadOutcome::Failed { .. })));
        assert!(!ctl.is_analyzing());

        // Input-ready again, not stuck behind the Busy guard
        assert!(ctl.submit(png(8)).is_ok());
        assert!(ctl.cancel());
    }

    #[tokio::test]
    async fn test_failure_returns_to_idle_with_message() {
        let mut ctl = controller(StubBackend::failing());

        ctl.submit(png(8)).unwrap();
        let outcome = ctl.next_outcome().await;
        assert!(matches!(outcome, Some(UploadOutcome::Failed { .. })));

        assert_eq!(ctl.status(), UploadStatus::Idle);
        assert!(ctl.error().unwrap().contains("server error"));
    }

    #[tokio::test]
    async fn test_busy_while_analyzing() {
        let backend = StubBackend::slow(Duration::from_millis(200));
        let mut ctl = controller(backend.clone());

        ctl.submit(png(8)).unwrap();
        assert!(matches!(ctl.submit(png(8)), Err(AnalysisError::Busy)));
        assert!(ctl.error().is_none());

        ctl.next_outcome().await.unwrap();
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_discards_result() {
        let backend = StubBackend::slow(Duration::from_millis(50));
        let mut ctl = controller(backend);

        ctl.submit(png(8)).unwrap();
        assert!(ctl.cancel());
        assert_eq!(ctl.status(), UploadStatus::Idle);
        assert!(!ctl.cancel());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(ctl.poll().is_none());
        assert!(ctl.next_outcome().await.is_none());
        assert_eq!(ctl.status(), UploadStatus::Idle);
    }

    #[tokio::test]
    async fn test_poll_without_request() {
        let mut ctl = controller(StubBackend::ok());
        assert!(ctl.poll().is_none());
        assert!(ctl.next_outcome().await.is_none());
    }

    #[tokio::test]
    async fn test_reset_clears_error() {
        let mut ctl = controller(StubBackend::ok());
        let _ = ctl.submit(SelectedFile::from_bytes("a.txt", "text/plain", vec![]));
        assert!(ctl.error().is_some());

        ctl.reset();
        assert!(ctl.error().is_none());
        assert_eq!(ctl.status(), UploadStatus::Idle);
    }

    #[tokio::test]
    async fn test_new_submission_clears_previous_error() {
        let mut ctl = controller(StubBackend::ok());
        let _ = ctl.submit(SelectedFile::from_bytes("a.txt", "text/plain", vec![]));
        assert!(ctl.error().is_some());

        ctl.submit(png(4)).unwrap();
        assert!(ctl.error().is_none());
    }
}
