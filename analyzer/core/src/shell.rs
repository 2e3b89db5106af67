//! Application Shell
//!
//! Top-level navigation between the three screens and ownership of the
//! current analysis. Every transition is an explicit event:
//!
//! | From    | Event            | To      |
//! |---------|------------------|---------|
//! | Landing | start analysis   | Upload  |
//! | Upload  | analysis done    | Result  |
//! | Upload  | back             | Landing |
//! | Result  | new analysis     | Upload  |
//! | Result  | back             | Landing |
//!
//! Leaving the Result screen drops the current [`ImageHandle`], which
//! releases the image bytes. Leaving the Upload screen cancels any request
//! in flight so its result can never land on another screen.

use std::sync::Arc;

use crate::analysis::SoilAnalysis;
use crate::backend::ClassificationBackend;
use crate::error::AnalysisError;
use crate::images::{ImageHandle, ImageStore};
use crate::upload::{
    RequestId, SelectedFile, UploadController, UploadLimits, UploadOutcome, UploadStatus,
};

/// Which screen is showing
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Screen {
    /// Introduction and call to action
    #[default]
    Landing,
    /// File selection and progress
    Upload,
    /// Analysis result
    Result,
}

impl Screen {
    /// Screen title
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::Landing => "Soil Analysis",
            Self::Upload => "Upload a Soil Photo",
            Self::Result => "Analysis Result",
        }
    }
}

/// The analysis shown on the Result screen, with the image it came from
#[derive(Debug)]
pub struct CurrentAnalysis {
    /// Handle for the analyzed image
    pub image: ImageHandle,
    /// The service's answer
    pub analysis: SoilAnalysis,
}

/// What a completed request did to the Shell
#[derive(Debug)]
pub enum ShellEvent {
    /// The Result screen is now showing
    ResultShown,
    /// The request failed; the Upload screen shows the message
    UploadFailed {
        /// What went wrong
        error: AnalysisError,
    },
}

/// Screen state plus the current analysis
pub struct Shell<B: ClassificationBackend> {
    screen: Screen,
    upload: UploadController<B>,
    current: Option<CurrentAnalysis>,
    images: ImageStore,
}

impl<B: ClassificationBackend> Shell<B> {
    /// Create a Shell on the Landing screen
    pub fn new(backend: Arc<B>, limits: UploadLimits) -> Self {
        let images = ImageStore::new();
        Self {
            screen: Screen::Landing,
            upload: UploadController::new(backend, images.clone(), limits),
            current: None,
            images,
        }
    }

    /// Showing screen
    #[must_use]
    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Current analysis, present only on the Result screen
    #[must_use]
    pub fn current(&self) -> Option<&CurrentAnalysis> {
        self.current.as_ref()
    }

    /// Upload controller state
    #[must_use]
    pub fn upload(&self) -> &UploadController<B> {
        &self.upload
    }

    /// Image store backing displayed images
    #[must_use]
    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    /// Landing → Upload
    pub fn start_analysis(&mut self) {
        if self.screen == Screen::Landing {
            self.enter_upload();
        }
    }

    /// Hand a file to the Upload Controller
    ///
    /// From any screen other than Upload this first navigates there, so a
    /// file dropped on the Result screen starts a fresh analysis.
    ///
    /// # Errors
    ///
    /// See [`UploadController::submit`].
    pub fn submit(&mut self, file: SelectedFile) -> Result<RequestId, AnalysisError> {
        if self.screen != Screen::Upload {
            self.enter_upload();
        }
        self.upload.submit(file)
    }

    /// Apply a finished request without blocking
    pub fn poll(&mut self) -> Option<ShellEvent> {
        let outcome = self.upload.poll()?;
        Some(self.apply(outcome))
    }

    /// Wait for the in-flight request, if any
    pub async fn next_event(&mut self) -> Option<ShellEvent> {
        let outcome = self.upload.next_outcome().await?;
        Some(self.apply(outcome))
    }

    /// Result → Upload, discarding the current analysis
    pub fn new_analysis(&mut self) {
        if self.screen == Screen::Result {
            self.enter_upload();
        }
    }

    /// Any screen → Landing
    pub fn back_to_home(&mut self) {
        self.upload.reset();
        self.release_current();
        self.screen = Screen::Landing;
        tracing::debug!("Navigated to landing");
    }

    /// Cancel the in-flight request and stay on the Upload screen
    pub fn cancel_analysis(&mut self) -> bool {
        self.upload.cancel()
    }

    /// Dismiss the inline upload error
    pub fn clear_error(&mut self) {
        self.upload.clear_error();
    }

    fn enter_upload(&mut self) {
        self.upload.reset();
        self.release_current();
        self.screen = Screen::Upload;
        tracing::debug!("Navigated to upload");
    }

    fn release_current(&mut self) {
        if let Some(current) = self.current.take() {
            tracing::debug!(image = %current.image.id(), "Releasing displayed analysis");
        }
    }

    fn apply(&mut self, outcome: UploadOutcome) -> ShellEvent {
        match outcome {
            UploadOutcome::Completed { image, analysis } => {
                debug_assert_eq!(self.upload.status(), UploadStatus::Done);
                self.current = Some(CurrentAnalysis { image, analysis });
                self.screen = Screen::Result;
                ShellEvent::ResultShown
            }
            UploadOutcome::Failed { error } => ShellEvent::UploadFailed { error },
        }
    }
}
