//! Classification Backend Traits
//!
//! The seam between the Upload Controller and whatever classifies the image.
//! The HTTP implementation talks to the external service; tests substitute
//! a mock.

use async_trait::async_trait;

use crate::analysis::SoilAnalysis;
use crate::error::AnalysisError;

/// One validated image, ready to send
#[derive(Clone, Debug)]
pub struct ImagePayload {
    /// Original file name
    pub file_name: String,
    /// Media type, e.g. `image/png`
    pub media_type: String,
    /// Raw image bytes
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    /// Create a payload
    pub fn new(
        file_name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }
}

/// Something that turns an image into a [`SoilAnalysis`]
///
/// Implementations perform exactly one attempt per call: no retries.
#[async_trait]
pub trait ClassificationBackend: Send + Sync + 'static {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    /// Classify one image
    ///
    /// # Errors
    ///
    /// Returns one of the remote [`AnalysisError`] kinds
    /// (`ClassificationRequestFailed`, `ConnectionFailed`, `MalformedResponse`).
    async fn classify(&self, image: ImagePayload) -> Result<SoilAnalysis, AnalysisError>;
}
