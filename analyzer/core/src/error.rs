//! Analysis Errors
//!
//! Failure taxonomy for one analysis attempt. Every variant is recoverable:
//! the user fixes the input or retries from the upload screen.
//!
//! - Local (pre-flight, never reach the network): [`AnalysisError::InvalidFileType`],
//!   [`AnalysisError::FileTooLarge`], [`AnalysisError::FileUnreadable`]
//! - Remote: [`AnalysisError::ClassificationRequestFailed`],
//!   [`AnalysisError::ConnectionFailed`], [`AnalysisError::MalformedResponse`]

use std::path::PathBuf;

use thiserror::Error;

/// Shown when the transport failed without a usable cause
pub const CONNECTION_FALLBACK_MESSAGE: &str = "Could not connect to the analysis service.";

/// Shown when a failure carries no detail at all
pub const GENERIC_FALLBACK_MESSAGE: &str = "Something went wrong while analyzing the image.";

/// Errors produced while validating, submitting or decoding one analysis
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The file's media type does not indicate an image
    #[error("Unsupported file type {media_type:?}: only images can be analyzed")]
    InvalidFileType {
        /// Media type of the rejected file
        media_type: String,
    },

    /// The file exceeds the upload limit
    #[error("File is {size} bytes, the limit is {limit} bytes")]
    FileTooLarge {
        /// Size of the rejected file in bytes
        size: u64,
        /// Configured limit in bytes
        limit: u64,
    },

    /// The selected path could not be read
    #[error("Failed to read {path}: {source}")]
    FileUnreadable {
        /// Path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// The service was reachable but rejected the request
    #[error("Analysis request failed with status {status}: {detail}")]
    ClassificationRequestFailed {
        /// HTTP status code
        status: u16,
        /// Response body text, or the status text when the body was empty
        detail: String,
    },

    /// The service could not be reached or the request died in transit
    #[error("Could not reach the analysis service: {detail}")]
    ConnectionFailed {
        /// Underlying cause, possibly empty
        detail: String,
    },

    /// The service accepted the request but the body was unusable
    #[error("Analysis service returned an unusable response: {detail}")]
    MalformedResponse {
        /// Decoder or service detail
        detail: String,
    },

    /// A submission arrived while another request is in flight
    #[error("An analysis is already in progress")]
    Busy,
}

impl AnalysisError {
    /// Whether the failure happened before any network activity
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::InvalidFileType { .. } | Self::FileTooLarge { .. } | Self::FileUnreadable { .. }
        )
    }

    /// Short machine-friendly name, used in log fields
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidFileType { .. } => "invalid_file_type",
            Self::FileTooLarge { .. } => "file_too_large",
            Self::FileUnreadable { .. } => "file_unreadable",
            Self::ClassificationRequestFailed { .. } => "classification_request_failed",
            Self::ConnectionFailed { .. } => "connection_failed",
            Self::MalformedResponse { .. } => "malformed_response",
            Self::Busy => "busy",
        }
    }

    /// The single message shown inline on the upload screen
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidFileType { .. } => {
                "Please select an image file (JPG or PNG).".to_string()
            }
            Self::FileTooLarge { limit, .. } => {
                format!("The file must be at most {}.", format_size(*limit))
            }
            Self::FileUnreadable { path, source } => {
                format!("Could not read {}: {}", path.display(), source)
            }
            Self::ClassificationRequestFailed { detail, .. } => {
                if detail.trim().is_empty() {
                    GENERIC_FALLBACK_MESSAGE.to_string()
                } else {
                    format!("Analysis failed: {}", detail.trim())
                }
            }
            Self::ConnectionFailed { detail } => {
                if detail.trim().is_empty() {
                    CONNECTION_FALLBACK_MESSAGE.to_string()
                } else {
                    format!("{} ({})", CONNECTION_FALLBACK_MESSAGE, detail.trim())
                }
            }
            Self::MalformedResponse { detail } => {
                if detail.trim().is_empty() {
                    GENERIC_FALLBACK_MESSAGE.to_string()
                } else {
                    format!("The analysis service sent an unexpected response: {}", detail.trim())
                }
            }
            Self::Busy => "An analysis is already in progress.".to_string(),
        }
    }
}

/// Format a byte count the way the upload tips phrase it ("10 MB")
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;

    if bytes >= MIB && bytes % MIB == 0 {
        format!("{} MB", bytes / MIB)
    } else if bytes >= MIB {
        format!("{:.1} MB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KB", bytes as f64 / KIB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
