//! Classification Backends
//!
//! Access to the external soil classification service through a common
//! trait, so the Upload Controller can run against the real endpoint or a
//! test double.
//!
//! # Usage
//!
//! ```ignore
//! use analyzer_core::backend::{ClassificationBackend, EndpointConfig, HttpClassifier, ImagePayload};
//!
//! let backend = HttpClassifier::new(EndpointConfig::default())?;
//! let analysis = backend
//!     .classify(ImagePayload::new("soil.jpg", "image/jpeg", bytes))
//!     .await?;
//! ```

mod http;
mod traits;

pub use http::{
    decode_analysis, EndpointConfig, HttpClassifier, DEFAULT_ENDPOINT, DEFAULT_FIELD_NAME,
    DEFAULT_MAX_RESPONSE_BYTES, DEFAULT_TIMEOUT,
};
pub use traits::{ClassificationBackend, ImagePayload};
