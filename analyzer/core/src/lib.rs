//! Analyzer Core - Soil Photo Analysis Client Logic
//!
//! Everything the soilscope client does apart from drawing: validating a
//! chosen photo, sending it to the classification service, decoding the
//! verdict, and deciding which screen shows what.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                   Surfaces (tui, headless)                 │
//! └──────────────────────────┬────────────────────────────────┘
//!                            │ start / submit / poll / back
//! ┌──────────────────────────┴────────────────────────────────┐
//! │  Shell ── Screen {Landing, Upload, Result}                 │
//! │    │                                                       │
//! │    ├── UploadController ── validate ── ClassificationBackend│
//! │    │                                     (HttpClassifier)  │
//! │    └── ImageStore ── ImageHandle (revoked on drop)         │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use analyzer_core::{load_config, HttpClassifier, SelectedFile, Shell};
//!
//! let config = load_config()?;
//! let backend = Arc::new(HttpClassifier::new(config.endpoint.clone())?);
//! let mut shell = Shell::new(backend, config.upload);
//!
//! shell.start_analysis();
//! shell.submit(SelectedFile::from_path("soil.jpg").await?)?;
//! if let Some(event) = shell.next_event().await {
//!     // Result screen now shows shell.current()
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`analysis`]: The analysis result and its closed label sets
//! - [`backend`]: Classification backend trait and the HTTP client
//! - [`config`]: TOML, environment and CLI configuration
//! - [`error`]: Failure taxonomy and user-facing messages
//! - [`images`]: Handles for images currently on display
//! - [`shell`]: Screen navigation and the current analysis
//! - [`upload`]: File selection, validation, and the Upload Controller
//!
//! # No TUI Dependencies
//!
//! This crate has no dependency on ratatui, crossterm, or any other UI
//! framework.

#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod analysis;
pub mod backend;
pub mod config;
pub mod error;
pub mod images;
pub mod shell;
pub mod upload;

pub use analysis::{Level, Moisture, SoilAnalysis, Texture};
pub use backend::{
    decode_analysis, ClassificationBackend, EndpointConfig, HttpClassifier, ImagePayload,
};
pub use config::{
    default_config_path, load_config, load_config_from_path, load_config_with_overrides,
    AppConfig, ConfigError, ConfigOverrides, ConfigSource, SoilscopeToml,
};
pub use error::{format_size, AnalysisError};
pub use images::{ImageHandle, ImageId, ImageStore};
pub use shell::{CurrentAnalysis, Screen, Shell, ShellEvent};
pub use upload::{
    normalize_dropped_path, validate, RequestId, SelectedFile, UploadController, UploadLimits,
    UploadOutcome, UploadStatus,
};
