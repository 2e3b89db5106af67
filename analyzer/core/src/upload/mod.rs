//! Upload
//!
//! File selection, local validation, and the controller that drives one
//! analysis request at a time.

mod controller;
mod file;

pub use controller::{RequestId, UploadController, UploadOutcome, UploadStatus};
pub use file::{
    is_image_media_type, media_type_for_path, normalize_dropped_path, validate, FileContents,
    SelectedFile, UploadLimits, DEFAULT_MAX_FILE_SIZE, UNKNOWN_MEDIA_TYPE,
};
