//! Selected Files and Pre-flight Validation
//!
//! A [`SelectedFile`] is what the user picked or dropped: a name, a media
//! type derived from the extension, a size, and the contents (in memory or a
//! path read lazily once validation passed).
//!
//! Validation is synchronous and never touches the network.

use std::io;
use std::path::{Path, PathBuf};

use reqwest::Url;

use crate::error::AnalysisError;

/// Default upload limit: 10 MiB
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Media type used when the extension is unknown
pub const UNKNOWN_MEDIA_TYPE: &str = "application/octet-stream";

/// Limits applied before a file may be submitted
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UploadLimits {
    /// Maximum accepted size in bytes (inclusive)
    pub max_file_size: u64,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

/// Where the file's bytes live
#[derive(Clone, Debug)]
pub enum FileContents {
    /// Bytes already in memory
    Memory(Vec<u8>),
    /// A file on disk, read after validation
    Path(PathBuf),
}

/// A file chosen for analysis
#[derive(Clone, Debug)]
pub struct SelectedFile {
    name: String,
    media_type: String,
    size: u64,
    contents: FileContents,
}

impl SelectedFile {
    /// Create a file from in-memory bytes
    pub fn from_bytes(
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            size: bytes.len() as u64,
            contents: FileContents::Memory(bytes),
        }
    }

    /// Describe a file on disk without reading its contents
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::FileUnreadable`] if the path does not exist
    /// or is not a regular file.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|source| AnalysisError::FileUnreadable {
                path: path.to_path_buf(),
                source,
            })?;

        if !metadata.is_file() {
            return Err(AnalysisError::FileUnreadable {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
            });
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            name,
            media_type: media_type_for_path(path).to_string(),
            size: metadata.len(),
            contents: FileContents::Path(path.to_path_buf()),
        })
    }

    /// File name (no directory)
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Media type, e.g. `image/png`
    #[must_use]
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Size in bytes as observed at selection time
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Where the bytes live
    #[must_use]
    pub fn contents(&self) -> &FileContents {
        &self.contents
    }

    /// Load the file's bytes
    ///
    /// The size is checked again after reading, since a file on disk can
    /// grow between selection and submission.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::FileUnreadable`] on IO failure and
    /// [`AnalysisError::FileTooLarge`] if the bytes exceed `limits`.
    pub async fn read(&self, limits: &UploadLimits) -> Result<Vec<u8>, AnalysisError> {
        let bytes = match &self.contents {
            FileContents::Memory(bytes) => bytes.clone(),
            FileContents::Path(path) => {
                tokio::fs::read(path)
                    .await
                    .map_err(|source| AnalysisError::FileUnreadable {
                        path: path.clone(),
                        source,
                    })?
            }
        };

        let size = bytes.len() as u64;
        if size > limits.max_file_size {
            return Err(AnalysisError::FileTooLarge {
                size,
                limit: limits.max_file_size,
            });
        }

        Ok(bytes)
    }
}

/// Check a file against the pre-flight rules
///
/// Type is checked before size, so a huge text file reports the type.
///
/// # Errors
///
/// - [`AnalysisError::InvalidFileType`] when the media type is not `image/*`
/// - [`AnalysisError::FileTooLarge`] when the size exceeds the limit
pub fn validate(file: &SelectedFile, limits: &UploadLimits) -> Result<(), AnalysisError> {
    if !is_image_media_type(file.media_type()) {
        return Err(AnalysisError::InvalidFileType {
            media_type: file.media_type().to_string(),
        });
    }

    if file.size() > limits.max_file_size {
        return Err(AnalysisError::FileTooLarge {
            size: file.size(),
            limit: limits.max_file_size,
        });
    }

    Ok(())
}

/// Whether a media type names an image
#[must_use]
pub fn is_image_media_type(media_type: &str) -> bool {
    media_type
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
}

/// Detect a media type from the file extension
#[must_use]
pub fn media_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" | "jfif" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "svg" => "image/svg+xml",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "avif" => "image/avif",
        _ => UNKNOWN_MEDIA_TYPE,
    }
}

/// Turn text dropped onto the terminal into a path
///
/// Terminals deliver a drag-and-drop as a paste of the path, in one of a few
/// shapes: quoted, backslash-escaped, or a `file://` URI. Only the first
/// line is used when several files were dropped at once.
#[must_use]
pub fn normalize_dropped_path(raw: &str) -> Option<PathBuf> {
    let first = raw.lines().map(str::trim).find(|l| !l.is_empty())?;

    let unquoted = strip_quotes(first);

    if unquoted.starts_with("file://") {
        return Url::parse(unquoted)
            .ok()
            .and_then(|url| url.to_file_path().ok());
    }

    let mut path = String::with_capacity(unquoted.len());
    let mut chars = unquoted.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if matches!(next, ' ' | '(' | ')' | '\'' | '"' | '&' | '[' | ']') {
                    path.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        path.push(c);
    }

    if path.is_empty() {
        None
    } else {
        Some(PathBuf::from(path))
    }
}

fn strip_quotes(s: &str) -> &str {
    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return &s[1..s.len() - 1];
        }
    }
    s
}
