//! Image Handle Store
//!
//! Keeps the bytes of images currently on display, addressed by a locally
//! generated id (`soilscope://image/<uuid>`), the way a browser hands out
//! object URLs for selected files.
//!
//! An [`ImageHandle`] owns its entry: dropping the handle revokes it. The
//! store itself never releases anything on its own, so a handle that is
//! kept alive keeps its bytes alive, and a handle that is dropped can never
//! leak.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use uuid::Uuid;

/// Identifier for an image held in the store
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageId(Uuid);

impl ImageId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// URL form of the id
    #[must_use]
    pub fn url(&self) -> String {
        format!("soilscope://image/{}", self.0)
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "soilscope://image/{}", self.0)
    }
}

type Entries = Mutex<HashMap<ImageId, Arc<[u8]>>>;

/// Registry of displayed images
#[derive(Clone, Default)]
pub struct ImageStore {
    entries: Arc<Entries>,
}

impl ImageStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register image bytes and return the owning handle
    pub fn create(
        &self,
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> ImageHandle {
        let id = ImageId::new();
        let size = bytes.len() as u64;
        self.entries.lock().insert(id, Arc::from(bytes));

        tracing::debug!(image = %id, size, "Image handle created");

        ImageHandle {
            id,
            name: name.into(),
            media_type: media_type.into(),
            size,
            entries: Arc::downgrade(&self.entries),
        }
    }

    /// Bytes for a live handle id
    #[must_use]
    pub fn get(&self, id: &ImageId) -> Option<Arc<[u8]>> {
        self.entries.lock().get(id).cloned()
    }

    /// Whether an id is still live
    #[must_use]
    pub fn contains(&self, id: &ImageId) -> bool {
        self.entries.lock().contains_key(id)
    }

    /// Number of handles not yet released
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.entries.lock().len()
    }
}

impl fmt::Debug for ImageStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageStore")
            .field("live", &self.live_count())
            .finish()
    }
}

/// Owning reference to a displayed image
///
/// Revoked when dropped.
pub struct ImageHandle {
    id: ImageId,
    name: String,
    media_type: String,
    size: u64,
    entries: Weak<Entries>,
}

impl ImageHandle {
    /// Store id
    #[must_use]
    pub fn id(&self) -> ImageId {
        self.id
    }

    /// URL form of the id
    #[must_use]
    pub fn url(&self) -> String {
        self.id.url()
    }

    /// Original file name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Media type of the image
    #[must_use]
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Size in bytes
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// The image bytes, if the store is still alive
    #[must_use]
    pub fn bytes(&self) -> Option<Arc<[u8]>> {
        self.entries
            .upgrade()
            .and_then(|entries| entries.lock().get(&self.id).cloned())
    }
}

impl Drop for ImageHandle {
    fn drop(&mut self) {
        if let Some(entries) = self.entries.upgrade() {
            if entries.lock().remove(&self.id).is_some() {
                tracing::debug!(image = %self.id, "Image handle revoked");
            }
        }
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("size", &self.size)
            .finish()
    }
}
