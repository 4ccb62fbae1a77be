//! Types for batches and their conversion results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// Read-only handle to a file's original bytes, owned by the host.
#[derive(Debug, Clone)]
pub enum SourceHandle {
    /// A file on disk, read lazily when its turn comes.
    Path(PathBuf),
    /// Bytes already in memory (e.g. handed over by a drop zone).
    Memory(Arc<[u8]>),
}

impl SourceHandle {
    /// Creates a handle for bytes held in memory.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Memory(Arc::from(bytes.into()))
    }

    /// Reads the full contents. In-memory bytes are borrowed, not copied.
    pub async fn read(&self) -> std::io::Result<Cow<'_, [u8]>> {
        match self {
            Self::Path(path) => tokio::fs::read(path).await.map(Cow::Owned),
            Self::Memory(bytes) => Ok(Cow::Borrowed(&bytes[..])),
        }
    }
}

/// A file as supplied by the user, before intake filtering.
#[derive(Debug, Clone)]
pub struct RawFile {
    /// Original file name, used for matching and display.
    pub name: String,
    /// Where the bytes come from.
    pub source: SourceHandle,
}

impl RawFile {
    /// Creates a raw file backed by a path on disk. The name is the path's final component.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self {
            name,
            source: SourceHandle::Path(path.to_path_buf()),
        }
    }

    /// Creates a raw file backed by in-memory bytes.
    pub fn in_memory(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            source: SourceHandle::from_bytes(bytes),
        }
    }
}

/// Status of a single item. Starts `Pending`; `Done` and `Failed` are terminal for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    Converting,
    Done,
    Failed,
}

/// One accepted file in a batch.
#[derive(Debug, Clone)]
pub struct BatchItem {
    /// Position in the batch (0-based).
    pub index: usize,
    /// Original file name.
    pub display_name: String,
    /// Name of the converted file.
    pub target_name: String,
    /// Original bytes.
    pub source: SourceHandle,
    /// Current status.
    pub status: ItemStatus,
}

/// Ordered set of files submitted together.
///
/// Membership is fixed at creation; only item statuses change afterwards.
#[derive(Debug, Clone)]
pub struct Batch {
    id: Uuid,
    created_at: DateTime<Utc>,
    items: Vec<BatchItem>,
}

impl Batch {
    pub(crate) fn new(items: Vec<BatchItem>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            items,
        }
    }

    /// Unique id of this batch.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// When the batch was accepted.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn items(&self) -> &[BatchItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn set_status(&mut self, index: usize, status: ItemStatus) {
        if let Some(item) = self.items.get_mut(index) {
            item.status = status;
        }
    }

    /// Puts every item back to `Pending` before a (re)run.
    pub(crate) fn reset_statuses(&mut self) {
        for item in &mut self.items {
            item.status = ItemStatus::Pending;
        }
    }
}

/// Converted bytes plus their media type.
#[derive(Debug, Clone)]
pub struct Blob {
    bytes: Arc<[u8]>,
    media_type: String,
}

impl Blob {
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            bytes: Arc::from(bytes),
            media_type: media_type.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A produced file ready to be downloaded.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    /// Index of the batch item that produced it.
    pub index: usize,
    /// Name to save the blob under.
    pub target_name: String,
    pub blob: Blob,
}
