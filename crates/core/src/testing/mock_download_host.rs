//! Mock download host for testing.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::batch::Blob;
use crate::download::{DownloadError, DownloadHost, ObjectRef};

/// A download the host was asked to start.
#[derive(Debug, Clone)]
pub struct RecordedDownload {
    pub reference: ObjectRef,
    pub filename: String,
    pub size: usize,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default)]
struct HostState {
    next_id: u64,
    live: HashMap<ObjectRef, Blob>,
    downloads: Vec<RecordedDownload>,
    released: Vec<ObjectRef>,
    blocked: bool,
}

/// Mock implementation of the DownloadHost trait.
///
/// Synchronous like the trait itself; records every download and release so
/// tests can assert on order and on reference lifetimes.
#[derive(Debug, Default)]
pub struct MockDownloadHost {
    state: Mutex<HostState>,
}

impl MockDownloadHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Simulate a host that refuses downloads (e.g. a blocked popup).
    pub fn set_blocked(&self, blocked: bool) {
        self.lock().blocked = blocked;
    }

    pub fn downloads(&self) -> Vec<RecordedDownload> {
        self.lock().downloads.clone()
    }

    /// Filenames of started downloads, in order.
    pub fn filenames(&self) -> Vec<String> {
        self.lock()
            .downloads
            .iter()
            .map(|d| d.filename.clone())
            .collect()
    }

    /// Number of references created and not yet released.
    pub fn live_references(&self) -> usize {
        self.lock().live.len()
    }

    pub fn created_count(&self) -> u64 {
        self.lock().next_id
    }

    pub fn released(&self) -> Vec<ObjectRef> {
        self.lock().released.clone()
    }
}

impl DownloadHost for MockDownloadHost {
    fn create_reference(&self, blob: &Blob) -> Result<ObjectRef, DownloadError> {
        let mut state = self.lock();
        let reference = ObjectRef::new(format!("mock:{}", state.next_id));
        state.next_id += 1;
        state.live.insert(reference.clone(), blob.clone());
        Ok(reference)
    }

    fn start_download(&self, reference: &ObjectRef, filename: &str) -> Result<(), DownloadError> {
        let mut state = self.lock();
        if state.blocked {
            return Err(DownloadError::Blocked {
                reason: "downloads blocked by host".to_string(),
            });
        }

        let blob = state
            .live
            .get(reference)
            .cloned()
            .ok_or_else(|| DownloadError::ReferenceUnavailable {
                reference: reference.to_string(),
            })?;

        state.downloads.push(RecordedDownload {
            reference: reference.clone(),
            filename: filename.to_string(),
            size: blob.len(),
            bytes: blob.as_bytes().to_vec(),
        });
        Ok(())
    }

    fn release(&self, reference: &ObjectRef) {
        let mut state = self.lock();
        if state.live.remove(reference).is_some() {
            state.released.push(reference.clone());
        }
    }
}
