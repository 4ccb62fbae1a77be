use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::batch::Blob;

use super::error::DownloadError;
use super::traits::{DownloadHost, ObjectRef};

/// Download host that saves files into a directory.
///
/// References are `blob:<uuid>` keys into an in-memory registry. Starting a
/// download resolves the blob immediately and writes it on a background task;
/// call [`flush`](Self::flush) to wait for pending writes.
pub struct DirectoryHost {
    output_dir: PathBuf,
    objects: Mutex<HashMap<ObjectRef, Blob>>,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl DirectoryHost {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            objects: Mutex::new(HashMap::new()),
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Number of references not yet released.
    pub fn live_references(&self) -> usize {
        lock(&self.objects).len()
    }

    /// Waits for every started download to finish writing.
    pub async fn flush(&self) {
        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *lock(&self.pending));
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Download task did not complete: {}", e);
            }
        }
    }
}

impl DownloadHost for DirectoryHost {
    fn create_reference(&self, blob: &Blob) -> Result<ObjectRef, DownloadError> {
        let reference = ObjectRef::new(format!("blob:{}", Uuid::new_v4()));
        lock(&self.objects).insert(reference.clone(), blob.clone());
        Ok(reference)
    }

    fn start_download(&self, reference: &ObjectRef, filename: &str) -> Result<(), DownloadError> {
        let blob = lock(&self.objects).get(reference).cloned().ok_or_else(|| {
            DownloadError::ReferenceUnavailable {
                reference: reference.to_string(),
            }
        })?;

        // Never let a suggested name point outside the output directory.
        let file_name = Path::new(filename)
            .file_name()
            .ok_or_else(|| DownloadError::Blocked {
                reason: format!("unusable file name {:?}", filename),
            })?;
        let path = self.output_dir.join(file_name);

        let handle = tokio::runtime::Handle::try_current().map_err(|_| DownloadError::Blocked {
            reason: "no async runtime to write on".to_string(),
        })?;

        let output_dir = self.output_dir.clone();
        let task = handle.spawn(async move {
            let result = async {
                tokio::fs::create_dir_all(&output_dir).await?;
                tokio::fs::write(&path, blob.as_bytes()).await
            }
            .await;
            match result {
                Ok(()) => info!("Saved {} ({} bytes)", path.display(), blob.len()),
                Err(e) => warn!("Failed to save {}: {}", path.display(), e),
            }
        });
        lock(&self.pending).push(task);
        Ok(())
    }

    fn release(&self, reference: &ObjectRef) {
        lock(&self.objects).remove(reference);
    }
}
