use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::batch::Blob;

use super::error::DownloadError;
use super::traits::{DownloadHost, ObjectRef};

/// Scoped transient reference.
///
/// Dropping the guard schedules the release after the grace delay on the
/// current tokio runtime, or releases immediately when there is none.
pub struct ReferenceGuard {
    host: Arc<dyn DownloadHost>,
    reference: Option<ObjectRef>,
    grace: Duration,
}

impl ReferenceGuard {
    /// Registers `blob` with `host`.
    pub fn acquire(
        host: Arc<dyn DownloadHost>,
        blob: &Blob,
        grace: Duration,
    ) -> Result<Self, DownloadError> {
        let reference = host.create_reference(blob)?;
        Ok(Self {
            host,
            reference: Some(reference),
            grace,
        })
    }

    pub fn reference(&self) -> Option<&ObjectRef> {
        self.reference.as_ref()
    }
}

impl Drop for ReferenceGuard {
    fn drop(&mut self) {
        let Some(reference) = self.reference.take() else {
            return;
        };
        let host = Arc::clone(&self.host);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let grace = self.grace;
                handle.spawn(async move {
                    tokio::time::sleep(grace).await;
                    host.release(&reference);
                    debug!("Released {}", reference);
                });
            }
            Err(_) => host.release(&reference),
        }
    }
}

/// Fire-and-forget download of produced blobs.
#[derive(Clone)]
pub struct DownloadTrigger {
    host: Arc<dyn DownloadHost>,
    grace: Duration,
}

impl DownloadTrigger {
    pub fn new(host: Arc<dyn DownloadHost>, grace: Duration) -> Self {
        Self { host, grace }
    }

    /// Starts a download of `blob` as `filename`.
    ///
    /// Host failures (e.g. a blocked download) are logged and not reported
    /// to the caller.
    pub fn trigger(&self, blob: &Blob, filename: &str) {
        let guard = match ReferenceGuard::acquire(Arc::clone(&self.host), blob, self.grace) {
            Ok(guard) => guard,
            Err(e) => {
                warn!("Could not create reference for {}: {}", filename, e);
                return;
            }
        };

        if let Some(reference) = guard.reference() {
            match self.host.start_download(reference, filename) {
                Ok(()) => debug!("Download of {} started via {}", filename, reference),
                Err(e) => warn!("Download of {} did not start: {}", filename, e),
            }
        }
    }
}
