use std::fmt;

use crate::batch::Blob;

use super::error::DownloadError;

/// Opaque transient reference to a blob registered with a host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef(String);

impl ObjectRef {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Host-side save-file mechanism.
pub trait DownloadHost: Send + Sync {
    /// Registers `blob` and returns a transient reference to it.
    fn create_reference(&self, blob: &Blob) -> Result<ObjectRef, DownloadError>;

    /// Starts saving the referenced blob under `filename`.
    ///
    /// The host must have taken what it needs from the reference by the time
    /// this returns; the bytes may still be written afterwards.
    fn start_download(&self, reference: &ObjectRef, filename: &str) -> Result<(), DownloadError>;

    /// Releases a reference. Unknown references are ignored.
    fn release(&self, reference: &ObjectRef);
}
