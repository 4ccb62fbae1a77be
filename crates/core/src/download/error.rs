use thiserror::Error;

/// Errors raised by a download host.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The reference was never created or has already been released.
    #[error("object reference not available: {reference}")]
    ReferenceUnavailable { reference: String },

    /// The host refused to start the download.
    #[error("download blocked: {reason}")]
    Blocked { reason: String },

    /// I/O error while saving.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
