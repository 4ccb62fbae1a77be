//! Download trigger: hands produced blobs to the host's save-file mechanism.
//!
//! The host works with transient references to blobs. A reference is taken
//! for each download and released after a short grace delay, once the host
//! has started consuming it.

mod config;
mod directory;
mod error;
mod traits;
mod trigger;

pub use config::DownloadConfig;
pub use directory::DirectoryHost;
pub use error::DownloadError;
pub use traits::{DownloadHost, ObjectRef};
pub use trigger::{DownloadTrigger, ReferenceGuard};
