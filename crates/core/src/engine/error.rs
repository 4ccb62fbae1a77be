//! Error types for the engine module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a transcoding engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Engine binary not found.
    #[error("engine binary not found at path: {path}")]
    BinaryNotFound { path: PathBuf },

    /// Engine could not be loaded.
    #[error("engine failed to load: {reason}")]
    LoadFailed { reason: String },

    /// An operation was attempted before `load` succeeded.
    #[error("engine is not loaded")]
    NotLoaded,

    /// A working-namespace name would escape the namespace.
    #[error("invalid working file name: {name:?}")]
    InvalidName { name: String },

    /// A working-namespace entry does not exist.
    #[error("no such working file: {name}")]
    MissingEntry { name: String },

    /// The transcode run failed.
    #[error("transcode failed: {reason}")]
    RunFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// I/O error in the working namespace.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Creates a load failure.
    pub fn load_failed(reason: impl Into<String>) -> Self {
        Self::LoadFailed {
            reason: reason.into(),
        }
    }

    /// Creates a run failure with optional captured error output.
    pub fn run_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::RunFailed {
            reason: reason.into(),
            stderr,
        }
    }
}
