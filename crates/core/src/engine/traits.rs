//! Trait definitions for the engine module.

use async_trait::async_trait;
use std::sync::Arc;

use super::error::EngineError;

/// Progress observer receiving a completion ratio in `0.0..=1.0`.
pub type ProgressFn = Arc<dyn Fn(f32) + Send + Sync>;

/// A progress observer that ignores every update.
pub fn no_progress() -> ProgressFn {
    Arc::new(|_| {})
}

/// A transcoding engine with a private working namespace.
///
/// Files are passed in and out by name: write an input, run an argument list
/// that refers to it, then read the named output back.
#[async_trait]
pub trait TranscodeEngine: Send + Sync {
    /// Returns the name of this engine implementation.
    fn name(&self) -> &str;

    /// Loads the engine. May be slow; reports coarse load progress.
    async fn load(&self, progress: ProgressFn) -> Result<(), EngineError>;

    /// Stores `bytes` in the working namespace under `name`.
    async fn write_input(&self, name: &str, bytes: &[u8]) -> Result<(), EngineError>;

    /// Runs the engine with POSIX-style arguments, reporting run progress.
    async fn run(&self, args: &[String], progress: ProgressFn) -> Result<(), EngineError>;

    /// Reads a produced file from the working namespace.
    async fn read_output(&self, name: &str) -> Result<Vec<u8>, EngineError>;

    /// Removes an entry from the working namespace. Missing entries are not an error.
    async fn remove(&self, name: &str) -> Result<(), EngineError>;
}

/// Rejects names that are empty or would leave the working namespace.
pub(crate) fn check_name(name: &str) -> Result<(), EngineError> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(EngineError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_name() {
        assert!(check_name("input_0.mov").is_ok());
        assert!(check_name("").is_err());
        assert!(check_name("..").is_err());
        assert!(check_name("../etc/passwd").is_err());
        assert!(check_name("dir\\file").is_err());
    }

    #[test]
    fn test_no_progress_is_callable() {
        let progress = no_progress();
        progress(0.5);
    }
}
