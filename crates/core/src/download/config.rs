use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for downloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Directory that [`super::DirectoryHost`] saves files into.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Grace delay before a transient reference is released (milliseconds).
    #[serde(default = "default_release_delay")]
    pub release_delay_ms: u64,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("converted")
}

fn default_release_delay() -> u64 {
    100
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            release_delay_ms: default_release_delay(),
        }
    }
}

impl DownloadConfig {
    pub fn release_delay(&self) -> Duration {
        Duration::from_millis(self.release_delay_ms)
    }
}
