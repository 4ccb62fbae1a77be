//! Configuration for the ffmpeg-backed engine.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for [`super::FfmpegEngine`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Path to the ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Directory used as the engine's working namespace.
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,

    /// FFmpeg log level. Progress needs at least `info` so the input duration
    /// is printed.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_working_dir() -> PathBuf {
    std::env::temp_dir().join("movshift-engine")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            working_dir: default_working_dir(),
            log_level: default_log_level(),
        }
    }
}

impl EngineConfig {
    /// Sets the ffmpeg binary path.
    pub fn with_ffmpeg_path(mut self, path: PathBuf) -> Self {
        self.ffmpeg_path = path;
        self
    }

    /// Sets the working directory.
    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = dir;
        self
    }
}
