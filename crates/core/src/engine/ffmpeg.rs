//! FFmpeg-backed engine implementation.

use async_trait::async_trait;
use regex_lite::Regex;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::config::EngineConfig;
use super::error::EngineError;
use super::traits::{check_name, ProgressFn, TranscodeEngine};

/// Engine that runs an ffmpeg binary against a working directory.
///
/// The working directory plays the role of the engine's file namespace:
/// inputs are written into it, ffmpeg runs with it as the current directory,
/// and outputs are read back from it.
pub struct FfmpegEngine {
    config: EngineConfig,
    loaded: AtomicBool,
}

impl FfmpegEngine {
    /// Creates a new engine with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            loaded: AtomicBool::new(false),
        }
    }

    fn ensure_loaded(&self) -> Result<(), EngineError> {
        if self.loaded.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(EngineError::NotLoaded)
        }
    }

    fn entry_path(&self, name: &str) -> Result<PathBuf, EngineError> {
        check_name(name)?;
        Ok(self.config.working_dir.join(name))
    }

    fn spawn_error(&self, e: std::io::Error) -> EngineError {
        if e.kind() == ErrorKind::NotFound {
            EngineError::BinaryNotFound {
                path: self.config.ffmpeg_path.clone(),
            }
        } else {
            EngineError::Io(e)
        }
    }

    /// Builds the full command line: global flags first, then the caller's arguments.
    fn build_command_args(&self, args: &[String]) -> Vec<String> {
        let mut full = vec![
            "-y".to_string(),
            "-nostdin".to_string(),
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            self.config.log_level.clone(),
            "-progress".to_string(),
            "pipe:2".to_string(),
        ];
        full.extend(args.iter().cloned());
        full
    }
}

/// Parses the input duration from a line like `  Duration: 00:01:02.50, start: ...`.
fn parse_duration(re: &Regex, line: &str) -> Option<f64> {
    let caps = re.captures(line)?;
    let hours = caps.get(1)?.as_str().parse::<f64>().ok()?;
    let minutes = caps.get(2)?.as_str().parse::<f64>().ok()?;
    let seconds = caps.get(3)?.as_str().parse::<f64>().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Parses `out_time_ms=` progress lines. ffmpeg reports microseconds despite the name.
fn parse_out_time(re: &Regex, line: &str) -> Option<f64> {
    let caps = re.captures(line)?;
    let micros = caps.get(1)?.as_str().parse::<f64>().ok()?;
    Some(micros / 1_000_000.0)
}

#[async_trait]
impl TranscodeEngine for FfmpegEngine {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn load(&self, progress: ProgressFn) -> Result<(), EngineError> {
        progress(0.0);

        let output = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(EngineError::load_failed(format!(
                "{} -version exited with code {:?}",
                self.config.ffmpeg_path.display(),
                output.status.code()
            )));
        }
        progress(0.5);

        tokio::fs::create_dir_all(&self.config.working_dir).await?;
        self.loaded.store(true, Ordering::Release);
        progress(1.0);

        let version = String::from_utf8_lossy(&output.stdout);
        info!(
            "Loaded {}",
            version.lines().next().unwrap_or("ffmpeg (unknown version)")
        );
        Ok(())
    }

    async fn write_input(&self, name: &str, bytes: &[u8]) -> Result<(), EngineError> {
        self.ensure_loaded()?;
        let path = self.entry_path(name)?;
        tokio::fs::write(&path, bytes).await?;
        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }

    async fn run(&self, args: &[String], progress: ProgressFn) -> Result<(), EngineError> {
        self.ensure_loaded()?;

        let full_args = self.build_command_args(args);
        debug!("Running ffmpeg {:?}", full_args);

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&full_args)
            .current_dir(&self.config.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| EngineError::run_failed("ffmpeg stderr was not captured", None))?;
        let mut reader = BufReader::new(stderr);

        let duration_regex = Regex::new(r"Duration: (\d+):(\d{2}):(\d{2}(?:\.\d+)?)").ok();
        let time_regex = Regex::new(r"out_time_ms=(\d+)").ok();

        let mut duration_secs: Option<f64> = None;
        let mut error_output = String::new();

        // Metadata and file names on stderr need not be UTF-8.
        let mut raw = Vec::new();
        loop {
            raw.clear();
            match reader.read_until(b'\n', &mut raw).await {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!("Stopped reading ffmpeg output: {}", e);
                    break;
                }
            }
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\r', '\n']);

            if line.contains("Error") || line.contains("error") || line.contains("Invalid") {
                error_output.push_str(line);
                error_output.push('\n');
            }

            if duration_secs.is_none() {
                if let Some(ref re) = duration_regex {
                    duration_secs = parse_duration(re, line);
                }
            }

            if let (Some(re), Some(total)) = (time_regex.as_ref(), duration_secs) {
                if let Some(current) = parse_out_time(re, line) {
                    if total > 0.0 {
                        progress((current / total).clamp(0.0, 1.0) as f32);
                    }
                }
            }
        }

        drop(reader);
        let status = child.wait().await?;
        if !status.success() {
            return Err(EngineError::run_failed(
                format!("ffmpeg exited with code: {:?}", status.code()),
                if error_output.is_empty() {
                    None
                } else {
                    Some(error_output)
                },
            ));
        }

        progress(1.0);
        Ok(())
    }

    async fn read_output(&self, name: &str) -> Result<Vec<u8>, EngineError> {
        self.ensure_loaded()?;
        let path = self.entry_path(name)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(EngineError::MissingEntry {
                name: name.to_string(),
            }),
            Err(e) => Err(EngineError::Io(e)),
        }
    }

    async fn remove(&self, name: &str) -> Result<(), EngineError> {
        let path = self.entry_path(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(EngineError::Io(e)),
        }
    }
}
