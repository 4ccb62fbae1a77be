//! Transcoding engine capability and its lifecycle.
//!
//! The engine is a black box that accepts raw input bytes in a working
//! namespace, runs an ffmpeg-style argument list against them, and exposes the
//! produced bytes for reading back. [`EngineLifecycle`] owns the single engine
//! instance and makes its (possibly slow) load happen exactly once.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use movshift_core::engine::{EngineConfig, EngineLifecycle, FfmpegEngine};
//!
//! let lifecycle = Arc::new(EngineLifecycle::new(FfmpegEngine::new(EngineConfig::default())));
//! lifecycle.ensure_ready().await?;
//! // A second call returns immediately.
//! lifecycle.ensure_ready().await?;
//! ```

mod config;
mod error;
mod ffmpeg;
mod lifecycle;
mod profile;
mod traits;

pub use config::EngineConfig;
pub use error::EngineError;
pub use ffmpeg::FfmpegEngine;
pub use lifecycle::{EngineLifecycle, EngineState};
pub use profile::EncodeProfile;
pub use traits::{no_progress, ProgressFn, TranscodeEngine};
