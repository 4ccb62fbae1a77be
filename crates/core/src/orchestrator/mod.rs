//! Batch conversion orchestrator.
//!
//! Drives one batch at a time through the engine:
//! - **LoadingEngine**: the engine is loaded once, shared by every later run
//! - **Converting**: items are converted strictly in order, one at a time,
//!   and each result is downloaded before the next item starts
//! - **Completed** / **Failed**: the first failure aborts the rest of the batch;
//!   files already downloaded stay downloaded

mod config;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use runner::BatchOrchestrator;
pub use types::{
    BatchEvent, BatchSnapshot, ConversionCause, ConversionError, ItemView, OrchestratorError,
    Phase,
};
