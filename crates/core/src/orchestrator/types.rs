//! Types for the batch orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::batch::ItemStatus;
use crate::engine::EngineError;
use crate::intake::IntakeError;

/// Phase of the orchestrator state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    LoadingEngine,
    Converting,
    Completed,
    Failed,
}

impl Phase {
    /// Whether a run is in progress.
    pub fn is_running(self) -> bool {
        matches!(self, Self::LoadingEngine | Self::Converting)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::LoadingEngine => "loading_engine",
            Self::Converting => "converting",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What went wrong with a single item.
#[derive(Debug, Error)]
pub enum ConversionCause {
    /// The original bytes could not be read.
    #[error("could not read source: {0}")]
    Source(#[source] std::io::Error),

    /// The engine rejected or failed on the input.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// A failed item; the rest of its batch was not attempted.
#[derive(Debug, Error)]
#[error("failed to convert {file_name} (file {} of {total}): {cause}", .index + 1)]
pub struct ConversionError {
    /// Index of the failed item (0-based).
    pub index: usize,
    /// Number of items in the batch.
    pub total: usize,
    /// Original name of the failed file.
    pub file_name: String,
    #[source]
    pub cause: ConversionCause,
}

/// Errors that can occur during orchestration.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// No file of the selection was accepted.
    #[error(transparent)]
    Intake(#[from] IntakeError),

    /// The engine could not be loaded; no item was attempted.
    #[error("could not start the conversion engine: {0}")]
    EngineLoad(#[source] Arc<EngineError>),

    /// An item failed and the batch was aborted.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// Operation not allowed in the current phase.
    #[error("invalid state: expected {expected}, got {actual}")]
    InvalidState { expected: String, actual: String },

    /// `run_batch` was called before any batch was accepted.
    #[error("no batch has been submitted")]
    NoBatch,
}

impl OrchestratorError {
    pub(crate) fn not_while(phase: Phase) -> Self {
        Self::InvalidState {
            expected: "idle, completed or failed".to_string(),
            actual: phase.to_string(),
        }
    }
}

/// Display data for one batch item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemView {
    pub index: usize,
    pub name: String,
    pub target_name: String,
    pub status: ItemStatus,
}

/// Events published while batches are accepted and run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BatchEvent {
    PhaseChanged { phase: Phase },
    BatchLoaded { batch_id: Uuid, items: Vec<ItemView> },
    IntakeRejected { message: String },
    EngineLoadProgress { ratio: f32 },
    ItemStarted { index: usize, total: usize, name: String },
    ItemProgress { index: usize, ratio: f32 },
    ItemCompleted { index: usize, target_name: String },
    Progress { percent: u8 },
    Completed { converted: usize },
    Failed { message: String },
    Reset,
}

/// Point-in-time view of the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSnapshot {
    pub phase: Phase,
    pub accepted_extension: String,
    pub batch_id: Option<Uuid>,
    pub items: Vec<ItemView>,
    /// Index of the item being converted.
    pub current: Option<usize>,
    /// Aggregate progress, `round(done / total * 100)`.
    pub progress_percent: u8,
    /// Results held from the last run.
    pub converted: usize,
    /// Outcome message of the last run.
    pub message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}
