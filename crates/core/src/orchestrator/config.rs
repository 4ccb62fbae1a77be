//! Orchestrator configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the batch orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Pause after each download before the next item starts (milliseconds).
    /// Some hosts drop back-to-back programmatic downloads.
    #[serde(default = "default_inter_item_delay")]
    pub inter_item_delay_ms: u64,

    /// Capacity of the event channel. Slow subscribers skip missed events.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_inter_item_delay() -> u64 {
    500
}

fn default_event_capacity() -> usize {
    256
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            inter_item_delay_ms: default_inter_item_delay(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl OrchestratorConfig {
    pub fn inter_item_delay(&self) -> Duration {
        Duration::from_millis(self.inter_item_delay_ms)
    }
}
