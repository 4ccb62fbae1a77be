//! Logs orchestrator events as the batch progresses.

use std::sync::Weak;

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, info, warn};

use movshift_core::{project, BatchEvent, BatchOrchestrator, TranscodeEngine};

/// Follows the event stream until the orchestrator is dropped.
///
/// Status lines come from the UI projection so the log reads like the
/// progress area of a front end.
pub async fn follow<E: TranscodeEngine + 'static>(
    orchestrator: Weak<BatchOrchestrator<E>>,
    mut events: broadcast::Receiver<BatchEvent>,
) {
    let mut last_line: Option<String> = None;

    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                warn!("Progress reporter skipped {} events", skipped);
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        match &event {
            BatchEvent::EngineLoadProgress { ratio } => {
                debug!("Engine load {:.0}%", ratio * 100.0);
                continue;
            }
            BatchEvent::ItemProgress { index, ratio } => {
                debug!("Item {} at {:.0}%", index + 1, ratio * 100.0);
                continue;
            }
            BatchEvent::ItemCompleted { target_name, .. } => {
                info!("Converted {}", target_name);
            }
            BatchEvent::IntakeRejected { message } => {
                warn!("{}", message);
            }
            _ => {}
        }

        let Some(strong) = orchestrator.upgrade() else {
            break;
        };
        let view = project(&strong.snapshot().await);
        drop(strong);

        match &event {
            BatchEvent::Completed { .. } => {
                if let Some(result) = &view.result_text {
                    info!("{}", result);
                }
            }
            BatchEvent::Failed { .. } => {
                if let Some(error) = &view.error {
                    error!("{}", error);
                }
            }
            _ => {}
        }

        let line = view
            .progress_text
            .map(|text| format!("[{:>3}%] {}", view.progress_percent, text));
        match &line {
            Some(text) if line != last_line => info!("{}", text),
            _ => {}
        }
        last_line = line;
    }
}
