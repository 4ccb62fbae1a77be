//! Projection of orchestrator state onto what the user interface shows.

use serde::Serialize;

use crate::batch::ItemStatus;
use crate::orchestrator::{BatchSnapshot, Phase};

/// One line of the file list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemLine {
    pub name: String,
    pub status: &'static str,
}

/// Visible UI state for a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UiView {
    pub drop_zone_label: String,
    pub file_list_visible: bool,
    /// The "convert" control; shown whenever a batch can be (re)started.
    pub controls_visible: bool,
    pub progress_visible: bool,
    pub progress_text: Option<String>,
    pub progress_percent: u8,
    pub result_visible: bool,
    pub result_text: Option<String>,
    pub error: Option<String>,
    pub items: Vec<ItemLine>,
}

pub fn status_label(status: ItemStatus) -> &'static str {
    match status {
        ItemStatus::Pending => "Waiting",
        ItemStatus::Converting => "Converting...",
        ItemStatus::Done => "✓ Done",
        ItemStatus::Failed => "✗ Failed",
    }
}

/// Maps a snapshot to visible state. Pure; call it on every event.
pub fn project(snapshot: &BatchSnapshot) -> UiView {
    let has_batch = !snapshot.items.is_empty();
    let items = snapshot
        .items
        .iter()
        .map(|item| ItemLine {
            name: item.name.clone(),
            status: status_label(item.status),
        })
        .collect();

    let drop_zone_label = if has_batch {
        format!("✓ Files selected: {}", snapshot.items.len())
    } else {
        format!(
            "Drop {} files here or click to choose",
            snapshot.accepted_extension
        )
    };

    let progress_text = match snapshot.phase {
        Phase::LoadingEngine => Some("Loading engine...".to_string()),
        Phase::Converting => snapshot.current.and_then(|index| {
            snapshot.items.get(index).map(|item| {
                format!(
                    "Converting {}/{}: {}",
                    index + 1,
                    snapshot.items.len(),
                    item.name
                )
            })
        }),
        _ => None,
    };

    let completed = snapshot.phase == Phase::Completed;
    let failed = snapshot.phase == Phase::Failed;

    UiView {
        drop_zone_label,
        file_list_visible: has_batch,
        controls_visible: has_batch && matches!(snapshot.phase, Phase::Idle | Phase::Failed),
        progress_visible: snapshot.phase.is_running(),
        progress_text,
        progress_percent: snapshot.progress_percent,
        result_visible: completed,
        result_text: completed.then(|| format!("✓ Converted files: {}", snapshot.converted)),
        error: if failed {
            snapshot.message.clone()
        } else {
            None
        },
        items,
    }
}
