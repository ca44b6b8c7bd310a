use chrono::{DateTime, Utc};
use playlist_primitives::{PlaylistDescriptor, PlaylistId};
use post_processor::PostProcessReport;
use serde::Serialize;

/// Per-playlist state within one run
///
/// `Completed` and `Failed` are terminal. Items left `Pending` were never
/// started, which only happens when the run is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemReport {
    pub id: PlaylistId,
    pub title: String,
    pub status: ItemStatus,
    /// Failure reason for failed items
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_process: Option<PostProcessReport>,
}

impl ItemReport {
    pub(crate) fn pending(descriptor: &PlaylistDescriptor) -> Self {
        Self {
            id: descriptor.id.clone(),
            title: descriptor.title.clone(),
            status: ItemStatus::Pending,
            error: None,
            post_process: None,
        }
    }
}

/// Aggregate result of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncReport {
    pub total: usize,
    pub already_completed: usize,
    pub newly_completed: usize,
    pub failed: usize,
    /// The run stopped early on request
    pub cancelled: bool,
    /// Completions that could not be written to the state file
    pub persist_failures: usize,
    /// Pending items in processing order
    pub items: Vec<ItemReport>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SyncReport {
    pub(crate) fn begin(total: usize, already_completed: usize, pending: &[PlaylistDescriptor]) -> Self {
        let now = Utc::now();
        Self {
            total,
            already_completed,
            newly_completed: 0,
            failed: 0,
            cancelled: false,
            persist_failures: 0,
            items: pending.iter().map(ItemReport::pending).collect(),
            started_at: now,
            finished_at: now,
        }
    }

    /// Items that were never started
    pub fn skipped(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.status == ItemStatus::Pending)
            .count()
    }
}
