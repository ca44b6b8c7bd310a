use crate::report::SyncReport;
use media_downloader::LineKind;
use playlist_primitives::PlaylistId;
use post_processor::PostProcessReport;
use serde::Serialize;
use tokio::sync::broadcast;

/// Live feedback while a run is in progress
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum SyncProgress {
    RunStarted {
        total: usize,
        already_completed: usize,
        pending: usize,
    },
    ItemStarted {
        /// 1-based position among the pending items
        index: usize,
        count: usize,
        id: PlaylistId,
        title: String,
    },
    Output {
        id: PlaylistId,
        kind: LineKind,
        text: String,
    },
    ItemCompleted {
        id: PlaylistId,
        title: String,
        post_process: PostProcessReport,
    },
    ItemFailed {
        id: PlaylistId,
        title: String,
        error: String,
    },
    Cancelled {
        remaining: usize,
    },
    RunFinished(SyncReport),
}

/// Buffered events per subscriber before slow readers start lagging
pub const PROGRESS_CAPACITY: usize = 256;

pub(crate) fn emit(tx: &broadcast::Sender<SyncProgress>, event: SyncProgress) {
    // Nobody listening is fine
    let _ = tx.send(event);
}
