// components/media_downloader/src/archive.rs
use crate::invocation::ARCHIVE_FILE_NAME;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Totals over every archive ledger below a root directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ArchiveStats {
    pub files: usize,
    /// Non-blank ledger lines, one per downloaded media item
    pub entries: usize,
}

fn ledgers(root: &Path) -> impl Iterator<Item = walkdir::DirEntry> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Skipping unreadable entry: {e}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == ARCHIVE_FILE_NAME)
}

pub fn archive_stats(root: &Path) -> ArchiveStats {
    let mut stats = ArchiveStats::default();
    for ledger in ledgers(root) {
        stats.files += 1;
        match std::fs::read_to_string(ledger.path()) {
            Ok(contents) => {
                stats.entries += contents.lines().filter(|l| !l.trim().is_empty()).count()
            }
            Err(e) => warn!("Could not read {}: {e}", ledger.path().display()),
        }
    }
    stats
}

/// Delete every archive ledger below `root`, forcing a full re-check
///
/// Returns how many ledgers were removed.
pub fn clear_archives(root: &Path) -> std::io::Result<usize> {
    let mut removed = 0;
    for ledger in ledgers(root) {
        std::fs::remove_file(ledger.path())?;
        debug!("Removed {}", ledger.path().display());
        removed += 1;
    }
    Ok(removed)
}
