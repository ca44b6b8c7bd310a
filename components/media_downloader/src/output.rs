// components/media_downloader/src/output.rs
//! Classification of the download tool's human-readable output
//!
//! The tool has no structured progress protocol, so everything here is
//! substring matching on its merged stdout/stderr. Keep all of it in this
//! module; the rest of the crate only sees [`OutputLine`].

use serde::Serialize;

/// What a single output line means for the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    /// A media item is being transferred or extracted
    Progress,
    /// A media item was skipped because the archive ledger already has it
    Archived,
    /// A single video is unavailable or private; expected and ignored
    Unavailable,
    /// An error that invalidates the run
    Fatal,
    /// Warnings and post-processing chatter worth showing
    Notice,
    Other,
}

/// One classified, trimmed output line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub text: String,
    pub kind: LineKind,
    /// The line proves at least one item was transferred or already present
    pub started: bool,
}

const ACTIVITY_MARKERS: &[&str] = &["[download]", "[extractaudio]"];
const ARCHIVED_MARKER: &str = "already been recorded in the archive";
const ERROR_MARKER: &str = "error:";
const IGNORED_ERROR_MARKER: &str = "ignore";
const RECOVERABLE_MARKERS: &[&str] = &["video unavailable", "private video"];
const NOTICE_MARKERS: &[&str] = &["warning", "postprocess", "ffmpeg"];

/// Classify one raw output line, `None` for blank lines
pub fn classify_line(raw: &str) -> Option<OutputLine> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }
    let lower = text.to_lowercase();

    let archived = lower.contains(ARCHIVED_MARKER);
    let started = archived || ACTIVITY_MARKERS.iter().any(|m| lower.contains(m));

    let kind = if lower.contains(ERROR_MARKER) && !lower.contains(IGNORED_ERROR_MARKER) {
        if RECOVERABLE_MARKERS.iter().any(|m| lower.contains(m)) {
            LineKind::Unavailable
        } else {
            LineKind::Fatal
        }
    } else if archived {
        LineKind::Archived
    } else if started {
        LineKind::Progress
    } else if NOTICE_MARKERS.iter().any(|m| lower.contains(m)) {
        LineKind::Notice
    } else {
        LineKind::Other
    };

    Some(OutputLine {
        text: text.to_string(),
        kind,
        started,
    })
}
