// components/media_downloader/src/outcome.rs
use crate::output::{LineKind, OutputLine};
use std::collections::VecDeque;

/// How many error lines are kept for the failure log
pub const KEPT_ERROR_LINES: usize = 5;

/// Result of one download invocation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DownloadOutcome {
    /// At least one item transferred or was already in the archive ledger
    pub started: bool,
    pub fatal_error: bool,
    pub exit_code: i32,
    /// The last few fatal error lines, oldest first
    pub error_lines: Vec<String>,
}

impl DownloadOutcome {
    /// `exit_code == 0 || (started && !fatal_error)`
    ///
    /// A nonzero exit with nothing started is a failure even without a fatal
    /// line.
    pub fn is_success(&self) -> bool {
        self.exit_code == 0 || (self.started && !self.fatal_error)
    }
}

/// Folds classified output lines into a [`DownloadOutcome`]
#[derive(Debug, Default)]
pub struct OutcomeTracker {
    started: bool,
    fatal_error: bool,
    error_lines: VecDeque<String>,
}

impl OutcomeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, line: &OutputLine) {
        self.started |= line.started;
        if line.kind == LineKind::Fatal {
            self.fatal_error = true;
            self.keep_error(&line.text);
        }
    }

    fn keep_error(&mut self, text: &str) {
        if self.error_lines.len() == KEPT_ERROR_LINES {
            self.error_lines.pop_front();
        }
        self.error_lines.push_back(text.to_string());
    }

    pub fn finish(self, exit_code: i32) -> DownloadOutcome {
        DownloadOutcome {
            started: self.started,
            fatal_error: self.fatal_error,
            exit_code,
            error_lines: self.error_lines.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::classify_line;
    use rstest::rstest;

    fn outcome(exit_code: i32, started: bool, fatal_error: bool) -> DownloadOutcome {
        DownloadOutcome {
            started,
            fatal_error,
            exit_code,
            error_lines: Vec::new(),
        }
    }

    #[rstest]
    #[case::skipped_items_exit_nonzero(1, true, false, true)]
    #[case::empty_playlist(0, false, false, true)]
    #[case::nothing_started_and_fatal(1, false, true, false)]
    #[case::started_then_fatal(1, true, true, false)]
    #[case::clean_exit_wins_over_fatal_line(0, true, true, true)]
    fn success_predicate(
        #[case] exit_code: i32,
        #[case] started: bool,
        #[case] fatal_error: bool,
        #[case] expected: bool,
    ) {
        assert_eq!(outcome(exit_code, started, fatal_error).is_success(), expected);
    }

    /// Nonzero exit, nothing started, no fatal line: counts as a failure.
    /// Changing this would silently mark broken runs complete.
    #[test]
    fn nonzero_exit_without_activity_is_failure() {
        assert!(!outcome(1, false, false).is_success());
        assert!(!outcome(-1, false, false).is_success());
    }

    #[test]
    fn tracker_folds_lines() {
        let mut tracker = OutcomeTracker::new();
        for raw in [
            "[youtube:tab] Downloading playlist",
            "ERROR: [youtube] a1: Video unavailable",
            "[download] Destination: Song.webm",
            "WARNING: slow connection",
        ] {
            tracker.observe(&classify_line(raw).unwrap());
        }

        let outcome = tracker.finish(1);
        assert!(outcome.started);
        assert!(!outcome.fatal_error);
        assert!(outcome.error_lines.is_empty());
        assert!(outcome.is_success());
    }

    #[test]
    fn tracker_keeps_only_the_last_errors() {
        let mut tracker = OutcomeTracker::new();
        for n in 0..8 {
            tracker.observe(&classify_line(&format!("ERROR: failure {n}")).unwrap());
        }

        let outcome = tracker.finish(1);
        assert!(outcome.fatal_error);
        assert_eq!(outcome.error_lines.len(), KEPT_ERROR_LINES);
        assert_eq!(outcome.error_lines[0], "ERROR: failure 3");
        assert_eq!(outcome.error_lines[4], "ERROR: failure 7");
        assert!(!outcome.is_success());
    }
}
