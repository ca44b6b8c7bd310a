// components/media_downloader/src/lib.rs
mod archive;
mod invocation;
mod outcome;
mod output;
mod types;
mod utils;
mod ytdlp;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

use playlist_primitives::PlaylistDescriptor;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use sync_settings::Settings;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub use archive::{archive_stats, clear_archives, ArchiveStats};
pub use invocation::{
    channel_listing_args, download_args, playlist_info_args, ARCHIVE_FILE_NAME, OUTPUT_TEMPLATE,
};
pub use outcome::{DownloadOutcome, OutcomeTracker, KEPT_ERROR_LINES};
pub use output::{classify_line, LineKind, OutputLine};
pub use types::DownloadError;
pub use utils::{forbidden_chars, playlist_dir, sanitize_filename, MAX_FILENAME_CHARS};
pub use ytdlp::{Downloader, OutputStream, YtDlp};

/// Runs one download invocation per playlist
pub struct DownloadRunner {
    settings: Arc<Settings>,
    downloader: Arc<dyn Downloader>,
}

impl fmt::Debug for DownloadRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadRunner")
            .field("program", &self.downloader.program())
            .field("root", &self.settings.root_path)
            .finish()
    }
}

impl DownloadRunner {
    /// Create a runner backed by the configured download tool
    pub async fn new(settings: Arc<Settings>) -> Result<Self, DownloadError> {
        let tool = YtDlp::new(settings.downloader_program());
        Self::new_with_downloader(settings, Arc::new(tool)).await
    }

    /// Create a runner with a specific downloader implementation
    pub async fn new_with_downloader(
        settings: Arc<Settings>,
        downloader: Arc<dyn Downloader>,
    ) -> Result<Self, DownloadError> {
        downloader.check_available().await?;
        Ok(Self {
            settings,
            downloader,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Shared handle for metadata queries made by other components
    pub fn downloader(&self) -> Arc<dyn Downloader> {
        Arc::clone(&self.downloader)
    }

    /// Directory the playlist's files land in
    pub fn destination(&self, descriptor: &PlaylistDescriptor) -> PathBuf {
        playlist_dir(&self.settings, descriptor)
    }

    pub async fn run(&self, descriptor: &PlaylistDescriptor) -> Result<DownloadOutcome, DownloadError> {
        self.run_with(descriptor, |_| {}).await
    }

    /// Download a playlist, handing every classified output line to `on_line`
    ///
    /// Never retries. An `Err` means the tool could not be run at all; a
    /// tool run that went wrong is an `Ok` outcome that is not a success.
    pub async fn run_with<F>(
        &self,
        descriptor: &PlaylistDescriptor,
        on_line: F,
    ) -> Result<DownloadOutcome, DownloadError>
    where
        F: FnMut(&OutputLine) + Send,
    {
        self.run_abortable(descriptor, &CancellationToken::new(), on_line)
            .await
    }

    /// Like [`run_with`](Self::run_with), but kills the tool as soon as
    /// `abort` is cancelled and returns [`DownloadError::Aborted`]
    pub async fn run_abortable<F>(
        &self,
        descriptor: &PlaylistDescriptor,
        abort: &CancellationToken,
        mut on_line: F,
    ) -> Result<DownloadOutcome, DownloadError>
    where
        F: FnMut(&OutputLine) + Send,
    {
        let destination = self.destination(descriptor);
        tokio::fs::create_dir_all(&destination).await?;
        info!("Downloading '{}' to {}", descriptor.title, destination.display());

        let args = download_args(&self.settings, &descriptor.url, &destination);
        let mut stream = self.downloader.spawn(&args).await?;

        let mut tracker = OutcomeTracker::new();
        loop {
            let next = tokio::select! {
                biased;
                _ = abort.cancelled() => {
                    warn!("Aborting download of '{}'", descriptor.title);
                    stream.kill().await?;
                    return Err(DownloadError::Aborted);
                }
                next = stream.next_line() => next,
            };
            let Some(raw) = next else {
                break;
            };
            let Some(line) = classify_line(&raw) else {
                continue;
            };
            log_line(&line);
            tracker.observe(&line);
            on_line(&line);
        }

        let outcome = tracker.finish(stream.wait().await?);
        if outcome.is_success() {
            info!(
                "Finished '{}' (exit code {})",
                descriptor.title, outcome.exit_code
            );
        } else {
            error!(
                "Download of '{}' failed with exit code {}",
                descriptor.title, outcome.exit_code
            );
            for line in &outcome.error_lines {
                error!("  {line}");
            }
        }
        Ok(outcome)
    }

    /// First line of the tool's `--version` output
    pub async fn tool_version(&self) -> Result<String, DownloadError> {
        let stdout = self.downloader.capture(&["--version".to_string()]).await?;
        Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
    }
}

fn log_line(line: &OutputLine) {
    match line.kind {
        LineKind::Fatal => error!("{}", line.text),
        LineKind::Unavailable => warn!("Skipping unavailable item: {}", line.text),
        LineKind::Notice => info!("{}", line.text),
        LineKind::Progress | LineKind::Archived | LineKind::Other => debug!("{}", line.text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::TempDir;
    use testing::ScriptedDownloader;

    const URL: &str = "https://music.youtube.com/playlist?list=PLtest";

    fn settings(dir: &TempDir) -> Arc<Settings> {
        Arc::new(Settings::with_root(dir.path()))
    }

    fn playlist() -> PlaylistDescriptor {
        PlaylistDescriptor::new("PLtest", "Road Trip", URL)
    }

    #[tokio::test]
    async fn runner_requires_available_tool() {
        let dir = TempDir::new().unwrap();
        let runner =
            DownloadRunner::new_with_downloader(settings(&dir), ScriptedDownloader::unavailable().into_arc())
                .await;

        assert_matches!(runner, Err(DownloadError::DependencyNotFound(_)));
    }

    #[tokio::test]
    async fn runner_debug_names_the_tool() {
        let dir = TempDir::new().unwrap();
        let runner = DownloadRunner::new_with_downloader(settings(&dir), ScriptedDownloader::new().into_arc())
            .await
            .unwrap();

        assert!(format!("{runner:?}").contains("scripted-yt-dlp"));
    }

    #[tokio::test]
    async fn aborted_run_kills_the_tool() {
        let dir = TempDir::new().unwrap();
        let tool = ScriptedDownloader::new()
            .with_download(URL, ["[download] Destination: Song.webm"], 0)
            .into_arc();
        let runner = DownloadRunner::new_with_downloader(settings(&dir), tool.clone())
            .await
            .unwrap();
        let abort = CancellationToken::new();
        abort.cancel();

        let mut seen = 0;
        let result = runner
            .run_abortable(&playlist(), &abort, |_| seen += 1)
            .await;

        assert_matches!(result, Err(DownloadError::Aborted));
        assert_eq!(seen, 0);
        assert_eq!(tool.killed(), 1);
    }

    #[tokio::test]
    async fn run_creates_destination_and_reports_success() {
        let dir = TempDir::new().unwrap();
        let tool = ScriptedDownloader::new()
            .with_download(
                URL,
                [
                    "[youtube:tab] Downloading playlist",
                    "[download] Destination: Song.webm",
                    "",
                    "[ExtractAudio] Destination: Song.mp3",
                ],
                0,
            )
            .into_arc();
        let runner = DownloadRunner::new_with_downloader(settings(&dir), tool.clone())
            .await
            .unwrap();

        let mut seen = Vec::new();
        let outcome = runner
            .run_with(&playlist(), |line| seen.push(line.kind))
            .await
            .unwrap();

        assert!(outcome.is_success());
        assert!(outcome.started);
        assert_eq!(seen, vec![LineKind::Other, LineKind::Progress, LineKind::Progress]);
        assert!(dir.path().join("Road Trip").is_dir());
        assert_eq!(tool.downloaded_urls(), vec![URL.to_string()]);
    }

    #[tokio::test]
    async fn unavailable_items_do_not_fail_the_playlist() {
        let dir = TempDir::new().unwrap();
        let tool = ScriptedDownloader::new()
            .with_download(
                URL,
                [
                    "ERROR: [youtube] x1: Private video",
                    "[download] Song has already been recorded in the archive",
                ],
                1,
            )
            .into_arc();
        let runner = DownloadRunner::new_with_downloader(settings(&dir), tool)
            .await
            .unwrap();

        let outcome = runner.run(&playlist()).await.unwrap();
        assert!(outcome.is_success());
        assert!(!outcome.fatal_error);
        assert!(outcome.error_lines.is_empty());
    }

    #[tokio::test]
    async fn fatal_error_without_activity_fails() {
        let dir = TempDir::new().unwrap();
        let tool = ScriptedDownloader::new()
            .with_download(URL, ["ERROR: Unable to download API page: HTTP Error 429"], 1)
            .into_arc();
        let runner = DownloadRunner::new_with_downloader(settings(&dir), tool)
            .await
            .unwrap();

        let outcome = runner.run(&playlist()).await.unwrap();
        assert!(!outcome.is_success());
        assert!(outcome.fatal_error);
        assert_eq!(
            outcome.error_lines,
            vec!["ERROR: Unable to download API page: HTTP Error 429"]
        );
    }

    #[tokio::test]
    async fn tool_version_is_first_line() {
        let dir = TempDir::new().unwrap();
        let tool = ScriptedDownloader::new()
            .with_capture("--version", "2024.08.06\n")
            .into_arc();
        let runner = DownloadRunner::new_with_downloader(settings(&dir), tool)
            .await
            .unwrap();

        assert_eq!(runner.tool_version().await.unwrap(), "2024.08.06");
    }
}
