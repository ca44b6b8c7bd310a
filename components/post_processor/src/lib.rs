//! Finishing steps for a downloaded playlist directory
//!
//! Three independent steps run after a successful download: the cover image,
//! transcoding of leftover `.opus` audio and caption-to-lyrics conversion.
//! Every step logs its own failures and none of them can fail the playlist;
//! the outcome is summarised in a [`PostProcessReport`].

mod cover;
mod error;
mod lyrics;
mod transcode;

use playlist_primitives::PlaylistDescriptor;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use sync_settings::Settings;
use tracing::{debug, info};

pub use cover::{
    existing_cover, infer_extension, write_cover, CoverStatus, FetchedImage, HttpImageFetcher,
    ImageFetcher, FETCH_TIMEOUT,
};
pub use error::PostProcessError;
pub use lyrics::{convert_captions, vtt_to_lrc, LyricsSummary};
pub use transcode::{transcode_dir, FfmpegTranscoder, TranscodeSummary, Transcoder};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostProcessReport {
    pub cover: CoverStatus,
    /// `None` when transcoding does not apply to the configured format
    pub transcoding: Option<TranscodeSummary>,
    /// `None` when captions were not requested
    pub lyrics: Option<LyricsSummary>,
}

impl PostProcessReport {
    pub fn has_failures(&self) -> bool {
        matches!(self.cover, CoverStatus::AllFailed)
            || self.transcoding.is_some_and(|t| t.failed > 0)
            || self.lyrics.is_some_and(|l| l.failed > 0)
    }
}

pub struct PostProcessor {
    settings: Arc<Settings>,
    fetcher: Arc<dyn ImageFetcher>,
    transcoder: Arc<dyn Transcoder>,
}

impl PostProcessor {
    /// Post-processor using HTTP for covers and the configured transcoder
    pub fn new(settings: Arc<Settings>) -> Result<Self, PostProcessError> {
        let fetcher = Arc::new(HttpImageFetcher::new()?);
        let transcoder = Arc::new(FfmpegTranscoder::new(settings.transcoder_program()));
        Ok(Self::with_parts(settings, fetcher, transcoder))
    }

    pub fn with_parts(
        settings: Arc<Settings>,
        fetcher: Arc<dyn ImageFetcher>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Self {
        Self {
            settings,
            fetcher,
            transcoder,
        }
    }

    pub async fn process(&self, descriptor: &PlaylistDescriptor, dir: &Path) -> PostProcessReport {
        debug!("Post-processing {}", dir.display());

        let cover = write_cover(self.fetcher.as_ref(), descriptor, dir).await;

        let transcoding = if self.settings.audio_format == transcode::SOURCE_EXTENSION {
            None
        } else {
            Some(transcode_dir(self.transcoder.as_ref(), dir).await)
        };

        let lyrics = if self.settings.download_lyrics || self.settings.lyrics_only {
            Some(convert_captions(dir).await)
        } else {
            None
        };

        let report = PostProcessReport {
            cover,
            transcoding,
            lyrics,
        };
        if report.has_failures() {
            info!("Post-processing of '{}' finished with failures", descriptor.title);
        }
        report
    }
}

/// Regular files in `dir` with the given extension, sorted by name
pub(crate) async fn files_with_extension(dir: &Path, ext: &str) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|e| e == ext) && entry.file_type().await?.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
