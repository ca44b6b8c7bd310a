use media_downloader::DownloadError;
use playlist_resolver::ResolveError;
use post_processor::PostProcessError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("download tool unavailable")]
    Download(#[from] DownloadError),

    #[error("could not set up post-processing")]
    PostProcess(#[from] PostProcessError),

    #[error("could not resolve playlists")]
    Resolve(#[from] ResolveError),
}
