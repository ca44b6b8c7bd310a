use media_downloader::DownloadError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("failed to list playlists of {url}")]
    ChannelListing {
        url: String,
        #[source]
        source: DownloadError,
    },

    #[error("playlist listing of {url} is not valid JSON")]
    InvalidListing {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}
