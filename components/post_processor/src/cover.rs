use crate::error::PostProcessError;
use async_trait::async_trait;
use playlist_primitives::PlaylistDescriptor;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

pub const COVER_STEM: &str = "cover";
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Downloaded image bytes plus the server's content type
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, PostProcessError>;
}

pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new() -> Result<Self, PostProcessError> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(PostProcessError::Client)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, PostProcessError> {
        let fetch_err = |source| PostProcessError::Fetch {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(fetch_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(PostProcessError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(fetch_err)?;

        Ok(FetchedImage {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

/// What happened to the playlist cover
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "path")]
pub enum CoverStatus {
    Written(PathBuf),
    AlreadyPresent(PathBuf),
    NoThumbnails,
    AllFailed,
}

/// File extension for an image, from its content type or else its URL
pub fn infer_extension(content_type: Option<&str>, url: &str) -> &'static str {
    let content_type = content_type.unwrap_or_default().to_ascii_lowercase();
    let path = url
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.contains("jpeg") || content_type.contains("jpg") {
        "jpg"
    } else if content_type.contains("png") {
        "png"
    } else if content_type.contains("webp") {
        "webp"
    } else if path.ends_with(".png") {
        "png"
    } else if path.ends_with(".webp") {
        "webp"
    } else {
        "jpg"
    }
}

/// An existing `cover.*` file in `dir`, if any
pub fn existing_cover(dir: &Path) -> Option<PathBuf> {
    std::fs::read_dir(dir)
        .ok()?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .find(|path| {
            path.is_file() && path.file_stem().is_some_and(|stem| stem == COVER_STEM)
        })
}

/// Write the best available thumbnail as `cover.<ext>`
///
/// Thumbnails are tried from the highest resolution down; a failed fetch or
/// write moves on to the next one.
pub async fn write_cover(
    fetcher: &dyn ImageFetcher,
    descriptor: &PlaylistDescriptor,
    dir: &Path,
) -> CoverStatus {
    if let Some(path) = existing_cover(dir) {
        return CoverStatus::AlreadyPresent(path);
    }
    if descriptor.thumbnails.is_empty() {
        warn!("No thumbnails found for playlist: {}", descriptor.title);
        return CoverStatus::NoThumbnails;
    }

    for thumbnail in descriptor.thumbnails_by_resolution() {
        if thumbnail.url.is_empty() {
            continue;
        }
        info!("Downloading cover image from: {}", thumbnail.url);

        let image = match fetcher.fetch(&thumbnail.url).await {
            Ok(image) => image,
            Err(e) => {
                warn!("Failed to download thumbnail: {e}");
                continue;
            }
        };

        let ext = infer_extension(image.content_type.as_deref(), &thumbnail.url);
        let path = dir.join(format!("{COVER_STEM}.{ext}"));
        match save_atomically(&path, &image.bytes).await {
            Ok(()) => {
                info!("Saved cover image: {}", path.display());
                return CoverStatus::Written(path);
            }
            Err(e) => warn!("Error saving cover image {}: {e}", path.display()),
        }
    }

    warn!("Failed to download any cover image for {}", descriptor.title);
    CoverStatus::AllFailed
}

/// Write to `<path>.part` and rename, so `path` never holds a truncated image
async fn save_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut partial = path.as_os_str().to_owned();
    partial.push(".part");
    let partial = PathBuf::from(partial);

    let written = match tokio::fs::write(&partial, bytes).await {
        Ok(()) => tokio::fs::rename(&partial, path).await,
        Err(e) => Err(e),
    };
    if written.is_err() {
        let _ = tokio::fs::remove_file(&partial).await;
    }
    written
}

#[cfg(test)]
pub(crate) mod stub {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// Serves canned images; unknown URLs fail with a 404
    #[derive(Default)]
    pub struct ImageFetcherStub {
        images: HashMap<String, FetchedImage>,
        pub requested: Mutex<Vec<String>>,
    }

    impl ImageFetcherStub {
        pub fn with_image(mut self, url: &str, content_type: Option<&str>, bytes: &[u8]) -> Self {
            self.images.insert(
                url.to_string(),
                FetchedImage {
                    bytes: bytes.to_vec(),
                    content_type: content_type.map(str::to_string),
                },
            );
            self
        }
    }

    #[async_trait]
    impl ImageFetcher for ImageFetcherStub {
        async fn fetch(&self, url: &str) -> Result<FetchedImage, PostProcessError> {
            self.requested.lock().push(url.to_string());
            self.images
                .get(url)
                .cloned()
                .ok_or_else(|| PostProcessError::HttpStatus {
                    url: url.to_string(),
                    status: 404,
                })
        }
    }
}
