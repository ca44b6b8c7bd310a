//! Turns the configured input into an ordered list of playlists
//!
//! Lookups go through the download tool's metadata queries and are memoised
//! in the [`CompletionStore`], so a playlist is only queried once until the
//! state is reset.

mod error;
mod listing;
mod parse;

use completion_store::CompletionStore;
use listing::{ChannelListing, FlatEntry};
use media_downloader::{channel_listing_args, playlist_info_args, Downloader};
use playlist_primitives::{PlaylistDescriptor, PlaylistId};
use std::path::Path;
use std::sync::Arc;
use sync_settings::{InputMethod, Settings};
use tracing::{debug, error, info, warn};

pub use error::ResolveError;
pub use parse::{extract_id, parse_playlist_file};

pub struct PlaylistResolver {
    settings: Arc<Settings>,
    downloader: Arc<dyn Downloader>,
}

impl PlaylistResolver {
    pub fn new(settings: Arc<Settings>, downloader: Arc<dyn Downloader>) -> Self {
        Self {
            settings,
            downloader,
        }
    }

    /// Resolve the configured input source, in source order
    pub async fn resolve(
        &self,
        store: &mut CompletionStore,
    ) -> Result<Vec<PlaylistDescriptor>, ResolveError> {
        let playlists = match self.settings.input_method {
            InputMethod::Channel => self.from_channel(store).await?,
            InputMethod::File => self.from_file(&self.settings.playlist_file, store).await,
            InputMethod::Urls => self.from_urls(&self.settings.playlist_urls, store).await,
        };
        info!(
            "Resolved {} playlists from {}",
            playlists.len(),
            self.settings.input_method
        );
        Ok(playlists)
    }

    /// Every playlist on the configured channel
    ///
    /// Tries the channel's playlists tab, then the bare channel page; the
    /// first listing with entries wins. Errors only when no listing could
    /// be fetched at all.
    pub async fn from_channel(
        &self,
        store: &mut CompletionStore,
    ) -> Result<Vec<PlaylistDescriptor>, ResolveError> {
        let channel = self.settings.channel_url.trim_end_matches('/');
        let candidates = [format!("{channel}/playlists"), channel.to_string()];

        let mut last_error = None;
        let mut listed = false;
        for url in candidates {
            info!("Fetching playlists from channel: {url}");
            let listing = match self.fetch_listing(&url).await {
                Ok(listing) => listing,
                Err(e) => {
                    warn!("{e}");
                    last_error = Some(e);
                    continue;
                }
            };
            listed = true;

            let (channel_info, playlists) = listing.into_parts();
            if playlists.is_empty() {
                debug!("No playlists listed at {url}");
                continue;
            }

            info!(
                "Found {} playlists from channel: {}",
                channel_info.playlist_count,
                channel_info.display_name()
            );
            if let Err(e) = store.cache_channel_info(channel_info) {
                error!("Could not cache channel info: {e}");
            }
            for playlist in &playlists {
                cache(store, &playlist.id, playlist.clone());
            }
            return Ok(playlists);
        }

        match last_error {
            Some(e) if !listed => Err(e),
            _ => {
                warn!("No playlists found for channel {channel}");
                Ok(Vec::new())
            }
        }
    }

    async fn fetch_listing(&self, url: &str) -> Result<ChannelListing, ResolveError> {
        let stdout = self
            .downloader
            .capture(&channel_listing_args(url))
            .await
            .map_err(|source| ResolveError::ChannelListing {
                url: url.to_string(),
                source,
            })?;
        serde_json::from_str(&stdout).map_err(|source| ResolveError::InvalidListing {
            url: url.to_string(),
            source,
        })
    }

    /// Playlists listed in a playlist file; a missing file resolves to nothing
    pub async fn from_file(
        &self,
        path: &Path,
        store: &mut CompletionStore,
    ) -> Vec<PlaylistDescriptor> {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Playlist file not found: {}", path.display());
                return Vec::new();
            }
            Err(e) => {
                warn!("Could not read playlist file {}: {e}", path.display());
                return Vec::new();
            }
        };

        let urls = parse_playlist_file(&contents);
        info!("Processing {} playlist URLs from file", urls.len());
        self.from_urls(&urls, store).await
    }

    pub async fn from_urls(
        &self,
        urls: &[String],
        store: &mut CompletionStore,
    ) -> Vec<PlaylistDescriptor> {
        let mut playlists = Vec::with_capacity(urls.len());
        for url in urls {
            playlists.push(self.get_playlist_info(url, store).await);
        }
        playlists
    }

    /// Descriptor for one playlist URL, from the cache when possible
    ///
    /// Never fails: when the lookup does not produce a title a
    /// `Playlist_<id>` descriptor is synthesised and cached instead.
    pub async fn get_playlist_info(
        &self,
        url: &str,
        store: &mut CompletionStore,
    ) -> PlaylistDescriptor {
        let id = PlaylistId::new(extract_id(url));
        if let Some(cached) = store.cached_descriptor(&id) {
            debug!("Using cached info for playlist {id}");
            return cached.clone();
        }

        info!("Fetching playlist info for: {url}");
        let descriptor = match self.lookup_title(url).await {
            Some(title) => PlaylistDescriptor::new(id.clone(), title, url),
            None => PlaylistDescriptor::fallback(id.clone(), url),
        };
        cache(store, &id, descriptor.clone());
        descriptor
    }

    async fn lookup_title(&self, url: &str) -> Option<String> {
        let stdout = match self.downloader.capture(&playlist_info_args(url)).await {
            Ok(stdout) => stdout,
            Err(e) => {
                warn!("Failed to fetch info for {url}: {e}");
                return None;
            }
        };

        let first = stdout.lines().map(str::trim).find(|l| !l.is_empty())?;
        match serde_json::from_str::<FlatEntry>(first) {
            Ok(entry) => entry.title(),
            Err(e) => {
                warn!("Unreadable playlist info for {url}: {e}");
                None
            }
        }
    }
}

fn cache(store: &mut CompletionStore, id: &PlaylistId, descriptor: PlaylistDescriptor) {
    if let Err(e) = store.cache_descriptor(id, descriptor) {
        error!("Could not cache playlist info for {id}: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use media_downloader::testing::ScriptedDownloader;
    use tempfile::TempDir;

    const CHANNEL: &str = "https://www.youtube.com/@artist";

    fn fixture(settings: Settings, tool: ScriptedDownloader) -> (PlaylistResolver, Arc<ScriptedDownloader>) {
        let tool = tool.into_arc();
        (PlaylistResolver::new(Arc::new(settings), tool.clone()), tool)
    }

    fn store(dir: &TempDir) -> CompletionStore {
        CompletionStore::load(dir.path().join("download_state.json"))
    }

    fn info_line(title: &str) -> String {
        format!(r#"{{"id": "v1", "playlist_title": "{title}", "playlist": "{title}"}}"#)
    }

    #[tokio::test]
    async fn playlist_info_is_fetched_once_and_cached() {
        let dir = TempDir::new().unwrap();
        let url = "https://music.youtube.com/playlist?list=PL1";
        let tool = ScriptedDownloader::new().with_capture(url, info_line("Road Trip"));
        let (resolver, tool) = fixture(Settings::with_root(dir.path()), tool);
        let mut store = store(&dir);

        let first = resolver.get_playlist_info(url, &mut store).await;
        let second = resolver.get_playlist_info(url, &mut store).await;

        assert_eq!(first, PlaylistDescriptor::new("PL1", "Road Trip", url));
        assert_eq!(first, second);
        assert_eq!(tool.capture_calls().len(), 1);
        assert!(store.cached_descriptor(&PlaylistId::from("PL1")).is_some());
    }

    #[tokio::test]
    async fn failed_lookup_synthesises_fallback() {
        let dir = TempDir::new().unwrap();
        let url = "https://music.youtube.com/playlist?list=PLgone&si=abc";
        let tool = ScriptedDownloader::new().with_failing_capture(url, "ERROR: not found");
        let (resolver, _) = fixture(Settings::with_root(dir.path()), tool);
        let mut store = store(&dir);

        let descriptor = resolver.get_playlist_info(url, &mut store).await;

        assert_eq!(descriptor.id.as_str(), "PLgone");
        assert_eq!(descriptor.title, "Playlist_PLgone");
        assert_eq!(descriptor.url, url);
        assert_eq!(
            store.cached_descriptor(&PlaylistId::from("PLgone")),
            Some(&descriptor)
        );
    }

    #[tokio::test]
    async fn empty_or_garbled_output_also_falls_back() {
        let dir = TempDir::new().unwrap();
        let tool = ScriptedDownloader::new()
            .with_capture("https://x/playlist?list=PLempty", "\n")
            .with_capture("https://x/playlist?list=PLjunk", "not json");
        let (resolver, _) = fixture(Settings::with_root(dir.path()), tool);
        let mut store = store(&dir);

        for id in ["PLempty", "PLjunk"] {
            let url = format!("https://x/playlist?list={id}");
            let descriptor = resolver.get_playlist_info(&url, &mut store).await;
            assert_eq!(descriptor.title, format!("Playlist_{id}"));
        }
    }

    #[tokio::test]
    async fn file_with_comment_and_blank_line() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("playlists.txt");
        std::fs::write(
            &file,
            "https://music.youtube.com/playlist?list=PLa\n\n# note\n",
        )
        .unwrap();

        let mut settings = Settings::with_root(dir.path());
        settings.input_method = InputMethod::File;
        settings.playlist_file = file;
        let (resolver, _) = fixture(settings, ScriptedDownloader::new());
        let mut store = store(&dir);

        let playlists = resolver.resolve(&mut store).await.unwrap();
        assert_eq!(playlists.len(), 1);
        assert_eq!(playlists[0].id.as_str(), "PLa");
    }

    #[tokio::test]
    async fn missing_file_resolves_to_nothing() {
        let dir = TempDir::new().unwrap();
        let mut settings = Settings::with_root(dir.path());
        settings.input_method = InputMethod::File;
        settings.playlist_file = dir.path().join("missing.txt");
        let (resolver, tool) = fixture(settings, ScriptedDownloader::new());
        let mut store = store(&dir);

        assert!(resolver.resolve(&mut store).await.unwrap().is_empty());
        assert!(tool.capture_calls().is_empty());
    }

    #[tokio::test]
    async fn urls_keep_configured_order() {
        let dir = TempDir::new().unwrap();
        let mut settings = Settings::with_root(dir.path());
        settings.playlist_urls = vec![
            "https://x/playlist?list=PLb".into(),
            "https://x/playlist?list=PLa".into(),
        ];
        let tool = ScriptedDownloader::new()
            .with_capture("https://x/playlist?list=PLb", info_line("B"))
            .with_capture("https://x/playlist?list=PLa", info_line("A"));
        let (resolver, _) = fixture(settings, tool);
        let mut store = store(&dir);

        let titles: Vec<_> = resolver
            .resolve(&mut store)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["B", "A"]);
    }

    fn channel_settings(dir: &TempDir) -> Settings {
        let mut settings = Settings::with_root(dir.path());
        settings.input_method = InputMethod::Channel;
        settings.channel_url = CHANNEL.to_string();
        settings
    }

    const LISTING: &str = r#"{
        "channel": "Artist", "channel_id": "UC1", "playlist_count": 2,
        "entries": [{"id": "PL1", "title": "One"}, {"id": "PL2", "title": "Two"}]
    }"#;

    #[tokio::test]
    async fn channel_listing_caches_everything() {
        let dir = TempDir::new().unwrap();
        let tool = ScriptedDownloader::new().with_capture(&format!("{CHANNEL}/playlists"), LISTING);
        let (resolver, tool) = fixture(channel_settings(&dir), tool);
        let mut store = store(&dir);

        let playlists = resolver.resolve(&mut store).await.unwrap();

        assert_eq!(playlists.len(), 2);
        assert_eq!(tool.capture_calls().len(), 1);
        assert_eq!(store.channel_info().unwrap().display_name(), "Artist");
        assert_eq!(store.stats().total_playlists, 2);
    }

    #[tokio::test]
    async fn channel_falls_back_to_bare_url() {
        let dir = TempDir::new().unwrap();
        let tool = ScriptedDownloader::new()
            .with_capture(&format!("{CHANNEL}/playlists"), r#"{"entries": []}"#)
            .with_capture(CHANNEL, LISTING);
        let (resolver, tool) = fixture(channel_settings(&dir), tool);
        let mut store = store(&dir);

        let playlists = resolver.from_channel(&mut store).await.unwrap();

        assert_eq!(playlists.len(), 2);
        assert_eq!(tool.capture_calls().len(), 2);
    }

    #[tokio::test]
    async fn unreachable_channel_is_an_error() {
        let dir = TempDir::new().unwrap();
        let (resolver, _) = fixture(channel_settings(&dir), ScriptedDownloader::new());
        let mut store = store(&dir);

        let result = resolver.from_channel(&mut store).await;

        assert_matches!(result, Err(ResolveError::ChannelListing { url, .. }) if url == CHANNEL);
        assert!(store.channel_info().is_none());
    }
}
