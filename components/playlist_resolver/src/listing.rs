//! Shapes of the download tool's JSON metadata, reduced to what we keep
use playlist_primitives::{canonical_playlist_url, ChannelInfo, ImageRef, PlaylistDescriptor};
use serde::Deserialize;

/// One line of `--flat-playlist --dump-json` output
#[derive(Debug, Deserialize)]
pub(crate) struct FlatEntry {
    #[serde(default)]
    playlist_title: Option<String>,
    #[serde(default)]
    playlist: Option<String>,
}

impl FlatEntry {
    pub(crate) fn title(self) -> Option<String> {
        non_empty(self.playlist_title).or_else(|| non_empty(self.playlist))
    }
}

/// `-J --flat-playlist` output for a channel page
#[derive(Debug, Deserialize)]
pub(crate) struct ChannelListing {
    #[serde(default)]
    channel_id: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(default)]
    uploader_id: Option<String>,
    #[serde(default)]
    uploader_url: Option<String>,
    #[serde(default)]
    channel_url: Option<String>,
    #[serde(default)]
    playlist_count: Option<u64>,
    #[serde(default)]
    entries: Vec<Option<ListingEntry>>,
}

#[derive(Debug, Deserialize)]
struct ListingEntry {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    thumbnails: Option<Vec<RawThumbnail>>,
}

#[derive(Debug, Deserialize)]
struct RawThumbnail {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
}

impl ChannelListing {
    pub(crate) fn into_parts(self) -> (ChannelInfo, Vec<PlaylistDescriptor>) {
        let playlists: Vec<PlaylistDescriptor> = self
            .entries
            .into_iter()
            .flatten()
            .filter_map(ListingEntry::into_descriptor)
            .collect();

        let info = ChannelInfo {
            channel_id: self.channel_id,
            channel: self.channel,
            uploader: self.uploader,
            uploader_id: self.uploader_id,
            uploader_url: self.uploader_url,
            channel_url: self.channel_url,
            playlist_count: self.playlist_count.unwrap_or(playlists.len() as u64),
        };
        (info, playlists)
    }
}

impl ListingEntry {
    /// Entries without an id cannot be tracked and are dropped
    fn into_descriptor(self) -> Option<PlaylistDescriptor> {
        let id = non_empty(self.id)?;
        let title = non_empty(self.title).unwrap_or_else(|| PlaylistDescriptor::fallback_title(&id));
        let url = non_empty(self.url).unwrap_or_else(|| canonical_playlist_url(&id));
        let thumbnails = self
            .thumbnails
            .unwrap_or_default()
            .into_iter()
            .filter_map(|t| {
                let url = non_empty(t.url)?;
                Some(ImageRef {
                    url,
                    width: t.width,
                    height: t.height,
                })
            })
            .collect();

        Some(PlaylistDescriptor::new(id, title, url).with_thumbnails(thumbnails))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
