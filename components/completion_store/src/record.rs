use crate::error::StoreError;
use playlist_primitives::{ChannelInfo, PlaylistDescriptor, PlaylistId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// On-disk shape of the completion state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionRecord {
    #[serde(default)]
    pub completed_playlists: BTreeSet<PlaylistId>,
    /// Reserved, carried through untouched
    #[serde(default)]
    pub partially_downloaded: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub playlist_info: BTreeMap<PlaylistId, PlaylistDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_info: Option<ChannelInfo>,
}

/// Summary numbers for presentation layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Playlists with cached metadata
    pub total_playlists: usize,
    pub completed_playlists: usize,
    pub partial_downloads: usize,
    pub channel_cached: bool,
}

impl CompletionRecord {
    pub fn is_completed(&self, id: &PlaylistId) -> bool {
        self.completed_playlists.contains(id)
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            total_playlists: self.playlist_info.len(),
            completed_playlists: self.completed_playlists.len(),
            partial_downloads: self.partially_downloaded.len(),
            channel_cached: self.channel_info.is_some(),
        }
    }

    /// Read-only snapshot of the state at `path`
    ///
    /// Returns `Ok(None)` when the file does not exist or is blank. Unlike
    /// [`crate::CompletionStore::load`] this never creates or repairs the file.
    pub fn read(path: impl AsRef<Path>) -> Result<Option<Self>, StoreError> {
        let path = path.as_ref();
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        if contents.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| StoreError::Parse {
                path: path.to_path_buf(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_state_file_parses() {
        let json = r#"{
          "completed_playlists": ["PL1", "PL2", "PL1"],
          "partially_downloaded": {},
          "playlist_info": {
            "PL1": {"id": "PL1", "title": "One", "url": "https://x?list=PL1", "ie_key": "YoutubeTab"}
          }
        }"#;

        let record: CompletionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.completed_playlists.len(), 2);
        assert!(record.is_completed(&PlaylistId::from("PL2")));
        assert_eq!(record.playlist_info[&PlaylistId::from("PL1")].title, "One");
        assert!(record.channel_info.is_none());
    }

    #[test]
    fn empty_object_is_empty_record() {
        let record: CompletionRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(record, CompletionRecord::default());
    }

    #[test]
    fn stats_count_sections() {
        let mut record = CompletionRecord::default();
        record.completed_playlists.insert(PlaylistId::from("a"));
        record.playlist_info.insert(
            PlaylistId::from("a"),
            PlaylistDescriptor::new("a", "A", "u"),
        );
        record.playlist_info.insert(
            PlaylistId::from("b"),
            PlaylistDescriptor::new("b", "B", "u"),
        );

        let stats = record.stats();
        assert_eq!(stats.total_playlists, 2);
        assert_eq!(stats.completed_playlists, 1);
        assert_eq!(stats.partial_downloads, 0);
        assert!(!stats.channel_cached);
    }
}
