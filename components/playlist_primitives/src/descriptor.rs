use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a playlist within its source
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaylistId(String);

impl PlaylistId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlaylistId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PlaylistId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for PlaylistId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A remote image (thumbnail) with optional dimensions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl ImageRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            width: None,
            height: None,
        }
    }

    pub fn sized(url: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            url: url.into(),
            width: Some(width),
            height: Some(height),
        }
    }

    /// Pixel area, a missing dimension counts as zero
    pub fn area(&self) -> u64 {
        u64::from(self.width.unwrap_or(0)) * u64::from(self.height.unwrap_or(0))
    }
}

/// Normalized description of one playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistDescriptor {
    pub id: PlaylistId,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub thumbnails: Vec<ImageRef>,
}

impl PlaylistDescriptor {
    pub fn new(
        id: impl Into<PlaylistId>,
        title: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: url.into(),
            thumbnails: Vec::new(),
        }
    }

    pub fn with_thumbnails(mut self, thumbnails: Vec<ImageRef>) -> Self {
        self.thumbnails = thumbnails;
        self
    }

    /// Descriptor used when the remote lookup for `id` failed
    pub fn fallback(id: impl Into<PlaylistId>, url: impl Into<String>) -> Self {
        let id = id.into();
        let title = Self::fallback_title(id.as_str());
        Self::new(id, title, url)
    }

    pub fn fallback_title(id: &str) -> String {
        format!("Playlist_{id}")
    }

    /// Thumbnails with the largest pixel area first
    ///
    /// Thumbnails of equal area keep their source order.
    pub fn thumbnails_by_resolution(&self) -> impl Iterator<Item = &ImageRef> {
        let mut sorted: Vec<&ImageRef> = self.thumbnails.iter().collect();
        sorted.sort_by(|a, b| b.area().cmp(&a.area()));
        sorted.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_uses_synthesized_title() {
        let playlist = PlaylistDescriptor::fallback("PLxyz", "https://example.com/playlist?list=PLxyz");
        assert_eq!(playlist.id.as_str(), "PLxyz");
        assert_eq!(playlist.title, "Playlist_PLxyz");
        assert!(playlist.thumbnails.is_empty());
    }

    #[test]
    fn thumbnails_sorted_by_area_descending() {
        let playlist = PlaylistDescriptor::new("PL1", "t", "u").with_thumbnails(vec![
            ImageRef::sized("medium", 320, 180),
            ImageRef::new("unsized"),
            ImageRef::sized("large", 1280, 720),
            ImageRef::sized("small", 120, 90),
        ]);

        let order: Vec<_> = playlist
            .thumbnails_by_resolution()
            .map(|t| t.url.as_str())
            .collect();
        assert_eq!(order, vec!["large", "medium", "small", "unsized"]);
    }

    #[test]
    fn equal_areas_keep_source_order() {
        let playlist = PlaylistDescriptor::new("PL1", "t", "u").with_thumbnails(vec![
            ImageRef::new("first"),
            ImageRef::new("second"),
        ]);

        let order: Vec<_> = playlist
            .thumbnails_by_resolution()
            .map(|t| t.url.as_str())
            .collect();
        assert_eq!(order, vec!["first", "second"]);
    }

    #[test]
    fn descriptor_tolerates_missing_thumbnails_and_extra_fields() {
        let json = r#"{"id":"PL9","title":"Mix","url":"https://x","ie_key":"YoutubeTab"}"#;
        let playlist: PlaylistDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(playlist.id, PlaylistId::from("PL9"));
        assert!(playlist.thumbnails.is_empty());
    }

    #[test]
    fn id_serializes_transparently() {
        let json = serde_json::to_string(&PlaylistId::new("PLabc")).unwrap();
        assert_eq!(json, "\"PLabc\"");
    }
}
