//! Playlist value types shared by every sync component
//!
//! A [`PlaylistDescriptor`] is the normalized record for one remote playlist.
//! Its [`PlaylistId`] is the identity used by the completion state; titles and
//! thumbnails may be refreshed by a later lookup but the id never changes.
//!
//! # Examples
//!
//! ```
//! use playlist_primitives::{ImageRef, PlaylistDescriptor};
//!
//! let playlist = PlaylistDescriptor::new("PL123", "Road Trip", "https://music.youtube.com/playlist?list=PL123")
//!     .with_thumbnails(vec![
//!         ImageRef::sized("https://i.ytimg.com/small.jpg", 120, 90),
//!         ImageRef::sized("https://i.ytimg.com/large.jpg", 1280, 720),
//!     ]);
//!
//! let best = playlist.thumbnails_by_resolution().next().unwrap();
//! assert_eq!(best.url, "https://i.ytimg.com/large.jpg");
//! ```

mod channel;
mod descriptor;

pub use channel::ChannelInfo;
pub use descriptor::{ImageRef, PlaylistDescriptor, PlaylistId};

/// Base URL used when a playlist id has to be turned back into a link
pub const PLAYLIST_URL_BASE: &str = "https://music.youtube.com/playlist?list=";

/// Build the canonical playlist URL for an id
pub fn canonical_playlist_url(id: &str) -> String {
    format!("{PLAYLIST_URL_BASE}{id}")
}
