use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Filesystem family the download root lives on
///
/// Decides how strictly playlist titles are sanitized into directory names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    Windows,
    #[serde(alias = "linux", alias = "macos", alias = "darwin")]
    Unix,
}

impl OsFamily {
    /// The family of the platform we are running on
    pub fn host() -> Self {
        if cfg!(windows) {
            OsFamily::Windows
        } else {
            OsFamily::Unix
        }
    }
}

impl Default for OsFamily {
    fn default() -> Self {
        Self::host()
    }
}

/// Where the set of playlists to sync comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMethod {
    /// Every public playlist of `channel_url`
    Channel,
    /// Line-oriented file of playlist URLs or ids
    #[serde(alias = "playlist_file")]
    File,
    /// Explicit `playlist_urls` list
    #[serde(alias = "playlist_urls")]
    Urls,
}

impl std::fmt::Display for InputMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputMethod::Channel => write!(f, "channel"),
            InputMethod::File => write!(f, "playlist_file"),
            InputMethod::Urls => write!(f, "playlist_urls"),
        }
    }
}

/// Resolved configuration
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    pub os_family: OsFamily,
    pub input_method: InputMethod,
    pub channel_url: String,
    pub playlist_urls: Vec<String>,
    pub playlist_file: PathBuf,

    /// Root directory; each playlist gets a sub-directory named after its title
    pub root_path: PathBuf,
    /// Completion state file
    pub state_path: PathBuf,

    /// Executable of the external download tool
    pub downloader_path: String,
    /// Executable of the external transcoder, `None` means "look up on PATH"
    pub transcoder_path: Option<String>,

    pub audio_format: String,
    pub audio_quality: String,
    /// Appended verbatim to every download invocation
    pub extra_args: Vec<String>,

    pub download_lyrics: bool,
    pub lyrics_only: bool,
    pub subtitle_langs: String,

    /// Polite pause after each successfully completed playlist
    pub pause_seconds: u64,
}

impl Settings {
    pub fn downloader_program(&self) -> &str {
        &self.downloader_path
    }

    pub fn transcoder_program(&self) -> &str {
        self.transcoder_path.as_deref().unwrap_or("ffmpeg")
    }

    pub fn pause(&self) -> Duration {
        Duration::from_secs(self.pause_seconds)
    }

    /// Settings rooted at `root` with every optional knob at its default
    ///
    /// Mostly useful for tests and embedding; real runs go through [`Settings::load`].
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            os_family: OsFamily::host(),
            input_method: InputMethod::Urls,
            channel_url: String::new(),
            playlist_urls: Vec::new(),
            playlist_file: PathBuf::new(),
            state_path: root.join("download_state.json"),
            root_path: root,
            downloader_path: "yt-dlp".to_string(),
            transcoder_path: None,
            audio_format: "best".to_string(),
            audio_quality: "0".to_string(),
            extra_args: Vec::new(),
            download_lyrics: false,
            lyrics_only: false,
            subtitle_langs: "en".to_string(),
            pause_seconds: 0,
        }
    }
}
