use crate::error::SettingsError;
use crate::model::{InputMethod, OsFamily, Settings};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config.yml";

/// Config file as written by the user, before defaults and paths are resolved
#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawSettings {
    os_type: Option<OsFamily>,
    input_method: InputMethod,
    channel_url: String,
    playlist_urls: Vec<String>,
    playlist_file: String,
    root_path: String,
    state_file: String,
    ytdlp_path: String,
    ffmpeg_path: String,
    audio_format: String,
    audio_quality: ScalarString,
    extra_args: ExtraArgs,
    download_lyrics: bool,
    lyrics_only: bool,
    subtitle_langs: String,
    pause_seconds: u64,
}

impl Default for RawSettings {
    fn default() -> Self {
        Self {
            os_type: None,
            input_method: InputMethod::Channel,
            channel_url: String::new(),
            playlist_urls: Vec::new(),
            playlist_file: String::new(),
            root_path: "./downloads".to_string(),
            state_file: "download_state.json".to_string(),
            ytdlp_path: "yt-dlp".to_string(),
            ffmpeg_path: String::new(),
            audio_format: "best".to_string(),
            audio_quality: ScalarString("0".to_string()),
            extra_args: ExtraArgs::Line(String::new()),
            download_lyrics: false,
            lyrics_only: false,
            subtitle_langs: "en".to_string(),
            pause_seconds: 1,
        }
    }
}

/// `audio_quality: 0` and `audio_quality: "192K"` are both valid YAML
#[derive(Debug, Deserialize)]
#[serde(from = "serde_yaml::Value")]
struct ScalarString(String);

impl From<serde_yaml::Value> for ScalarString {
    fn from(value: serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::String(s) => ScalarString(s),
            serde_yaml::Value::Number(n) => ScalarString(n.to_string()),
            serde_yaml::Value::Bool(b) => ScalarString(b.to_string()),
            _ => ScalarString("0".to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExtraArgs {
    Line(String),
    List(Vec<String>),
}

impl ExtraArgs {
    fn into_args(self) -> Vec<String> {
        match self {
            ExtraArgs::Line(line) => line.split_whitespace().map(str::to_string).collect(),
            ExtraArgs::List(list) => list.into_iter().filter(|a| !a.trim().is_empty()).collect(),
        }
    }
}

impl Settings {
    /// Load and validate the YAML config at `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                SettingsError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                SettingsError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let settings = Self::from_yaml(&contents)?;
        tracing::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Parse and validate settings from YAML text
    pub fn from_yaml(contents: &str) -> Result<Self, SettingsError> {
        let raw: RawSettings = if contents.trim().is_empty() {
            RawSettings::default()
        } else {
            serde_yaml::from_str(contents)?
        };
        let settings = resolve(raw);
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        match self.input_method {
            InputMethod::Channel if self.channel_url.trim().is_empty() => Err(
                SettingsError::Invalid("input_method is 'channel' but channel_url is empty".into()),
            ),
            InputMethod::File if self.playlist_file.as_os_str().is_empty() => Err(
                SettingsError::Invalid("input_method is 'playlist_file' but playlist_file is empty".into()),
            ),
            InputMethod::Urls if self.playlist_urls.is_empty() => Err(SettingsError::Invalid(
                "input_method is 'playlist_urls' but playlist_urls is empty".into(),
            )),
            _ if self.downloader_path.trim().is_empty() => {
                Err(SettingsError::Invalid("ytdlp_path must not be empty".into()))
            }
            _ => Ok(()),
        }
    }
}

fn resolve(raw: RawSettings) -> Settings {
    let ffmpeg = raw.ffmpeg_path.trim();
    Settings {
        os_family: raw.os_type.unwrap_or_default(),
        input_method: raw.input_method,
        channel_url: raw.channel_url.trim().trim_end_matches('/').to_string(),
        playlist_urls: raw
            .playlist_urls
            .into_iter()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect(),
        playlist_file: expand_home(&raw.playlist_file),
        root_path: expand_home(&raw.root_path),
        state_path: expand_home(&raw.state_file),
        downloader_path: resolve_executable(&raw.ytdlp_path),
        transcoder_path: (!ffmpeg.is_empty()).then(|| resolve_executable(ffmpeg)),
        audio_format: raw.audio_format.trim().to_lowercase(),
        audio_quality: raw.audio_quality.0.trim().to_string(),
        extra_args: raw.extra_args.into_args(),
        download_lyrics: raw.download_lyrics,
        lyrics_only: raw.lyrics_only,
        subtitle_langs: raw.subtitle_langs.trim().to_string(),
        pause_seconds: raw.pause_seconds,
    }
}

/// Bare program names are left for PATH lookup, paths get `~` expanded
fn resolve_executable(path: &str) -> String {
    let path = path.trim();
    if !path.contains('/') && !path.contains('\\') {
        return path.to_string();
    }
    expand_home(path).to_string_lossy().into_owned()
}

fn expand_home(path: &str) -> PathBuf {
    let path = path.trim();
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    #[test]
    fn channel_config_with_defaults() {
        let settings = Settings::from_yaml(
            r#"
input_method: channel
channel_url: https://www.youtube.com/@someone/
"#,
        )
        .unwrap();

        assert_eq!(settings.input_method, InputMethod::Channel);
        assert_eq!(settings.channel_url, "https://www.youtube.com/@someone");
        assert_eq!(settings.downloader_program(), "yt-dlp");
        assert_eq!(settings.transcoder_program(), "ffmpeg");
        assert_eq!(settings.audio_format, "best");
        assert_eq!(settings.audio_quality, "0");
        assert_eq!(settings.root_path, PathBuf::from("./downloads"));
        assert_eq!(settings.state_path, PathBuf::from("download_state.json"));
        assert_eq!(settings.pause_seconds, 1);
        assert!(!settings.download_lyrics);
    }

    #[test]
    fn legacy_keys_and_numeric_quality() {
        let settings = Settings::from_yaml(
            r#"
os_type: linux
input_method: playlist_file
playlist_file: playlists.txt
audio_format: MP3
audio_quality: 5
ffmpeg_path: /opt/ffmpeg/bin/ffmpeg
extra_args: "--limit-rate 2M   --sleep-interval 3"
download_lyrics: true
"#,
        )
        .unwrap();

        assert_eq!(settings.os_family, OsFamily::Unix);
        assert_eq!(settings.input_method, InputMethod::File);
        assert_eq!(settings.audio_format, "mp3");
        assert_eq!(settings.audio_quality, "5");
        assert_eq!(settings.transcoder_program(), "/opt/ffmpeg/bin/ffmpeg");
        assert_eq!(
            settings.extra_args,
            vec!["--limit-rate", "2M", "--sleep-interval", "3"]
        );
        assert!(settings.download_lyrics);
    }

    #[test]
    fn extra_args_as_list() {
        let settings = Settings::from_yaml(
            r#"
input_method: urls
playlist_urls: ["https://music.youtube.com/playlist?list=PL1"]
extra_args: ["--cookies", "cookies.txt", ""]
"#,
        )
        .unwrap();
        assert_eq!(settings.extra_args, vec!["--cookies", "cookies.txt"]);
    }

    #[test]
    fn missing_source_for_input_method_is_invalid() {
        let result = Settings::from_yaml("input_method: channel\n");
        assert_matches!(result, Err(SettingsError::Invalid(_)));

        let result = Settings::from_yaml("input_method: playlist_urls\nplaylist_urls: []\n");
        assert_matches!(result, Err(SettingsError::Invalid(_)));
    }

    #[test]
    fn unknown_input_method_fails_to_parse() {
        let result = Settings::from_yaml("input_method: carrier_pigeon\n");
        assert_matches!(result, Err(SettingsError::Parse(_)));
    }

    #[test]
    fn home_is_expanded_in_paths() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        let settings = Settings::from_yaml(
            r#"
input_method: urls
playlist_urls: ["https://x/playlist?list=PL1"]
root_path: ~/Music/sync
ytdlp_path: ~/bin/yt-dlp
"#,
        )
        .unwrap();
        assert_eq!(settings.root_path, home.join("Music/sync"));
        assert_eq!(
            settings.downloader_path,
            home.join("bin/yt-dlp").to_string_lossy()
        );
    }

    #[test]
    fn load_missing_file_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = Settings::load(dir.path().join("nope.yml"));
        assert_matches!(result, Err(SettingsError::NotFound { .. }));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "input_method: urls").unwrap();
        writeln!(file, "playlist_urls:").unwrap();
        writeln!(file, "  - https://music.youtube.com/playlist?list=PLa").unwrap();
        writeln!(file, "  - '  '").unwrap();

        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(
            settings.playlist_urls,
            vec!["https://music.youtube.com/playlist?list=PLa"]
        );
    }
}
