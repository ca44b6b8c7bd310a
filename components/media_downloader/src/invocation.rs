// components/media_downloader/src/invocation.rs
//! Argument lists for the external download tool
use std::path::Path;
use sync_settings::Settings;

/// Per-playlist ledger the tool uses to skip items it already fetched
pub const ARCHIVE_FILE_NAME: &str = "download_archive.txt";

/// Output template inside the playlist directory
pub const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Arguments for downloading every item of `url` into `destination`
pub fn download_args(settings: &Settings, url: &str, destination: &Path) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "--newline".into(),
        "--extract-audio".into(),
        "--audio-format".into(),
        settings.audio_format.clone(),
        "--audio-quality".into(),
        settings.audio_quality.clone(),
        "--embed-thumbnail".into(),
        "--embed-metadata".into(),
        "--add-metadata".into(),
        "--download-archive".into(),
        path_arg(&destination.join(ARCHIVE_FILE_NAME)),
        "--no-overwrites".into(),
        "--ignore-errors".into(),
    ];

    if let Some(transcoder) = &settings.transcoder_path {
        args.push("--ffmpeg-location".into());
        args.push(transcoder.clone());
    }

    if settings.download_lyrics || settings.lyrics_only {
        args.extend(
            [
                "--write-subs",
                "--write-auto-subs",
                "--sub-langs",
                settings.subtitle_langs.as_str(),
                "--sub-format",
                "vtt",
            ]
            .map(String::from),
        );
    }

    if settings.lyrics_only {
        args.push("--skip-download".into());
    }

    args.push("--output".into());
    args.push(path_arg(&destination.join(OUTPUT_TEMPLATE)));
    args.push(url.to_string());
    args.extend(settings.extra_args.iter().cloned());
    args
}

/// Arguments for a metadata-only lookup of the first playlist entry
pub fn playlist_info_args(url: &str) -> Vec<String> {
    [
        "--flat-playlist",
        "--dump-json",
        "--playlist-items",
        "1",
        url,
    ]
    .map(String::from)
    .to_vec()
}

/// Arguments for a single-document listing of a channel page
pub fn channel_listing_args(url: &str) -> Vec<String> {
    ["-J", "--flat-playlist", url].map(String::from).to_vec()
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        let mut settings = Settings::with_root("/music");
        settings.audio_format = "mp3".into();
        settings.audio_quality = "0".into();
        settings
    }

    fn position(args: &[String], flag: &str) -> Option<usize> {
        args.iter().position(|a| a == flag)
    }

    #[test]
    fn fixed_flags_are_present() {
        let dest = Path::new("/music/Road Trip");
        let args = download_args(&settings(), "https://x/playlist?list=PL1", dest);

        for flag in [
            "--extract-audio",
            "--embed-thumbnail",
            "--embed-metadata",
            "--no-overwrites",
            "--ignore-errors",
        ] {
            assert!(position(&args, flag).is_some(), "missing {flag}");
        }

        let archive = position(&args, "--download-archive").unwrap();
        assert_eq!(
            Path::new(&args[archive + 1]),
            dest.join("download_archive.txt")
        );
        let output = position(&args, "--output").unwrap();
        assert_eq!(Path::new(&args[output + 1]), dest.join("%(title)s.%(ext)s"));
        assert_eq!(args[output + 2], "https://x/playlist?list=PL1");

        assert!(position(&args, "--write-subs").is_none());
        assert!(position(&args, "--skip-download").is_none());
        assert!(position(&args, "--ffmpeg-location").is_none());
    }

    #[test]
    fn lyrics_and_transcoder_options() {
        let mut settings = settings();
        settings.lyrics_only = true;
        settings.subtitle_langs = "en,de".into();
        settings.transcoder_path = Some("/opt/ffmpeg/bin".into());

        let args = download_args(&settings, "u", Path::new("/music/x"));

        let langs = position(&args, "--sub-langs").unwrap();
        assert_eq!(args[langs + 1], "en,de");
        assert!(position(&args, "--write-auto-subs").is_some());
        assert!(position(&args, "--skip-download").is_some());
        let ffmpeg = position(&args, "--ffmpeg-location").unwrap();
        assert_eq!(args[ffmpeg + 1], "/opt/ffmpeg/bin");
    }

    #[test]
    fn extra_args_come_last() {
        let mut settings = settings();
        settings.extra_args = vec!["--cookies".into(), "c.txt".into()];

        let args = download_args(&settings, "u", Path::new("/music/x"));
        assert_eq!(&args[args.len() - 2..], ["--cookies", "c.txt"]);
    }

    #[test]
    fn query_args() {
        assert_eq!(
            playlist_info_args("u"),
            ["--flat-playlist", "--dump-json", "--playlist-items", "1", "u"]
        );
        assert_eq!(channel_listing_args("c"), ["-J", "--flat-playlist", "c"]);
    }
}
