//! WebVTT captions to timed `.lrc` lyrics
use crate::error::PostProcessError;
use std::path::Path;
use tracing::{error, info};

pub const CAPTION_EXTENSION: &str = "vtt";
pub const LYRICS_EXTENSION: &str = "lrc";

/// Convert WebVTT text to LRC
///
/// Each cue becomes one `[mm:ss.xx]text` line, using the cue start time.
/// Inline markup is stripped and a cue repeating the previous line is
/// dropped, which is how auto-generated captions scroll. Returns `None`
/// when the input has no usable cues.
pub fn vtt_to_lrc(vtt: &str) -> Option<String> {
    let mut lrc = String::new();
    let mut previous: Option<String> = None;

    for (start, text) in cues(vtt) {
        let text = clean_text(&text);
        if text.is_empty() || previous.as_deref() == Some(text.as_str()) {
            continue;
        }
        lrc.push_str(&format_timestamp(start));
        lrc.push_str(&text);
        lrc.push('\n');
        previous = Some(text);
    }

    (!lrc.is_empty()).then_some(lrc)
}

/// `(start in milliseconds, joined payload)` for every timed cue
fn cues(vtt: &str) -> Vec<(u64, String)> {
    let mut cues = Vec::new();
    let mut current: Option<(u64, Vec<&str>)> = None;

    for line in vtt.lines().map(str::trim) {
        if let Some((start, _)) = line.split_once("-->") {
            if let Some((start_ms, text)) = current.take() {
                cues.push((start_ms, text.join(" ")));
            }
            current = parse_timestamp(start.trim()).map(|ms| (ms, Vec::new()));
        } else if line.is_empty() {
            if let Some((start_ms, text)) = current.take() {
                cues.push((start_ms, text.join(" ")));
            }
        } else if let Some((_, text)) = current.as_mut() {
            text.push(line);
        }
    }
    if let Some((start_ms, text)) = current {
        cues.push((start_ms, text.join(" ")));
    }
    cues
}

/// `hh:mm:ss.ttt` or `mm:ss.ttt` to milliseconds
fn parse_timestamp(stamp: &str) -> Option<u64> {
    let (clock, millis) = stamp.split_once('.').unwrap_or((stamp, "0"));
    let millis: u64 = millis.get(..3.min(millis.len()))?.parse().ok()?;

    let mut seconds = 0u64;
    let parts: Vec<&str> = clock.split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return None;
    }
    for part in parts {
        seconds = seconds * 60 + part.parse::<u64>().ok()?;
    }
    Some(seconds * 1000 + millis)
}

fn format_timestamp(ms: u64) -> String {
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let hundredths = (ms % 1000) / 10;
    format!("[{minutes:02}:{seconds:02}.{hundredths:02}]")
}

fn clean_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    let out = out
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ");
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub async fn convert_file(caption: &Path) -> Result<std::path::PathBuf, PostProcessError> {
    let vtt = tokio::fs::read_to_string(caption).await?;
    let lrc = vtt_to_lrc(&vtt).ok_or_else(|| PostProcessError::NoCues {
        path: caption.to_path_buf(),
    })?;
    let target = caption.with_extension(LYRICS_EXTENSION);
    tokio::fs::write(&target, lrc).await?;
    Ok(target)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct LyricsSummary {
    pub written: usize,
    pub failed: usize,
}

/// Convert every caption file in `dir`; one bad file does not stop the rest
pub async fn convert_captions(dir: &Path) -> LyricsSummary {
    let mut summary = LyricsSummary::default();
    let captions = match crate::files_with_extension(dir, CAPTION_EXTENSION).await {
        Ok(captions) => captions,
        Err(e) => {
            error!("Could not list {}: {e}", dir.display());
            return summary;
        }
    };

    for caption in captions {
        match convert_file(&caption).await {
            Ok(target) => {
                info!("Converted captions: {} → {}", caption.display(), target.display());
                summary.written += 1;
            }
            Err(e) => {
                error!("Failed to convert {}: {e}", caption.display());
                summary.failed += 1;
            }
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const AUTO_CAPTIONS: &str = "WEBVTT
Kind: captions
Language: en

00:00:01.000 --> 00:00:03.500 align:start position:0%
When the <00:00:01.500><c>night</c><00:00:02.000><c> is</c> long

00:00:03.500 --> 00:00:05.000
When the night is long

1
00:01:05.250 --> 00:01:08.000
Tom &amp; Jerry
sing along

01:02:03.040 --> 01:02:04.000
<i>Encore</i>
";

    #[test]
    fn converts_cues() {
        let lrc = vtt_to_lrc(AUTO_CAPTIONS).unwrap();
        assert_eq!(
            lrc,
            "[00:01.00]When the night is long\n\
             [01:05.25]Tom & Jerry sing along\n\
             [62:03.04]Encore\n"
        );
    }

    #[test]
    fn short_timestamps_parse() {
        assert_eq!(parse_timestamp("01:02.345"), Some(62_345));
        assert_eq!(parse_timestamp("1:00:00.000"), Some(3_600_000));
        assert_eq!(parse_timestamp("12"), None);
        assert_eq!(parse_timestamp("aa:bb.ccc"), None);
    }

    #[test]
    fn no_cues_is_rejected() {
        assert_eq!(vtt_to_lrc("WEBVTT\n\nNOTE nothing here\n"), None);
        assert_eq!(vtt_to_lrc(""), None);
    }

    #[tokio::test]
    async fn batch_continues_past_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.en.vtt"), AUTO_CAPTIONS).unwrap();
        std::fs::write(dir.path().join("empty.en.vtt"), "WEBVTT\n").unwrap();

        let summary = convert_captions(dir.path()).await;

        assert_eq!(summary, LyricsSummary { written: 1, failed: 1 });
        let lrc = std::fs::read_to_string(dir.path().join("good.en.lrc")).unwrap();
        assert!(lrc.starts_with("[00:01.00]"));
        assert!(!dir.path().join("empty.en.lrc").exists());
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = convert_file(&dir.path().join("nope.vtt")).await;
        assert_matches!(result, Err(PostProcessError::Io(_)));
    }
}
