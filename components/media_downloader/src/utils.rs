// components/media_downloader/src/utils.rs
use playlist_primitives::PlaylistDescriptor;
use std::path::PathBuf;
use sync_settings::{OsFamily, Settings};

/// Longest directory/file name we produce, in characters
pub const MAX_FILENAME_CHARS: usize = 200;

const WINDOWS_FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
const UNIX_FORBIDDEN: &[char] = &['/', '\0'];

/// Characters that may not appear in a file name on `os`
pub fn forbidden_chars(os: OsFamily) -> &'static [char] {
    match os {
        OsFamily::Windows => WINDOWS_FORBIDDEN,
        OsFamily::Unix => UNIX_FORBIDDEN,
    }
}

/// Make `name` safe to use as a single path component on `os`
///
/// Forbidden and control characters are dropped, reserved device names
/// (`CON`, `NUL`, `COM1`, ...) vanish on Windows, leading/trailing dots and
/// spaces are trimmed and the result is capped at [`MAX_FILENAME_CHARS`].
/// The result may be empty.
pub fn sanitize_filename(name: &str, os: OsFamily) -> String {
    let options = sanitize_filename::Options {
        windows: os == OsFamily::Windows,
        truncate: false,
        replacement: "",
    };
    let cleaned = sanitize_filename::sanitize_with_options(name, options);

    let capped: String = trim_dots_and_spaces(&cleaned)
        .chars()
        .take(MAX_FILENAME_CHARS)
        .collect();

    // Capping can expose a new trailing space or dot
    trim_dots_and_spaces(&capped).to_string()
}

fn trim_dots_and_spaces(s: &str) -> &str {
    s.trim_matches(|c| c == '.' || c == ' ')
}

/// Directory a playlist is downloaded into: `<root>/<sanitized title>`
///
/// Falls back to the sanitized id when the title sanitizes to nothing.
pub fn playlist_dir(settings: &Settings, descriptor: &PlaylistDescriptor) -> PathBuf {
    let mut name = sanitize_filename(&descriptor.title, settings.os_family);
    if name.is_empty() {
        name = sanitize_filename(descriptor.id.as_str(), settings.os_family);
    }
    if name.is_empty() {
        name = "playlist".to_string();
    }
    settings.root_path.join(name)
}
