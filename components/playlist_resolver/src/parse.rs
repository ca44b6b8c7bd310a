use playlist_primitives::canonical_playlist_url;

const LIST_PARAM: &str = "list=";
/// Bare id prefixes accepted in playlist files
const ID_PREFIXES: &[&str] = &["PL", "OL"];

/// Stable playlist id for a URL
///
/// The `list` query parameter when present, otherwise the last path segment.
pub fn extract_id(url: &str) -> String {
    list_param(url, |c| c == '&')
        .unwrap_or_else(|| url.rsplit('/').next().unwrap_or(url))
        .to_string()
}

/// Value after the first `list=` up to a terminator, if non-empty
fn list_param(text: &str, is_terminator: impl Fn(char) -> bool) -> Option<&str> {
    let (_, rest) = text.split_once(LIST_PARAM)?;
    let end = rest.find(is_terminator).unwrap_or(rest.len());
    let value = &rest[..end];
    (!value.is_empty()).then_some(value)
}

/// Playlist URLs listed in a playlist file
///
/// Blank lines and `#` comments are skipped. Full URLs carrying a `list`
/// parameter are kept as written; other lines with a `list` parameter and
/// bare `PL`/`OL` ids become canonical URLs. Anything else is ignored.
pub fn parse_playlist_file(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            if line.contains(LIST_PARAM) {
                if line.starts_with("http") {
                    Some(line.to_string())
                } else {
                    list_param(line, |c| c == '&' || c.is_whitespace()).map(canonical_playlist_url)
                }
            } else if ID_PREFIXES.iter().any(|prefix| line.starts_with(prefix)) {
                Some(canonical_playlist_url(line))
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://music.youtube.com/playlist?list=PLabc", "PLabc")]
    #[case("https://www.youtube.com/watch?v=xyz&list=OLAK5uy_k&index=2", "OLAK5uy_k")]
    #[case("https://youtube.com/playlist?list=", "playlist?list=")]
    #[case("https://example.com/channel/UC123", "UC123")]
    #[case("PLbare", "PLbare")]
    fn extracts_ids(#[case] url: &str, #[case] expected: &str) {
        assert_eq!(extract_id(url), expected);
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let file = "https://music.youtube.com/playlist?list=PL1\n\n# note\n";
        assert_eq!(
            parse_playlist_file(file),
            vec!["https://music.youtube.com/playlist?list=PL1"]
        );
    }

    #[test]
    fn normalises_ids_and_partial_urls() {
        let file = "\
            # favourites\n\
            PLkeep\n\
            OLAK5uy_album\n\
            music.youtube.com/playlist?list=PLpartial&si=share extra\n\
            http://youtube.com/playlist?list=PLfull&si=x\n\
            not a playlist\n\
            UCchannel\n";

        assert_eq!(
            parse_playlist_file(file),
            vec![
                "https://music.youtube.com/playlist?list=PLkeep",
                "https://music.youtube.com/playlist?list=OLAK5uy_album",
                "https://music.youtube.com/playlist?list=PLpartial",
                "http://youtube.com/playlist?list=PLfull&si=x",
            ]
        );
    }
}
