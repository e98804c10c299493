use once_cell::sync::Lazy;
use regex::Regex;

static URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:youtube\.com/(?:watch\?(?:[^#\s]*&)?v=|embed/|shorts/|live/)|youtu\.be/)([A-Za-z0-9_-]{11})",
    )
    .expect("valid regex")
});

static BARE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("valid regex"));

/// Pull the 11-character video id out of a YouTube URL, or accept a bare id.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    if BARE_ID.is_match(input) {
        return Some(input.to_string());
    }
    URL_PATTERN
        .captures(input)
        .map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_url_shapes() {
        let cases = [
            "https://www.youtube.com/watch?v=9wiWzu_tRB0",
            "https://youtube.com/watch?feature=share&v=9wiWzu_tRB0&t=42s",
            "https://youtu.be/9wiWzu_tRB0?si=abc",
            "https://www.youtube.com/embed/9wiWzu_tRB0",
            "https://www.youtube.com/shorts/9wiWzu_tRB0",
            "m.youtube.com/watch?v=9wiWzu_tRB0",
            "  9wiWzu_tRB0  ",
        ];
        for case in cases {
            assert_eq!(extract_video_id(case).as_deref(), Some("9wiWzu_tRB0"), "{}", case);
        }
    }

    #[test]
    fn rejects_other_input() {
        assert_eq!(extract_video_id(""), None);
        assert_eq!(extract_video_id("https://vimeo.com/123456789"), None);
        assert_eq!(extract_video_id("https://www.youtube.com/watch?v=short"), None);
        assert_eq!(extract_video_id("not a video id"), None);
    }
}
