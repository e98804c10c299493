use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::{error::TranscriptError, types::TranscriptSegment};

static TEXT_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<text start="([\d.]+)"(?: dur="([\d.]+)")?[^>]*>(.*?)</text>"#)
        .expect("valid regex")
});

/// One entry of a player response's `captionTracks` list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub base_url: String,
    #[serde(default)]
    pub language_code: String,
    #[serde(default)]
    pub vss_id: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
}

impl CaptionTrack {
    fn is_english(&self) -> bool {
        self.language_code == "en"
            || self.language_code.starts_with("en-")
            || self.vss_id.as_deref().is_some_and(|id| id.contains(".en"))
    }

    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

/// English tracks first (manual before auto-generated), otherwise the first track.
pub fn pick_track(tracks: &[CaptionTrack]) -> Option<&CaptionTrack> {
    tracks
        .iter()
        .find(|t| t.is_english() && !t.is_generated())
        .or_else(|| tracks.iter().find(|t| t.is_english()))
        .or_else(|| tracks.first())
}

pub fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Parse a timedtext XML document into segments. Entries without text are dropped.
pub fn parse_caption_xml(xml: &str) -> Vec<TranscriptSegment> {
    TEXT_ENTRY
        .captures_iter(xml)
        .filter_map(|caps| {
            let start: f64 = caps[1].parse().ok()?;
            let duration: f64 = caps
                .get(2)
                .and_then(|d| d.as_str().parse().ok())
                .unwrap_or(0.0);
            let text = decode_entities(&caps[3]).replace('\n', " ");
            let text = text.trim();
            (!text.is_empty()).then(|| TranscriptSegment::timed(start, duration, text))
        })
        .collect()
}

/// Download a caption track and parse it.
pub async fn fetch_track(
    client: &reqwest::Client,
    strategy: &'static str,
    url: &str,
) -> Result<Vec<TranscriptSegment>, TranscriptError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(TranscriptError::request(strategy))?;

    if !response.status().is_success() {
        return Err(TranscriptError::Status {
            strategy,
            status: response.status().as_u16(),
        });
    }

    let xml = response
        .text()
        .await
        .map_err(TranscriptError::request(strategy))?;
    Ok(parse_caption_xml(&xml))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(lang: &str, kind: Option<&str>) -> CaptionTrack {
        CaptionTrack {
            base_url: format!("https://example.test/{}", lang),
            language_code: lang.to_string(),
            vss_id: None,
            kind: kind.map(str::to_string),
        }
    }

    #[test]
    fn parses_entries_and_decodes_entities() {
        let xml = r#"<?xml version="1.0" encoding="utf-8" ?><transcript>
<text start="0.5" dur="2.1">Let&#39;s build a &lt;TodoList&gt;</text>
<text start="3" dur="1.5">first
line</text>
<text start="4.5" dur="1">   </text>
<text start="65.2">Tom &amp;amp; Jerry</text>
</transcript>"#;

        let segments = parse_caption_xml(xml);
        assert_eq!(segments.len(), 3);

        assert_eq!(segments[0].text, "Let's build a <TodoList>");
        assert_eq!(segments[0].timestamp, "0:00");
        assert_eq!(segments[0].start_time, Some(0.5));
        assert_eq!(segments[0].duration, Some(2.1));

        assert_eq!(segments[1].text, "first line");
        assert_eq!(segments[2].timestamp, "1:05");
        assert_eq!(segments[2].text, "Tom &amp; Jerry");
    }

    #[test]
    fn garbage_yields_no_segments() {
        assert!(parse_caption_xml("<html>not captions</html>").is_empty());
    }

    #[test]
    fn english_manual_track_preferred() {
        let tracks = vec![
            track("de", None),
            track("en", Some("asr")),
            track("en-GB", None),
        ];
        assert_eq!(pick_track(&tracks).unwrap().language_code, "en-GB");
    }

    #[test]
    fn falls_back_to_generated_then_any_track() {
        let tracks = vec![track("fr", None), track("en", Some("asr"))];
        assert_eq!(pick_track(&tracks).unwrap().language_code, "en");

        let tracks = vec![track("fr", None), track("de", None)];
        assert_eq!(pick_track(&tracks).unwrap().language_code, "fr");

        assert!(pick_track(&[]).is_none());
    }

    #[test]
    fn vss_id_marks_english() {
        let mut t = track("", None);
        t.vss_id = Some(".en.nP7-2PuUl7o".to_string());
        assert!(t.is_english());
    }
}
