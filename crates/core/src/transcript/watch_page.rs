use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{
    TranscriptSource,
    captions::{CaptionTrack, fetch_track, pick_track},
};
use crate::{error::TranscriptError, types::TranscriptSegment};

const STRATEGY: &str = "watch-page";
const DEFAULT_WATCH_URL: &str = "https://www.youtube.com/watch";
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko)";

static CAPTION_TRACKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""captionTracks":(\[.*?\])"#).expect("valid regex"));

/// Scrapes the `captionTracks` array embedded in the watch page HTML.
pub struct WatchPageSource {
    client: reqwest::Client,
    watch_url: String,
}

impl WatchPageSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_watch_url(client, DEFAULT_WATCH_URL)
    }

    pub fn with_watch_url(client: reqwest::Client, watch_url: impl Into<String>) -> Self {
        Self {
            client,
            watch_url: watch_url.into(),
        }
    }
}

pub fn extract_caption_tracks(html: &str) -> Result<Vec<CaptionTrack>, TranscriptError> {
    let Some(caps) = CAPTION_TRACKS.captures(html) else {
        return Ok(Vec::new());
    };
    serde_json::from_str(&caps[1]).map_err(|e| TranscriptError::Parse {
        strategy: STRATEGY,
        reason: e.to_string(),
    })
}

#[async_trait]
impl TranscriptSource for WatchPageSource {
    fn name(&self) -> &'static str {
        STRATEGY
    }

    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptSegment>, TranscriptError> {
        let response = self
            .client
            .get(&self.watch_url)
            .query(&[("v", video_id)])
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(TranscriptError::request(STRATEGY))?;

        if !response.status().is_success() {
            return Err(TranscriptError::Status {
                strategy: STRATEGY,
                status: response.status().as_u16(),
            });
        }

        let html = response
            .text()
            .await
            .map_err(TranscriptError::request(STRATEGY))?;
        let tracks = extract_caption_tracks(&html)?;
        let track = pick_track(&tracks).ok_or_else(|| TranscriptError::NoCaptions {
            strategy: STRATEGY,
            video_id: video_id.to_string(),
        })?;

        fetch_track(&self.client, STRATEGY, &track.base_url).await
    }
}

#[cfg(test)]
mod tests {
    use axum::{Router, routing::get};

    use super::*;
    use crate::transcript::tests::serve;

    #[test]
    fn extracts_escaped_base_url() {
        let html = r#"var ytInitialPlayerResponse = {"captions":{"captionTracks":[{"baseUrl":"https://www.youtube.com/api/timedtext?v=abc&lang=en","languageCode":"en"}],"audioTracks":[]}};"#;
        let tracks = extract_caption_tracks(html).unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(
            tracks[0].base_url,
            "https://www.youtube.com/api/timedtext?v=abc&lang=en"
        );
    }

    #[test]
    fn page_without_tracks() {
        assert!(extract_caption_tracks("<html></html>").unwrap().is_empty());
    }

    #[tokio::test]
    async fn follows_track_from_page() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let page = format!(
            r#"<script>{{"captionTracks":[{{"baseUrl":"{}/captions","languageCode":"en"}}]}}</script>"#,
            base
        );
        let router = Router::new()
            .route("/watch", get(move || async move { page }))
            .route(
                "/captions",
                get(|| async { r#"<transcript><text start="15" dur="3">useState hook</text></transcript>"# }),
            );
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

        let source = WatchPageSource::with_watch_url(reqwest::Client::new(), format!("{}/watch", base));
        let segments = source.fetch("abc").await.unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].timestamp, "0:15");
    }

    #[tokio::test]
    async fn not_found_page_is_status_error() {
        let base = serve(Router::new()).await;
        let source = WatchPageSource::with_watch_url(reqwest::Client::new(), format!("{}/watch", base));
        let err = source.fetch("abc").await.unwrap_err();
        assert!(matches!(err, TranscriptError::Status { status: 404, .. }));
    }
}
