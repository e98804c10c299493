use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::{error::MetadataError, provider::is_real_key, types::VideoMetadata};

const DEFAULT_API_URL: &str = "https://www.googleapis.com/youtube/v3/videos";
/// Well-known public video used to check the API key.
const PROBE_VIDEO_ID: &str = "dQw4w9WgXcQ";

static ISO_DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?$").expect("valid regex")
});

/// `PT1H2M3S` -> `1:02:03`, `PT4M5S` -> `4:05`.
pub fn format_iso_duration(duration: &str) -> Option<String> {
    let caps = ISO_DURATION.captures(duration)?;
    let part = |i: usize| -> u64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };
    let (hours, minutes, seconds) = (part(1), part(2), part(3));
    Some(if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    })
}

/// YouTube Data API `videos` lookup. Without a key every lookup is a placeholder.
#[derive(Clone)]
pub struct MetadataClient {
    client: reqwest::Client,
    api_key: Option<String>,
    api_url: String,
}

impl MetadataClient {
    pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self::with_api_url(client, api_key, DEFAULT_API_URL)
    }

    pub fn with_api_url(
        client: reqwest::Client,
        api_key: Option<String>,
        api_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.filter(|key| is_real_key(key)),
            api_url: api_url.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Metadata for `video_id`, falling back to a placeholder. Never fails.
    pub async fn fetch(&self, video_id: &str) -> VideoMetadata {
        if !self.is_configured() {
            return VideoMetadata::placeholder(video_id);
        }
        match self.lookup(video_id, "snippet,contentDetails").await {
            Ok(item) => metadata_from_item(&item),
            Err(e) => {
                warn!(%video_id, error = %e, "metadata lookup failed, using placeholder");
                VideoMetadata::placeholder(video_id)
            }
        }
    }

    /// Check that the configured key is accepted.
    pub async fn probe(&self) -> Result<(), MetadataError> {
        self.lookup(PROBE_VIDEO_ID, "snippet").await.map(|_| ())
    }

    async fn lookup(&self, video_id: &str, parts: &str) -> Result<Value, MetadataError> {
        let api_key = self.api_key.as_deref().ok_or(MetadataError::NotConfigured)?;

        let response: Value = self
            .client
            .get(&self.api_url)
            .query(&[("id", video_id), ("part", parts), ("key", api_key)])
            .send()
            .await?
            .json()
            .await?;

        if let Some(error) = response.get("error") {
            return Err(MetadataError::Api {
                message: error["message"].as_str().unwrap_or("unknown error").to_string(),
            });
        }

        response["items"]
            .get(0)
            .cloned()
            .ok_or_else(|| MetadataError::NotFound {
                video_id: video_id.to_string(),
            })
    }
}

fn metadata_from_item(item: &Value) -> VideoMetadata {
    let snippet = &item["snippet"];
    let text = |value: &Value| value.as_str().unwrap_or_default().to_string();
    VideoMetadata {
        title: text(&snippet["title"]),
        description: text(&snippet["description"]),
        duration: item["contentDetails"]["duration"]
            .as_str()
            .and_then(format_iso_duration)
            .unwrap_or_else(|| "Unknown".to_string()),
        channel: text(&snippet["channelTitle"]),
    }
}

#[cfg(test)]
mod tests {
    use axum::{Json, Router, routing::get};
    use serde_json::json;

    use super::*;
    use crate::transcript::tests::serve;

    #[test]
    fn iso_durations() {
        assert_eq!(format_iso_duration("PT1H2M3S").as_deref(), Some("1:02:03"));
        assert_eq!(format_iso_duration("PT4M5S").as_deref(), Some("4:05"));
        assert_eq!(format_iso_duration("PT45S").as_deref(), Some("0:45"));
        assert_eq!(format_iso_duration("PT2H").as_deref(), Some("2:00:00"));
        assert_eq!(format_iso_duration("P1D"), None);
    }

    #[tokio::test]
    async fn placeholder_without_key() {
        let client = MetadataClient::new(reqwest::Client::new(), Some("your_youtube_api_key_here".into()));
        assert!(!client.is_configured());
        assert_eq!(client.fetch("abc").await.title, "YouTube Video (abc)");
        assert!(matches!(client.probe().await, Err(MetadataError::NotConfigured)));
    }

    #[tokio::test]
    async fn reads_snippet_and_duration() {
        let router = Router::new().route(
            "/videos",
            get(|| async {
                Json(json!({ "items": [{
                    "snippet": { "title": "React Todo", "description": "d", "channelTitle": "Dev" },
                    "contentDetails": { "duration": "PT12M7S" }
                }]}))
            }),
        );
        let base = serve(router).await;

        let client = MetadataClient::with_api_url(
            reqwest::Client::new(),
            Some("key".into()),
            format!("{}/videos", base),
        );
        let metadata = client.fetch("abc").await;
        assert_eq!(metadata.title, "React Todo");
        assert_eq!(metadata.channel, "Dev");
        assert_eq!(metadata.duration, "12:07");
    }

    #[tokio::test]
    async fn api_error_falls_back_to_placeholder() {
        let router = Router::new().route(
            "/videos",
            get(|| async { Json(json!({ "error": { "message": "API key not valid" } })) }),
        );
        let base = serve(router).await;

        let client = MetadataClient::with_api_url(
            reqwest::Client::new(),
            Some("bad".into()),
            format!("{}/videos", base),
        );
        assert_eq!(client.fetch("abc").await, VideoMetadata::placeholder("abc"));
        match client.probe().await {
            Err(MetadataError::Api { message }) => assert_eq!(message, "API key not valid"),
            other => panic!("unexpected probe result: {:?}", other),
        }
    }
}
