use async_trait::async_trait;
use tracing::debug;

use super::{TranscriptSource, captions::parse_caption_xml};
use crate::{error::TranscriptError, types::TranscriptSegment};

const STRATEGY: &str = "timedtext";
const DEFAULT_BASE_URL: &str = "https://www.youtube.com/api/timedtext";

/// Language attempts in order; `None` lets YouTube pick the default track.
const LANGUAGES: [Option<&str>; 3] = [None, Some("en"), Some("en-US")];

/// Public `timedtext` endpoint.
pub struct TimedTextSource {
    client: reqwest::Client,
    base_url: String,
}

impl TimedTextSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl TranscriptSource for TimedTextSource {
    fn name(&self) -> &'static str {
        STRATEGY
    }

    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptSegment>, TranscriptError> {
        for lang in LANGUAGES {
            let mut request = self.client.get(&self.base_url).query(&[("v", video_id)]);
            if let Some(lang) = lang {
                request = request.query(&[("lang", lang)]);
            }

            let response = request
                .send()
                .await
                .map_err(TranscriptError::request(STRATEGY))?;
            if !response.status().is_success() {
                debug!(?lang, status = %response.status(), "timedtext attempt rejected");
                continue;
            }

            let xml = response
                .text()
                .await
                .map_err(TranscriptError::request(STRATEGY))?;
            let segments = parse_caption_xml(&xml);
            if !segments.is_empty() {
                return Ok(segments);
            }
            debug!(?lang, "timedtext attempt returned no captions");
        }

        Err(TranscriptError::NoCaptions {
            strategy: STRATEGY,
            video_id: video_id.to_string(),
        })
    }
}
