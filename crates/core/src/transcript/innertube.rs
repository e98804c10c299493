use async_trait::async_trait;
use serde_json::{Value, json};

use super::{
    TranscriptSource,
    captions::{CaptionTrack, fetch_track, pick_track},
};
use crate::{error::TranscriptError, types::TranscriptSegment};

const STRATEGY: &str = "innertube";
const DEFAULT_PLAYER_URL: &str = "https://www.youtube.com/youtubei/v1/player";
const CLIENT_VERSION: &str = "2.20240101.00.00";

/// The web player's internal `player` endpoint, which lists caption tracks.
pub struct InnertubeSource {
    client: reqwest::Client,
    player_url: String,
}

impl InnertubeSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_player_url(client, DEFAULT_PLAYER_URL)
    }

    pub fn with_player_url(client: reqwest::Client, player_url: impl Into<String>) -> Self {
        Self {
            client,
            player_url: player_url.into(),
        }
    }
}

/// Caption tracks of a player response, empty when the video has none.
pub fn caption_tracks(player_response: &Value) -> Vec<CaptionTrack> {
    let tracks = &player_response["captions"]["playerCaptionsTracklistRenderer"]["captionTracks"];
    serde_json::from_value(tracks.clone()).unwrap_or_default()
}

#[async_trait]
impl TranscriptSource for InnertubeSource {
    fn name(&self) -> &'static str {
        STRATEGY
    }

    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptSegment>, TranscriptError> {
        let body = json!({
            "context": {
                "client": {
                    "clientName": "WEB",
                    "clientVersion": CLIENT_VERSION,
                    "hl": "en",
                }
            },
            "videoId": video_id,
        });

        let response = self
            .client
            .post(&self.player_url)
            .json(&body)
            .send()
            .await
            .map_err(TranscriptError::request(STRATEGY))?;

        if !response.status().is_success() {
            return Err(TranscriptError::Status {
                strategy: STRATEGY,
                status: response.status().as_u16(),
            });
        }

        let player: Value = response
            .json()
            .await
            .map_err(TranscriptError::request(STRATEGY))?;
        let tracks = caption_tracks(&player);
        let track = pick_track(&tracks).ok_or_else(|| TranscriptError::NoCaptions {
            strategy: STRATEGY,
            video_id: video_id.to_string(),
        })?;

        fetch_track(&self.client, STRATEGY, &track.base_url).await
    }
}
