use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use walkthrough_core::{TranscriptSegment, VideoMetadata, extract_video_id};

use crate::{
    error::{ApiError, ApiJson, ApiResult},
    state::AppState,
};

const NO_TRANSCRIPT: &str = "No transcript available for this video. The video might not have captions enabled, or the captions might not be accessible.";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchTranscriptRequest {
    pub video_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchTranscriptResponse {
    pub video_id: String,
    pub metadata: VideoMetadata,
    pub transcript: Vec<TranscriptSegment>,
    pub success: bool,
    pub is_sample: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[instrument(skip_all)]
pub async fn fetch_transcript(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<FetchTranscriptRequest>,
) -> ApiResult<Json<FetchTranscriptResponse>> {
    let url = request
        .video_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ApiError::bad_request("Video URL is required"))?;
    let video_id =
        extract_video_id(url).ok_or_else(|| ApiError::bad_request("Invalid YouTube URL"))?;

    let metadata = state.metadata.fetch(&video_id).await;
    let response = match state.transcripts.fetch(&video_id).await {
        Some(fetched) => {
            info!(%video_id, segments = fetched.segments.len(), sample = fetched.is_sample(), "transcript ready");
            FetchTranscriptResponse {
                video_id,
                metadata,
                is_sample: fetched.is_sample(),
                transcript: fetched.segments,
                success: true,
                error: None,
            }
        }
        None => FetchTranscriptResponse {
            video_id,
            metadata,
            transcript: Vec::new(),
            success: false,
            is_sample: false,
            error: Some(NO_TRANSCRIPT.to_string()),
        },
    };
    Ok(Json(response))
}
