use std::num::NonZeroU32;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use walkthrough_core::{ExplanationRecord, extract_video_id, generate_explanations};

use crate::{
    error::{ApiError, ApiJson, ApiResult},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub video_id: Option<String>,
    pub interval_seconds: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub success: bool,
    pub video_id: String,
    pub explanation_count: usize,
    pub explanations: Vec<ExplanationRecord>,
    pub has_ai: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeStatus {
    pub status: &'static str,
    pub has_ai: bool,
    pub message: String,
}

/// A URL or a bare id; anything else is taken verbatim.
pub(crate) fn require_video_id(raw: Option<&str>) -> ApiResult<String> {
    let raw = raw
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("Video ID is required"))?;
    Ok(extract_video_id(raw).unwrap_or_else(|| raw.to_string()))
}

pub(crate) fn interval_or_default(
    requested: Option<u32>,
    default: NonZeroU32,
) -> ApiResult<NonZeroU32> {
    match requested {
        None => Ok(default),
        Some(seconds) => NonZeroU32::new(seconds)
            .ok_or_else(|| ApiError::bad_request("intervalSeconds must be greater than zero")),
    }
}

pub async fn status(State(state): State<AppState>) -> Json<AnalyzeStatus> {
    let message = if state.has_ai() {
        "AI analysis is enabled".to_string()
    } else {
        let env_var = state.provider.config().env_var;
        format!("Add {} to enable AI analysis", env_var)
    };
    Json(AnalyzeStatus {
        status: "ready",
        has_ai: state.has_ai(),
        message,
    })
}

#[instrument(skip_all, fields(video_id))]
pub async fn analyze(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AnalyzeRequest>,
) -> ApiResult<Json<AnalyzeResponse>> {
    let video_id = require_video_id(request.video_id.as_deref())?;
    let interval = interval_or_default(request.interval_seconds, state.default_interval)?;
    tracing::Span::current().record("video_id", video_id.as_str());

    let transcript = state
        .transcripts
        .fetch(&video_id)
        .await
        .map(|fetched| fetched.segments)
        .unwrap_or_default();
    let explanations = generate_explanations(&state.generator, &transcript, interval).await;

    Ok(Json(AnalyzeResponse {
        success: true,
        video_id,
        explanation_count: explanations.len(),
        explanations,
        has_ai: state.has_ai(),
    }))
}
