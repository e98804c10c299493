use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;
use walkthrough_core::{
    ExplanationRecord, GenerationMode, PlaybackSnapshot, Session, format_timestamp,
};

use super::{
    analyze::{interval_or_default, require_video_id},
    explanation::{AnswerResponse, require_question},
};
use crate::{
    error::{ApiError, ApiJson, ApiResult},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub video_id: Option<String>,
    pub interval_seconds: Option<u32>,
    #[serde(default)]
    pub mode: GenerationMode,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub video_id: String,
    pub transcript_available: bool,
    pub is_sample: bool,
    pub explanations: Vec<ExplanationRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickRequest {
    pub current_time: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionAskRequest {
    pub question: String,
    #[serde(default)]
    pub current_time: f64,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct ExplanationsResponse {
    pub explanations: Vec<ExplanationRecord>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<ExplanationRecord>,
}

fn playback_time(seconds: f64) -> ApiResult<f64> {
    if seconds.is_finite() && seconds >= 0.0 {
        Ok(seconds)
    } else {
        Err(ApiError::bad_request("currentTime must be a non-negative number"))
    }
}

#[instrument(skip_all)]
pub async fn create_session(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateSessionRequest>,
) -> ApiResult<(StatusCode, Json<CreateSessionResponse>)> {
    let video_id = require_video_id(request.video_id.as_deref())?;
    let interval = interval_or_default(request.interval_seconds, state.default_interval)?;

    let fetched = state.transcripts.fetch(&video_id).await;
    let is_sample = fetched.as_ref().is_some_and(|f| f.is_sample());
    let segments = fetched.map(|f| f.segments).unwrap_or_default();
    let transcript_available = !segments.is_empty();

    let session = Session::new(video_id.clone(), segments, interval, state.generator.clone());
    session.seed(request.mode).await;
    state.insert_session(session.clone());
    info!(
        session = %session.id(),
        %video_id,
        mode = ?request.mode,
        live_sessions = state.session_count(),
        "session created"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id: session.id(),
            video_id,
            transcript_available,
            is_sample,
            explanations: session.explanations(),
        }),
    ))
}

pub async fn tick(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<TickRequest>,
) -> ApiResult<Json<PlaybackSnapshot>> {
    let current_time = playback_time(request.current_time)?;
    let session = state.session(id)?;
    // The generation task, if any, keeps running detached.
    let tick = session.tick(current_time);
    Ok(Json(tick.snapshot))
}

pub async fn explanations(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ExplanationsResponse>> {
    let session = state.session(id)?;
    Ok(Json(ExplanationsResponse {
        explanations: session.explanations(),
    }))
}

pub async fn search(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<SearchResponse>> {
    let session = state.session(id)?;
    let results = session.search(&params.q);
    Ok(Json(SearchResponse {
        query: params.q,
        results,
    }))
}

#[instrument(skip_all)]
pub async fn ask(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<SessionAskRequest>,
) -> ApiResult<Json<AnswerResponse>> {
    let current_time = playback_time(request.current_time)?;
    let question = require_question(&request.question)?;
    let session = state.session(id)?;

    let context = session.question_context(current_time);
    let answer = state
        .answerer
        .answer(question, &format_timestamp(current_time), &context)
        .await;
    Ok(Json(AnswerResponse { answer }))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    let session = state.remove_session(id)?;
    info!(session = %session.id(), "session closed");
    Ok(StatusCode::NO_CONTENT)
}
