use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use walkthrough_core::{ExplanationRecord, QuestionContext};

use crate::{
    error::{ApiError, ApiJson, ApiResult},
    state::AppState,
};

/// Earlier topics, either as a list of titles or one comma-separated string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PreviousContext {
    Titles(Vec<String>),
    Text(String),
}

impl PreviousContext {
    fn into_titles(self) -> Vec<String> {
        let titles = match self {
            PreviousContext::Titles(titles) => titles,
            PreviousContext::Text(text) => text.split(',').map(str::to_string).collect(),
        };
        titles
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateExplanationRequest {
    pub timestamp: String,
    #[serde(default)]
    pub transcript: String,
    pub previous_context: Option<PreviousContext>,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub answer: String,
}

pub(crate) fn require_question(question: &str) -> ApiResult<&str> {
    let question = question.trim();
    if question.is_empty() {
        return Err(ApiError::bad_request("Question is required"));
    }
    Ok(question)
}

#[instrument(skip_all)]
pub async fn generate_explanation(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<GenerateExplanationRequest>,
) -> ApiResult<Json<ExplanationRecord>> {
    let timestamp = request.timestamp.trim();
    if timestamp.is_empty() {
        return Err(ApiError::bad_request("timestamp is required"));
    }
    let prior = request
        .previous_context
        .map(PreviousContext::into_titles)
        .unwrap_or_default();

    let record = state
        .generator
        .generate(timestamp, request.transcript.trim(), &prior)
        .await;
    Ok(Json(record))
}

#[instrument(skip_all)]
pub async fn ask_ai(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AskRequest>,
) -> ApiResult<Json<AnswerResponse>> {
    let question = require_question(&request.question)?;
    let answer = state
        .answerer
        .answer(question, &request.timestamp, &QuestionContext::default())
        .await;
    Ok(Json(AnswerResponse { answer }))
}
