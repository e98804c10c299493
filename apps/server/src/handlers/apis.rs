use axum::{Json, extract::State};
use serde::Serialize;
use walkthrough_core::{MetadataError, ReasoningError};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ApiCheck {
    pub ai: bool,
    pub youtube: bool,
    pub messages: Vec<String>,
}

/// Probe the reasoning provider and the YouTube Data API with the configured keys.
pub async fn check_apis(State(state): State<AppState>) -> Json<ApiCheck> {
    let mut messages = Vec::new();
    let provider = state.provider.name();

    let ai = match &state.reasoner {
        None => {
            messages.push(format!("{} API key not configured", provider));
            false
        }
        Some(reasoner) => match reasoner.probe().await {
            Ok(()) => true,
            Err(ReasoningError::Status { status }) => {
                messages.push(format!("{} API error: {}", provider, status));
                false
            }
            Err(_) => {
                messages.push(format!("{} API connection failed", provider));
                false
            }
        },
    };

    let youtube = if !state.metadata.is_configured() {
        messages.push("YouTube API key not configured (optional)".to_string());
        false
    } else {
        match state.metadata.probe().await {
            Ok(()) => true,
            Err(MetadataError::Api { message }) => {
                messages.push(format!("YouTube API error: {}", message));
                false
            }
            Err(_) => {
                messages.push("YouTube API connection failed".to_string());
                false
            }
        }
    };

    Json(ApiCheck {
        ai,
        youtube,
        messages,
    })
}
