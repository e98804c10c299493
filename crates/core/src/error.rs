use thiserror::Error;

use crate::provider::ProviderError;

/// Failure of a single reasoning-service round trip.
#[derive(Error, Debug)]
pub enum ReasoningError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Request timed out")]
    Timeout,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned status {status}")]
    Status { status: u16 },

    #[error("Invalid API response: {reason}")]
    InvalidResponse { reason: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReasoningError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        ReasoningError::InvalidResponse {
            reason: reason.into(),
        }
    }
}

/// Failure of one transcript acquisition strategy.
#[derive(Error, Debug)]
pub enum TranscriptError {
    #[error("{strategy} request failed: {source}")]
    Request {
        strategy: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{strategy} returned status {status}")]
    Status { strategy: &'static str, status: u16 },

    #[error("{strategy} found no caption tracks for {video_id}")]
    NoCaptions {
        strategy: &'static str,
        video_id: String,
    },

    #[error("{strategy} could not parse response: {reason}")]
    Parse {
        strategy: &'static str,
        reason: String,
    },
}

impl TranscriptError {
    pub fn request(strategy: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| TranscriptError::Request { strategy, source }
    }
}

/// Failure of a YouTube Data API lookup.
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("YouTube API key is not configured")]
    NotConfigured,

    #[error("YouTube API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("YouTube API error: {message}")]
    Api { message: String },

    #[error("Video {video_id} not found")]
    NotFound { video_id: String },
}
