use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::{error::ReasoningError, provider::Provider};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A single chat exchange sent to the reasoning service.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
    /// Ask the model for a JSON object instead of free text.
    pub json_output: bool,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

/// Text-in/text-out language model. One call, no retries, no streaming.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReasoningService: Send + Sync {
    async fn complete(&self, prompt: &Prompt) -> Result<String, ReasoningError>;

    /// Cheap authenticated request used to report whether the service is reachable.
    async fn probe(&self) -> Result<(), ReasoningError>;
}

/// OpenAI-compatible `/chat/completions` client.
pub struct ChatCompletionsClient {
    client: reqwest::Client,
    api_url: String,
    models_url: String,
    model: String,
    api_key: String,
}

impl ChatCompletionsClient {
    pub fn new(
        api_url: impl Into<String>,
        models_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ReasoningError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url: api_url.into(),
            models_url: models_url.into(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    /// Build a client for `provider` using the credential from its env var.
    pub fn for_provider(
        provider: Provider,
        model: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ReasoningError> {
        let config = provider.config();
        let api_key = provider.validate_api_key()?;
        Self::new(
            config.api_url,
            config.models_url,
            model.unwrap_or_else(|| config.model.to_string()),
            api_key,
            timeout,
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

fn classify(err: reqwest::Error) -> ReasoningError {
    if err.is_timeout() {
        ReasoningError::Timeout
    } else {
        ReasoningError::Http(err)
    }
}

#[async_trait]
impl ReasoningService for ChatCompletionsClient {
    async fn complete(&self, prompt: &Prompt) -> Result<String, ReasoningError> {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": prompt.system,
                },
                {
                    "role": "user",
                    "content": prompt.user,
                },
            ],
            "temperature": prompt.temperature,
        });
        if prompt.json_output {
            body["response_format"] = serde_json::json!({ "type": "json_object" });
        }
        if let Some(max_tokens) = prompt.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        let response = self
            .client
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReasoningError::Status {
                status: status.as_u16(),
            });
        }

        let response = response
            .json::<serde_json::Value>()
            .await
            .map_err(classify)?;

        // Extract content from response
        let content = response["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| ReasoningError::invalid(format!("no message content in {}", response)))?;

        debug!(model = %self.model, chars = content.len(), "reasoning service replied");
        Ok(content.to_string())
    }

    async fn probe(&self) -> Result<(), ReasoningError> {
        let response = self
            .client
            .get(&self.models_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(classify)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ReasoningError::Status {
                status: response.status().as_u16(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::StatusCode, routing::post};
    use tokio::net::TcpListener;

    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn prompt() -> Prompt {
        Prompt {
            system: "system".to_string(),
            user: "user".to_string(),
            json_output: true,
            temperature: 0.7,
            max_tokens: None,
        }
    }

    fn client(base: &str, timeout: Duration) -> ChatCompletionsClient {
        ChatCompletionsClient::new(
            format!("{}/v1/chat/completions", base),
            format!("{}/v1/models", base),
            "test-model",
            "sk-test",
            timeout,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn returns_message_content_and_sends_json_mode() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["model"], "test-model");
                assert_eq!(body["response_format"]["type"], "json_object");
                assert_eq!(body["messages"][1]["content"], "user");
                Json(serde_json::json!({
                    "choices": [{ "message": { "content": "{\"title\":\"ok\"}" } }]
                }))
            }),
        );
        let base = serve(router).await;

        let content = client(&base, DEFAULT_REQUEST_TIMEOUT)
            .complete(&prompt())
            .await
            .unwrap();
        assert_eq!(content, "{\"title\":\"ok\"}");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let base = serve(router).await;

        let err = client(&base, DEFAULT_REQUEST_TIMEOUT)
            .complete(&prompt())
            .await
            .unwrap_err();
        assert!(matches!(err, ReasoningError::Status { status: 500 }));
    }

    #[tokio::test]
    async fn body_without_choices_is_invalid() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { Json(serde_json::json!({ "unexpected": true })) }),
        );
        let base = serve(router).await;

        let err = client(&base, DEFAULT_REQUEST_TIMEOUT)
            .complete(&prompt())
            .await
            .unwrap_err();
        assert!(matches!(err, ReasoningError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                "late"
            }),
        );
        let base = serve(router).await;

        let err = client(&base, Duration::from_millis(100))
            .complete(&prompt())
            .await
            .unwrap_err();
        assert!(matches!(err, ReasoningError::Timeout));
    }
}
