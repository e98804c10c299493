use std::sync::Arc;

use tracing::{debug, warn};

use crate::reasoning::{Prompt, ReasoningService};

pub const MISSING_KEY_ANSWER: &str =
    "Please add your API key to the .env file to enable AI responses.";
pub const FAILED_ANSWER: &str = "Sorry, I couldn't process your question. Please try again.";

const QUESTION_MAX_TOKENS: u32 = 200;

static QUESTION_SYSTEM_PROMPT: &str = "You are a helpful programming instructor answering questions about a coding tutorial video. \
Be concise, friendly, and focus on explaining the \"why\" behind coding decisions. Keep answers under 150 words.";

/// What the viewer was watching when the question was asked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionContext {
    pub recent_transcript: Option<String>,
    pub current_explanation: Option<String>,
}

pub fn build_question_prompt(question: &str, timestamp: &str, context: &QuestionContext) -> Prompt {
    let mut user = format!(
        "At timestamp {} of the tutorial, a student asks: \"{}\"",
        timestamp, question
    );
    if let Some(transcript) = context.recent_transcript.as_deref().filter(|t| !t.is_empty()) {
        user.push_str(&format!("\n\nRecent transcript: \"{}\"", transcript));
    }
    if let Some(explanation) = context.current_explanation.as_deref().filter(|e| !e.is_empty()) {
        user.push_str(&format!("\n\nCurrent explanation: {}", explanation));
    }
    user.push_str("\n\nProvide a clear, beginner-friendly answer.");

    Prompt {
        system: QUESTION_SYSTEM_PROMPT.to_string(),
        user,
        json_output: false,
        temperature: 0.7,
        max_tokens: Some(QUESTION_MAX_TOKENS),
    }
}

/// Free-form answers to viewer questions. Always returns some text.
#[derive(Clone)]
pub struct QuestionAnswerer {
    reasoner: Option<Arc<dyn ReasoningService>>,
}

impl QuestionAnswerer {
    pub fn new(reasoner: Arc<dyn ReasoningService>) -> Self {
        Self {
            reasoner: Some(reasoner),
        }
    }

    pub fn disabled() -> Self {
        Self { reasoner: None }
    }

    pub fn from_optional(reasoner: Option<Arc<dyn ReasoningService>>) -> Self {
        Self { reasoner }
    }

    pub async fn answer(&self, question: &str, timestamp: &str, context: &QuestionContext) -> String {
        let Some(reasoner) = &self.reasoner else {
            return MISSING_KEY_ANSWER.to_string();
        };

        let prompt = build_question_prompt(question, timestamp, context);
        match reasoner.complete(&prompt).await {
            Ok(answer) if !answer.trim().is_empty() => {
                debug!(%timestamp, chars = answer.len(), "question answered");
                answer.trim().to_string()
            }
            Ok(_) => {
                warn!(%timestamp, "reasoning service returned an empty answer");
                FAILED_ANSWER.to_string()
            }
            Err(e) => {
                warn!(%timestamp, error = %e, "question answering failed");
                FAILED_ANSWER.to_string()
            }
        }
    }
}
