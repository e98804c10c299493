use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    error::ReasoningError,
    reasoning::{Prompt, ReasoningService},
    segmenter::Bucket,
    types::{Difficulty, ExplanationRecord},
};

/// How many earlier titles batch generation feeds back as context.
pub const PRIOR_CONTEXT_TITLES: usize = 2;

const EXCERPT_CHARS: usize = 50;

static EXPLANATION_SYSTEM_PROMPT: &str = r#"You are an expert programming instructor analyzing a coding tutorial video.
Explain what's happening at each timestamp to help beginners understand the decisions being made.
Focus on WHY the developer makes each choice, not just what they're doing.
Be concise but insightful.

You MUST output ONLY valid JSON matching this structure (no markdown, no explanation):
{
  "title": "Brief title (max 5 words)",
  "whyThisMatters": "Why this coding decision matters for beginners (1-2 sentences)",
  "whatsHappening": "Technical explanation of what's happening (1-2 sentences)",
  "keyPoint": "The single most important thing to remember (1 sentence)",
  "concepts": ["2-4", "searchable", "concepts"],
  "difficulty": "beginner|intermediate|advanced",
  "relatedTo": ["earlier M:SS timestamps this builds on, if any"],
  "codeExample": {"correct": "optional snippet", "incorrect": "optional common mistake", "language": "jsx"}
}"#;

/// Why a placeholder record was produced instead of a model answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackCause {
    /// No credential configured.
    Disabled,
    /// The single attempt failed.
    Failed,
    /// Nothing was said during the interval.
    Silent,
}

/// Deterministic placeholder explanation. Never fails.
pub fn fallback_explanation(timestamp: &str, text: &str, cause: FallbackCause) -> ExplanationRecord {
    let excerpt: String = text.chars().take(EXCERPT_CHARS).collect();
    let covers = format!("This section covers: \"{}...\"", excerpt);

    let (why_this_matters, whats_happening, key_point, concept) = match cause {
        FallbackCause::Disabled => (
            covers,
            "AI generation is disabled. Configure an API key to get a detailed explanation of this moment.",
            "AI explanations require a valid API key.",
            "tutorial",
        ),
        FallbackCause::Failed => (
            covers,
            "AI generation failed for this segment, so only the transcript excerpt is shown.",
            "Try again later or check your API key.",
            "error",
        ),
        FallbackCause::Silent => (
            excerpt,
            "There is no narration in this interval.",
            "Watch the code on screen; the instructor is not speaking here.",
            "tutorial",
        ),
    };

    ExplanationRecord {
        title: format!("Moment at {}", timestamp),
        timestamp: timestamp.to_string(),
        why_this_matters,
        whats_happening: whats_happening.to_string(),
        key_point: key_point.to_string(),
        concepts: vec![concept.to_string()],
        difficulty: Difficulty::Beginner,
        code_example: None,
        code_change: None,
        related_to: None,
    }
}

pub fn build_explanation_prompt(timestamp: &str, text: &str, prior_titles: &[String]) -> Prompt {
    let mut user = format!("At timestamp {}, the transcript says: \"{}\"", timestamp, text);
    if !prior_titles.is_empty() {
        user.push_str(&format!(
            "\n\nPrevious topics covered: {}",
            prior_titles.join(", ")
        ));
    }
    user.push_str("\n\nAnalyze this moment and provide a beginner-friendly explanation.");

    Prompt {
        system: EXPLANATION_SYSTEM_PROMPT.to_string(),
        user,
        json_output: true,
        temperature: 0.7,
        max_tokens: None,
    }
}

/// Models occasionally wrap JSON in a markdown fence despite being told not to.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value.as_array().map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}

/// Turn a model reply into a record, tolerating missing optional fields.
pub fn parse_explanation(timestamp: &str, content: &str) -> Result<ExplanationRecord, ReasoningError> {
    let value: Value = serde_json::from_str(strip_code_fence(content))?;
    if !value.is_object() {
        return Err(ReasoningError::invalid("reply is not a JSON object"));
    }

    let field = |name: &str| -> Result<String, ReasoningError> {
        value
            .get(name)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ReasoningError::invalid(format!("missing field `{}`", name)))
    };

    Ok(ExplanationRecord {
        title: field("title")?,
        timestamp: timestamp.to_string(),
        why_this_matters: field("whyThisMatters")?,
        whats_happening: field("whatsHappening")?,
        key_point: field("keyPoint")?,
        concepts: value.get("concepts").and_then(string_list).unwrap_or_default(),
        difficulty: value
            .get("difficulty")
            .and_then(Value::as_str)
            .map(Difficulty::from_label)
            .unwrap_or_default(),
        code_example: value
            .get("codeExample")
            .and_then(|v| serde_json::from_value(v.clone()).ok()),
        code_change: value
            .get("codeChange")
            .and_then(|v| serde_json::from_value(v.clone()).ok()),
        related_to: value
            .get("relatedTo")
            .and_then(string_list)
            .filter(|related| !related.is_empty()),
    })
}

/// Produces one explanation per interval. Every public method is total:
/// failures end in a fallback record, never an error.
#[derive(Clone)]
pub struct ExplanationGenerator {
    reasoner: Option<Arc<dyn ReasoningService>>,
}

impl ExplanationGenerator {
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

    pub fn is_enabled(&self) -> bool {
        self.reasoner.is_some()
    }

    pub async fn generate(
        &self,
        timestamp: &str,
        text: &str,
        prior_titles: &[String],
    ) -> ExplanationRecord {
        let Some(reasoner) = &self.reasoner else {
            return fallback_explanation(timestamp, text, FallbackCause::Disabled);
        };

        let prompt = build_explanation_prompt(timestamp, text, prior_titles);
        let outcome = reasoner
            .complete(&prompt)
            .await
            .and_then(|content| parse_explanation(timestamp, &content));

        match outcome {
            Ok(record) => {
                debug!(%timestamp, title = %record.title, "explanation generated");
                record
            }
            Err(e) => {
                warn!(%timestamp, error = %e, "explanation generation failed, using fallback");
                fallback_explanation(timestamp, text, FallbackCause::Failed)
            }
        }
    }

    /// Explain one bucket. Silent buckets skip the outbound call.
    pub async fn generate_for_bucket(
        &self,
        bucket: &Bucket,
        prior_titles: &[String],
    ) -> ExplanationRecord {
        let text = bucket.text();
        if text.is_empty() {
            let context = match prior_titles.last() {
                Some(title) => format!("Continuing from: {}", title),
                None => "Video segment without narration".to_string(),
            };
            return fallback_explanation(&bucket.key, &context, FallbackCause::Silent);
        }

        self.generate(&bucket.key, &text, prior_titles).await
    }
}
