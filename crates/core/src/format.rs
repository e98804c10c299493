use crate::types::{ExplanationRecord, TranscriptSegment};

/// Format seconds as M:SS timestamp
pub fn format_timestamp(seconds: f64) -> String {
    let seconds = if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    };
    let mins = (seconds / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    format!("{}:{:02}", mins, secs)
}

/// Parse an M:SS timestamp into whole seconds.
///
/// Anything that is not exactly two integer parts yields `0`.
pub fn parse_timestamp(display: &str) -> u64 {
    let mut parts = display.split(':');
    let (Some(mins), Some(secs), None) = (parts.next(), parts.next(), parts.next()) else {
        return 0;
    };

    match (mins.trim().parse::<u64>(), secs.trim().parse::<u64>()) {
        (Ok(mins), Ok(secs)) => mins
            .checked_mul(60)
            .and_then(|m| m.checked_add(secs))
            .unwrap_or(0),
        _ => 0,
    }
}

/// Join segment texts with single spaces, in order.
pub fn concatenate_text(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|seg| seg.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Format explanations as human-readable markdown
pub fn format_explanations_readable(explanations: &[ExplanationRecord]) -> String {
    let mut output = String::new();

    for explanation in explanations {
        output.push_str(&format!(
            "### [{}] {}\n\n",
            explanation.timestamp, explanation.title
        ));
        output.push_str(&format!(
            "**Difficulty:** {}",
            explanation.difficulty.as_str()
        ));
        if !explanation.concepts.is_empty() {
            output.push_str(&format!(" | **Concepts:** {}", explanation.concepts.join(", ")));
        }
        output.push_str("\n\n");

        output.push_str(&format!("**Why this matters:** {}\n\n", explanation.why_this_matters));
        output.push_str(&format!("**What's happening:** {}\n\n", explanation.whats_happening));
        output.push_str(&format!("**Key point:** {}\n\n", explanation.key_point));

        if let Some(example) = &explanation.code_example {
            output.push_str(&format!("```{}\n{}\n```\n\n", example.language, example.correct));
        }
    }

    output
}
