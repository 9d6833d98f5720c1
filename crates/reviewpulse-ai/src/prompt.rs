//! Prompt construction for batch review analysis.

use reviewpulse_core::ReviewBatch;
use serde::Serialize;

// ── Prompt template ──

pub const SYSTEM_PROMPT: &str = "\
You are a data processing system.

Your task is to analyze customer reviews of lending branches and return structured output.

STRICT RULES:
- Output ONLY a valid JSON array. No markdown fences, no explanation, no headings.
- Return exactly one object per review, in the same order as the input.
- The output must be directly parsable as JSON.

For each review, return an object with exactly these fields:
- review_index: the review_index of the input review, copied unchanged
- overall_sentiment: \"positive\" | \"neutral\" | \"negative\"
- sentiment_score: integer (1 to 5)
- primary_issue: one of [
  \"service_quality\",
  \"processing_time\",
  \"interest_rate\",
  \"customer_support\",
  \"loan_closure\",
  \"transparency\",
  \"positive_feedback\",
  \"other\"
]
- severity: integer (1 to 5)
- summary: short one-line summary";

/// Minimal, provider-agnostic view of a review sent to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewProjection<'a> {
    /// Batch-local position; the model echoes it back for correlation.
    pub review_index: usize,
    pub author_name: Option<&'a str>,
    pub rating: Option<u8>,
    pub text: Option<&'a str>,
    pub relative_time_description: Option<&'a str>,
}

/// Project a batch in its original order.
pub fn project_batch<'a>(batch: &ReviewBatch<'a>) -> Vec<ReviewProjection<'a>> {
    batch
        .iter()
        .map(|(review_index, review)| ReviewProjection {
            review_index,
            author_name: review.author(),
            rating: review.rating,
            text: review.text(),
            relative_time_description: review.relative_time(),
        })
        .collect()
}

/// Full request text: fixed instructions followed by the projected batch.
pub fn build_prompt(batch: &ReviewBatch<'_>) -> Result<String, serde_json::Error> {
    let reviews = serde_json::to_string_pretty(&project_batch(batch))?;
    Ok(format!("{SYSTEM_PROMPT}\n\nReviews Data:\n{reviews}"))
}
