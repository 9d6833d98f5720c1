//! Batch extraction: prompt → model → validated analyses.
//!
//! Model output is untrusted text. The response may be wrapped in a
//! markdown code fence, and entries may be missing, reordered, or
//! malformed. The top level must be a JSON array; each element is
//! validated on its own (see [`ExtractedEntry::from_value`]).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reviewpulse_core::{ExtractedEntry, ReviewBatch};
use serde_json::Value;
use tracing::{debug, warn};

use crate::ExtractionError;
use crate::prompt::build_prompt;
use crate::throttle::Throttle;

/// A text-in/text-out language model.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ExtractionError>;
}

/// Remove a surrounding ```` ```json ```` / ```` ``` ```` fence, if any.
pub fn strip_code_fences(response: &str) -> &str {
    let trimmed = response.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```JSON"))
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Parse a model response into one entry per array element, in response order.
pub fn parse_analyses(response: &str) -> Result<Vec<ExtractedEntry>, ExtractionError> {
    let value: Value = serde_json::from_str(strip_code_fences(response))?;
    let Value::Array(items) = value else {
        return Err(ExtractionError::NotAnArray(match value {
            Value::Object(_) => "an object",
            Value::String(_) => "a string",
            Value::Number(_) => "a number",
            Value::Bool(_) => "a boolean",
            _ => "null",
        }));
    };
    Ok(items.iter().map(ExtractedEntry::from_value).collect())
}

/// Runs one model call per batch under a shared throttle and a per-call timeout.
#[derive(Clone)]
pub struct Extractor {
    model: Arc<dyn CompletionModel>,
    throttle: Throttle,
    timeout: Duration,
}

impl Extractor {
    pub fn new(model: Arc<dyn CompletionModel>, throttle: Throttle, timeout: Duration) -> Self {
        Self {
            model,
            throttle,
            timeout,
        }
    }

    /// Analyse one batch. Any failure (transport, timeout, unparsable
    /// response) is returned as an error; the caller decides to skip.
    pub async fn extract(
        &self,
        batch: &ReviewBatch<'_>,
    ) -> Result<Vec<ExtractedEntry>, ExtractionError> {
        let prompt = build_prompt(batch)?;

        self.throttle.until_ready().await;
        let response = tokio::time::timeout(self.timeout, self.model.complete(&prompt))
            .await
            .map_err(|_| ExtractionError::Timeout(self.timeout))??;

        let entries = parse_analyses(&response).inspect_err(|e| {
            let preview: String = response.chars().take(200).collect();
            warn!(batch = batch.index, error = %e, raw = %preview, "unparsable model response");
        })?;
        debug!(
            batch = batch.index,
            reviews = batch.len(),
            entries = entries.len(),
            "batch analysed"
        );
        Ok(entries)
    }
}
