use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model API returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("model call timed out after {0:?}")]
    Timeout(Duration),

    #[error("model returned no text")]
    EmptyResponse,

    #[error("expected a JSON array of analyses, got {0}")]
    NotAnArray(&'static str),
}
