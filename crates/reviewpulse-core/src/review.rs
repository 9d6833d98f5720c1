//! Provider-native review records as returned by the Places API.
//!
//! The v1 API and the legacy API disagree on field shapes, so the record
//! accepts both and the accessors hide the difference.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author shown in the report when the provider gives no name.
pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

const PUBLISH_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
const REVIEW_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Review body: nested `{ "text": ..., "languageCode": ... }` (v1) or a flat string (legacy).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReviewText {
    Plain(String),
    Localized { text: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorAttribution {
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
}

/// A single review as fetched from the provider. Never mutated after fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawReview {
    pub rating: Option<u8>,
    pub text: Option<ReviewText>,
    #[serde(rename = "authorAttribution")]
    pub author_attribution: Option<AuthorAttribution>,
    pub author_name: Option<String>,
    #[serde(
        rename = "relativePublishTimeDescription",
        alias = "relative_time_description"
    )]
    pub relative_time: Option<String>,
    /// ISO 8601 timestamp string, e.g. `2024-03-01T10:00:00Z`.
    #[serde(rename = "publishTime")]
    pub publish_time: Option<String>,
}

impl RawReview {
    pub fn text(&self) -> Option<&str> {
        match self.text.as_ref()? {
            ReviewText::Plain(text) => Some(text),
            ReviewText::Localized { text } => text.as_deref(),
        }
    }

    /// Author name. An `authorAttribution` block takes precedence over the
    /// flat `author_name`, even when it carries no display name.
    pub fn author(&self) -> Option<&str> {
        match &self.author_attribution {
            Some(attribution) => attribution.display_name.as_deref(),
            None => self.author_name.as_deref(),
        }
    }

    /// Name for the report row. Only the flat shape falls back to
    /// [`ANONYMOUS_AUTHOR`]; an attribution block without a display name
    /// yields `None`.
    pub fn reviewer(&self) -> Option<&str> {
        match &self.author_attribution {
            Some(attribution) => attribution.display_name.as_deref(),
            None => Some(self.author_name.as_deref().unwrap_or(ANONYMOUS_AUTHOR)),
        }
    }

    /// Human-readable publish time, e.g. "a month ago".
    pub fn relative_time(&self) -> Option<&str> {
        self.relative_time.as_deref()
    }

    /// Publish time rendered for the report, see [`format_review_date`].
    pub fn review_date(&self) -> Option<String> {
        self.publish_time.as_deref().map(format_review_date)
    }
}

/// Render a provider timestamp as `YYYY-MM-DD HH:MM:SS` (UTC).
///
/// Accepts `YYYY-MM-DDTHH:MM:SSZ` and other RFC 3339 forms (fractional
/// seconds, explicit offsets). Anything that does not parse is returned
/// unchanged.
pub fn format_review_date(raw: &str) -> String {
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, PUBLISH_TIME_FORMAT) {
        return dt.format(REVIEW_DATE_FORMAT).to_string();
    }
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt
            .with_timezone(&Utc)
            .format(REVIEW_DATE_FORMAT)
            .to_string(),
        Err(_) => raw.to_string(),
    }
}
