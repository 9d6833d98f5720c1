//! Structured review analysis and validation of untrusted model output.
//!
//! The model is asked for one JSON object per review. Nothing guarantees it
//! complies, so every entry is validated field by field: a conforming entry
//! becomes [`Analysis::Classified`], anything else becomes
//! [`Analysis::Unclassified`] with the reason, keeping its slot in the batch.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

const SCORE_RANGE: std::ops::RangeInclusive<i64> = 1..=5;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown {kind} {value:?}")]
pub struct UnknownLabel {
    kind: &'static str,
    value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Self::Positive, Self::Neutral, Self::Negative];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }
}

impl FromStr for Sentiment {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownLabel {
                kind: "overall_sentiment",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of complaint/praise categories for lending-branch reviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryIssue {
    ServiceQuality,
    ProcessingTime,
    InterestRate,
    CustomerSupport,
    LoanClosure,
    Transparency,
    PositiveFeedback,
    Other,
}

impl PrimaryIssue {
    pub const ALL: [PrimaryIssue; 8] = [
        Self::ServiceQuality,
        Self::ProcessingTime,
        Self::InterestRate,
        Self::CustomerSupport,
        Self::LoanClosure,
        Self::Transparency,
        Self::PositiveFeedback,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ServiceQuality => "service_quality",
            Self::ProcessingTime => "processing_time",
            Self::InterestRate => "interest_rate",
            Self::CustomerSupport => "customer_support",
            Self::LoanClosure => "loan_closure",
            Self::Transparency => "transparency",
            Self::PositiveFeedback => "positive_feedback",
            Self::Other => "other",
        }
    }
}

impl FromStr for PrimaryIssue {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownLabel {
                kind: "primary_issue",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for PrimaryIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated per-review analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub overall_sentiment: Sentiment,
    /// 1 (very negative) to 5 (very positive).
    pub sentiment_score: u8,
    pub primary_issue: PrimaryIssue,
    /// 1 (minor) to 5 (critical).
    pub severity: u8,
    pub summary: String,
}

impl AnalysisRecord {
    fn from_object(obj: &Map<String, Value>) -> Result<Self, String> {
        Ok(Self {
            overall_sentiment: label_field(obj, "overall_sentiment")?,
            sentiment_score: score_field(obj, "sentiment_score")?,
            primary_issue: label_field(obj, "primary_issue")?,
            severity: score_field(obj, "severity")?,
            summary: obj
                .get("summary")
                .and_then(Value::as_str)
                .ok_or_else(|| "missing or non-string `summary`".to_string())?
                .trim()
                .to_string(),
        })
    }
}

/// Outcome of validating one model output entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Analysis {
    Classified(AnalysisRecord),
    /// Structurally invalid entry; the review is kept with empty analysis columns.
    Unclassified { reason: String },
}

impl Analysis {
    pub fn record(&self) -> Option<&AnalysisRecord> {
        match self {
            Self::Classified(record) => Some(record),
            Self::Unclassified { .. } => None,
        }
    }

    pub fn into_record(self) -> Option<AnalysisRecord> {
        match self {
            Self::Classified(record) => Some(record),
            Self::Unclassified { .. } => None,
        }
    }

    pub fn is_classified(&self) -> bool {
        matches!(self, Self::Classified(_))
    }
}

/// One entry of the model's response array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedEntry {
    /// Batch-local review index echoed by the model, when present and well-formed.
    pub review_index: Option<usize>,
    pub analysis: Analysis,
}

impl ExtractedEntry {
    /// Validate a single JSON value. Never fails: invalid input yields
    /// [`Analysis::Unclassified`].
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self {
                review_index: None,
                analysis: Analysis::Unclassified {
                    reason: format!("expected a JSON object, got {}", json_kind(value)),
                },
            };
        };

        let review_index = obj
            .get("review_index")
            .and_then(whole_number)
            .and_then(|n| usize::try_from(n).ok());

        let analysis = match AnalysisRecord::from_object(obj) {
            Ok(record) => Analysis::Classified(record),
            Err(reason) => Analysis::Unclassified { reason },
        };

        Self {
            review_index,
            analysis,
        }
    }
}

fn label_field<T>(obj: &Map<String, Value>, key: &str) -> Result<T, String>
where
    T: FromStr<Err = UnknownLabel>,
{
    obj.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("missing or non-string `{key}`"))?
        .parse()
        .map_err(|e: UnknownLabel| e.to_string())
}

fn score_field(obj: &Map<String, Value>, key: &str) -> Result<u8, String> {
    let n = obj
        .get(key)
        .and_then(whole_number)
        .ok_or_else(|| format!("missing or non-integer `{key}`"))?;
    if !SCORE_RANGE.contains(&n) {
        return Err(format!("`{key}` out of range 1-5: {n}"));
    }
    Ok(n as u8)
}

/// Integers, and floats with no fractional part (models sometimes emit `4.0`).
fn whole_number(v: &Value) -> Option<i64> {
    v.as_i64().or_else(|| {
        v.as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
