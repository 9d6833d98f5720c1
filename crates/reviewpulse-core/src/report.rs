//! Enriched report rows and their conversion to an Arrow table.

use std::sync::Arc;

use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};

use crate::analysis::{Analysis, AnalysisRecord};
use crate::review::RawReview;
use crate::schema::report;

pub use crate::schema::report::COLUMNS as REPORT_COLUMNS;

/// Branch name used when the input row has none.
pub const UNKNOWN_BRANCH: &str = "Unknown Branch";

/// One target location from the input place list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    pub place_id: String,
    pub city: Option<String>,
    pub branch_name: String,
}

impl Place {
    /// Attach this place's metadata to records produced for it.
    pub fn annotate(&self, records: &mut [EnrichedRecord]) {
        for record in records {
            record.place_id = Some(self.place_id.clone());
            record.branch_name = Some(self.branch_name.clone());
            record.city = self.city.clone();
        }
    }
}

/// A review joined with its analysis and, once annotated, its place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub place_id: Option<String>,
    pub branch_name: Option<String>,
    pub city: Option<String>,
    pub review_date: Option<String>,
    pub review_text: Option<String>,
    /// Null when the provider attributed the review without a name.
    pub who_gave_the_review: Option<String>,
    /// `None` when the model's entry for this review failed validation.
    pub analysis: Option<AnalysisRecord>,
}

impl EnrichedRecord {
    pub fn from_review(review: &RawReview, analysis: Analysis) -> Self {
        Self {
            place_id: None,
            branch_name: None,
            city: None,
            review_date: review.review_date(),
            review_text: review.text().map(str::to_string),
            who_gave_the_review: review.reviewer().map(str::to_string),
            analysis: analysis.into_record(),
        }
    }
}

/// Build the report table. Always carries all [`REPORT_COLUMNS`], even for
/// zero records; missing values become nulls.
pub fn records_to_batch(records: &[EnrichedRecord]) -> Result<RecordBatch, ArrowError> {
    let columns: Vec<ArrayRef> = vec![
        text_column(records, |r| r.city.as_deref()),
        text_column(records, |r| r.branch_name.as_deref()),
        text_column(records, |r| r.review_date.as_deref()),
        text_column(records, |r| r.review_text.as_deref()),
        text_column(records, |r| r.who_gave_the_review.as_deref()),
        text_column(records, |r| {
            r.analysis.as_ref().map(|a| a.overall_sentiment.as_str())
        }),
        score_column(records, |a| a.sentiment_score),
        text_column(records, |r| r.analysis.as_ref().map(|a| a.primary_issue.as_str())),
        score_column(records, |a| a.severity),
        text_column(records, |r| r.analysis.as_ref().map(|a| a.summary.as_str())),
    ];

    RecordBatch::try_new(Arc::new(report::report_schema()), columns)
}

fn text_column<'a>(
    records: &'a [EnrichedRecord],
    value: impl Fn(&'a EnrichedRecord) -> Option<&'a str>,
) -> ArrayRef {
    Arc::new(records.iter().map(value).collect::<StringArray>())
}

fn score_column(records: &[EnrichedRecord], value: impl Fn(&AnalysisRecord) -> u8) -> ArrayRef {
    Arc::new(
        records
            .iter()
            .map(|r| r.analysis.as_ref().map(|a| i64::from(value(a))))
            .collect::<Int64Array>(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{PrimaryIssue, Sentiment};
    use arrow::array::Array;

    fn record(analysis: Option<AnalysisRecord>) -> EnrichedRecord {
        EnrichedRecord {
            place_id: None,
            branch_name: None,
            city: None,
            review_date: Some("2024-03-01 10:00:00".into()),
            review_text: Some("Friendly staff".into()),
            who_gave_the_review: Some("Asha".into()),
            analysis,
        }
    }

    fn positive() -> AnalysisRecord {
        AnalysisRecord {
            overall_sentiment: Sentiment::Positive,
            sentiment_score: 5,
            primary_issue: PrimaryIssue::PositiveFeedback,
            severity: 1,
            summary: "Happy with service".into(),
        }
    }

    #[test]
    fn empty_report_keeps_all_columns() {
        let batch = records_to_batch(&[]).unwrap();
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.num_columns(), REPORT_COLUMNS.len());
        let names: Vec<String> = batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        assert_eq!(names, REPORT_COLUMNS.map(String::from));
    }

    #[test]
    fn annotate_sets_place_columns() {
        let place = Place {
            place_id: "ChIJ123".into(),
            city: Some("Chennai".into()),
            branch_name: "Anna Nagar".into(),
        };
        let mut records = vec![record(Some(positive())), record(None)];
        place.annotate(&mut records);
        assert!(records.iter().all(|r| r.place_id.as_deref() == Some("ChIJ123")));
        assert!(records.iter().all(|r| r.city.as_deref() == Some("Chennai")));
        assert!(records.iter().all(|r| r.branch_name.as_deref() == Some("Anna Nagar")));
    }

    #[test]
    fn missing_values_are_null() {
        let batch = records_to_batch(&[record(Some(positive())), record(None)]).unwrap();
        assert_eq!(batch.num_rows(), 2);

        let city = batch.column_by_name("city").unwrap();
        assert_eq!(city.null_count(), 2);

        let summary = batch
            .column_by_name("summary")
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(summary.value(0), "Happy with service");
        assert!(summary.is_null(1));

        let severity = batch
            .column_by_name("severity")
            .unwrap()
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(severity.value(0), 1);
        assert!(severity.is_null(1));

        let author = batch
            .column_by_name("who_gave_the_review")
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(author.value(1), "Asha");
    }

    #[test]
    fn unnamed_attribution_gives_null_reviewer() {
        let attributed: RawReview =
            serde_json::from_str(r#"{ "authorAttribution": { "uri": "x" }, "text": "Fine" }"#)
                .unwrap();
        let flat: RawReview = serde_json::from_str(r#"{ "text": "Fine" }"#).unwrap();
        let records = [
            EnrichedRecord::from_review(&attributed, Analysis::Classified(positive())),
            EnrichedRecord::from_review(&flat, Analysis::Classified(positive())),
        ];
        assert!(records[0].who_gave_the_review.is_none());
        assert_eq!(records[1].who_gave_the_review.as_deref(), Some("Anonymous"));

        let batch = records_to_batch(&records).unwrap();
        let author = batch
            .column_by_name("who_gave_the_review")
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert!(author.is_null(0));
        assert_eq!(author.value(1), "Anonymous");
    }
}
