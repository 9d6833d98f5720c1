pub mod analysis;
pub mod batch;
pub mod config;
pub mod reconcile;
pub mod report;
pub mod review;
pub mod schema;

pub use analysis::{Analysis, AnalysisRecord, ExtractedEntry, PrimaryIssue, Sentiment};
pub use batch::{ReviewBatch, batch_count, batches};
pub use config::{CityFilter, ConfigError, ConfigLayer, ReportFormat, RunConfig};
pub use reconcile::{LengthMismatch, Pairing, Reconciled, reconcile};
pub use report::{EnrichedRecord, Place, REPORT_COLUMNS, records_to_batch};
pub use review::{RawReview, ReviewText, format_review_date};
