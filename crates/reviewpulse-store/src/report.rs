//! Report output: one Arrow table written as CSV or Parquet.

use std::fs::File;
use std::path::Path;

use arrow::csv::WriterBuilder;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use reviewpulse_core::ReportFormat;
use tracing::info;

use crate::StoreError;

/// Write the report, replacing any existing file. The CSV header is written
/// even when the table has no rows; nulls become empty cells.
pub fn write_report(
    path: &Path,
    batch: &RecordBatch,
    format: ReportFormat,
) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;

    match format {
        ReportFormat::Csv => {
            let mut writer = WriterBuilder::new().with_header(true).build(file);
            writer.write(batch)?;
        }
        ReportFormat::Parquet => {
            let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
            writer.write(batch)?;
            writer.close()?;
        }
    }

    info!(
        path = %path.display(),
        rows = batch.num_rows(),
        format = ?format,
        "wrote report"
    );
    Ok(())
}
