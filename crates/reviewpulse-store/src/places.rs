//! Input place list: a CSV with `place_id`, `city`, `office_name` columns.
//!
//! Header names are matched case-insensitively after trimming. Every column
//! is read as text so numeric-looking ids are kept verbatim.

use std::fs::File;
use std::io::Seek;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, StringArray};
use arrow::csv::ReaderBuilder;
use arrow::csv::reader::Format;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use reviewpulse_core::report::UNKNOWN_BRANCH;
use reviewpulse_core::{CityFilter, Place};
use tracing::{info, warn};

use crate::StoreError;

pub const REQUIRED_COLUMNS: [&str; 3] = ["place_id", "city", "office_name"];

/// Places read from the input file, in file order.
#[derive(Debug, Clone, Default)]
pub struct PlaceList {
    pub places: Vec<Place>,
    /// Rows dropped because they had no `place_id`.
    pub skipped_rows: usize,
}

impl PlaceList {
    /// Distinct non-empty city names, in order of first appearance.
    pub fn cities(&self) -> Vec<String> {
        let mut cities: Vec<String> = Vec::new();
        for city in self.places.iter().filter_map(|p| p.city.as_deref()) {
            if !cities.iter().any(|c| c == city) {
                cities.push(city.to_string());
            }
        }
        cities
    }

    /// Keep only places whose city passes `filter`.
    pub fn filter(self, filter: &CityFilter) -> Vec<Place> {
        self.places
            .into_iter()
            .filter(|p| filter.matches(p.city.as_deref()))
            .collect()
    }
}

fn normalize_header(name: &str) -> String {
    name.trim_start_matches('\u{feff}').trim().to_lowercase()
}

/// Load the place list from a CSV file with a header row.
pub fn load_places(path: &Path) -> Result<PlaceList, StoreError> {
    if !path.exists() {
        return Err(StoreError::InputNotFound(path.to_path_buf()));
    }

    let mut file = File::open(path)?;
    let (inferred, _) = Format::default()
        .with_header(true)
        .infer_schema(&mut file, None)?;
    file.rewind()?;

    let schema = Arc::new(Schema::new(
        inferred
            .fields()
            .iter()
            .map(|f| Field::new(normalize_header(f.name()), DataType::Utf8, true))
            .collect::<Vec<_>>(),
    ));
    for column in REQUIRED_COLUMNS {
        if schema.index_of(column).is_err() {
            return Err(StoreError::MissingColumn {
                column,
                path: path.to_path_buf(),
            });
        }
    }

    let reader = ReaderBuilder::new(schema).with_header(true).build(file)?;

    let mut list = PlaceList::default();
    for batch in reader {
        read_batch(&batch?, &mut list)?;
    }

    info!(
        path = %path.display(),
        places = list.places.len(),
        skipped = list.skipped_rows,
        "loaded place list"
    );
    Ok(list)
}

fn read_batch(batch: &RecordBatch, list: &mut PlaceList) -> Result<(), StoreError> {
    let [place_ids, cities, offices] = REQUIRED_COLUMNS.map(|name| text_column(batch, name));
    let (Some(place_ids), Some(cities), Some(offices)) = (place_ids, cities, offices) else {
        return Err(arrow::error::ArrowError::SchemaError(
            "place list columns are not text".into(),
        )
        .into());
    };

    for row in 0..batch.num_rows() {
        let Some(place_id) = value_at(place_ids, row) else {
            warn!(row, "place list row has no place_id, skipping");
            list.skipped_rows += 1;
            continue;
        };
        list.places.push(Place {
            place_id: place_id.to_string(),
            city: value_at(cities, row).map(str::to_string),
            branch_name: value_at(offices, row).unwrap_or(UNKNOWN_BRANCH).to_string(),
        });
    }
    Ok(())
}

fn text_column<'a>(batch: &'a RecordBatch, name: &str) -> Option<&'a StringArray> {
    batch
        .column_by_name(name)?
        .as_any()
        .downcast_ref::<StringArray>()
}

/// Trimmed cell value; empty cells are `None`.
fn value_at(col: &StringArray, row: usize) -> Option<&str> {
    if col.is_null(row) {
        return None;
    }
    Some(col.value(row).trim()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_csv(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("place_ids.csv");
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn load_normalizes_headers() {
        let tmp = TempDir::new().unwrap();
        let path = write_csv(
            &tmp,
            " Place_ID ,CITY, Office_Name\n\
             ChIJ001,Mumbai,Andheri West\n\
             ChIJ002,Chennai,Anna Nagar\n",
        );
        let list = load_places(&path).unwrap();
        assert_eq!(list.places.len(), 2);
        assert_eq!(list.places[0].place_id, "ChIJ001");
        assert_eq!(list.places[1].city.as_deref(), Some("Chennai"));
        assert_eq!(list.places[1].branch_name, "Anna Nagar");
    }

    #[test]
    fn numeric_looking_values_stay_text() {
        let tmp = TempDir::new().unwrap();
        let path = write_csv(&tmp, "place_id,city,office_name\n00123,Pune,42\n");
        let list = load_places(&path).unwrap();
        assert_eq!(list.places[0].place_id, "00123");
        assert_eq!(list.places[0].branch_name, "42");
    }

    #[test]
    fn missing_column_errors() {
        let tmp = TempDir::new().unwrap();
        let path = write_csv(&tmp, "place_id,city\nChIJ001,Mumbai\n");
        match load_places(&path).unwrap_err() {
            StoreError::MissingColumn { column, .. } => assert_eq!(column, "office_name"),
            other => panic!("expected missing column, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_errors() {
        let err = load_places(Path::new("/nonexistent/place_ids.csv")).unwrap_err();
        assert!(matches!(err, StoreError::InputNotFound(_)));
    }

    #[test]
    fn blank_place_id_skipped_and_branch_defaulted() {
        let tmp = TempDir::new().unwrap();
        let path = write_csv(
            &tmp,
            "place_id,city,office_name\n\
             ,Mumbai,Ghost Branch\n\
             ChIJ003,Mumbai,\n\
             ChIJ004,,Unknown City Branch\n",
        );
        let list = load_places(&path).unwrap();
        assert_eq!(list.skipped_rows, 1);
        assert_eq!(list.places.len(), 2);
        assert_eq!(list.places[0].branch_name, UNKNOWN_BRANCH);
        assert!(list.places[1].city.is_none());
    }

    #[test]
    fn extra_columns_ignored() {
        let tmp = TempDir::new().unwrap();
        let path = write_csv(
            &tmp,
            "region,place_id,office_name,city,notes\n\
             West,ChIJ005,Bandra,Mumbai,flagship\n",
        );
        let list = load_places(&path).unwrap();
        assert_eq!(list.places[0].place_id, "ChIJ005");
        assert_eq!(list.places[0].city.as_deref(), Some("Mumbai"));
        assert_eq!(list.places[0].branch_name, "Bandra");
    }

    #[test]
    fn cities_and_filter() {
        let tmp = TempDir::new().unwrap();
        let path = write_csv(
            &tmp,
            "place_id,city,office_name\n\
             A,Mumbai,One\n\
             B,Chennai,Two\n\
             C,Mumbai,Three\n\
             D,Bangalore,Four\n",
        );
        let list = load_places(&path).unwrap();
        assert_eq!(list.cities(), vec!["Mumbai", "Chennai", "Bangalore"]);

        let filter = CityFilter::from_names(["mumbai", "BANGALORE"]);
        let ids: Vec<String> = list.filter(&filter).into_iter().map(|p| p.place_id).collect();
        assert_eq!(ids, vec!["A", "C", "D"]);
    }
}
