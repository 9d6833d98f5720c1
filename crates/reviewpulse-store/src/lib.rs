//! Storage layer: input place list and report output, both through Arrow.

mod error;
pub use error::StoreError;

mod places;
pub use places::{PlaceList, REQUIRED_COLUMNS, load_places};

mod report;
pub use report::write_report;
