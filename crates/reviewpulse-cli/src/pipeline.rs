//! Review pipeline: fetch each place's reviews, analyse them in batches,
//! reconcile the analyses back onto the reviews.
//!
//! Failures are contained: a place whose fetch fails is skipped, a batch
//! whose model call fails contributes no rows. Neither stops the run.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::{StreamExt, stream};
use reviewpulse_ai::{ExtractionError, Extractor};
use reviewpulse_core::{
    EnrichedRecord, ExtractedEntry, Place, RawReview, ReviewBatch, batch_count, batches, reconcile,
};
use reviewpulse_places::{FetchError, PlacesClient};
use tracing::{info, warn};

/// Where a place's reviews come from.
#[async_trait]
pub trait ReviewSource: Send + Sync {
    async fn reviews(&self, place_id: &str) -> Result<Vec<RawReview>, FetchError>;
}

#[async_trait]
impl ReviewSource for PlacesClient {
    async fn reviews(&self, place_id: &str) -> Result<Vec<RawReview>, FetchError> {
        Ok(self.fetch_reviews(place_id).await?.reviews)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    pub places: usize,
    pub places_skipped: usize,
    pub reviews: usize,
    pub batches: usize,
    pub failed_batches: usize,
    /// Batches whose analysis count differed from their review count.
    pub mismatched_batches: usize,
    pub unclassified: usize,
    pub records: usize,
    pub elapsed_secs: f64,
}

impl RunStats {
    pub fn log(&self) {
        info!(
            places = self.places,
            places_skipped = self.places_skipped,
            reviews = self.reviews,
            batches = self.batches,
            failed_batches = self.failed_batches,
            mismatched_batches = self.mismatched_batches,
            unclassified = self.unclassified,
            records = self.records,
            elapsed_secs = format_args!("{:.1}", self.elapsed_secs),
            "run complete"
        );
    }
}

pub struct Pipeline {
    source: Arc<dyn ReviewSource>,
    extractor: Extractor,
    batch_size: usize,
    concurrency: usize,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn ReviewSource>,
        extractor: Extractor,
        batch_size: usize,
        concurrency: usize,
    ) -> Self {
        Self {
            source,
            extractor,
            batch_size: batch_size.max(1),
            concurrency: concurrency.max(1),
        }
    }

    /// Process places in order. Records keep place order, then batch order,
    /// then review order within a batch.
    pub async fn run(&self, places: &[Place]) -> (Vec<EnrichedRecord>, RunStats) {
        let start = Instant::now();
        let mut stats = RunStats::default();
        let mut all = Vec::new();

        for (i, place) in places.iter().enumerate() {
            info!(
                place_id = %place.place_id,
                branch = %place.branch_name,
                city = place.city.as_deref().unwrap_or("-"),
                progress = format_args!("{}/{}", i + 1, places.len()),
                "processing place"
            );
            let mut records = self.process_place(place, &mut stats).await;
            place.annotate(&mut records);
            all.append(&mut records);
        }

        stats.records = all.len();
        stats.elapsed_secs = start.elapsed().as_secs_f64();
        (all, stats)
    }

    async fn process_place(&self, place: &Place, stats: &mut RunStats) -> Vec<EnrichedRecord> {
        stats.places += 1;
        let place_id = place.place_id.as_str();

        let reviews = match self.source.reviews(place_id).await {
            Ok(reviews) if reviews.is_empty() => {
                warn!(place_id, "no reviews found, skipping");
                stats.places_skipped += 1;
                return Vec::new();
            }
            Ok(reviews) => reviews,
            Err(e) => {
                warn!(place_id, error = %e, "fetching reviews failed, skipping");
                stats.places_skipped += 1;
                return Vec::new();
            }
        };
        stats.reviews += reviews.len();
        info!(
            place_id,
            reviews = reviews.len(),
            batches = batch_count(reviews.len(), self.batch_size),
            "analysing reviews"
        );

        let outcomes: Vec<(ReviewBatch<'_>, Result<Vec<ExtractedEntry>, ExtractionError>)> =
            stream::iter(batches(&reviews, self.batch_size))
                .map(|batch| async move { (batch, self.extractor.extract(&batch).await) })
                .buffered(self.concurrency)
                .collect()
                .await;

        let mut records = Vec::with_capacity(reviews.len());
        for (batch, outcome) in outcomes {
            stats.batches += 1;
            let entries = match outcome {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(
                        place_id,
                        batch = batch.index,
                        offset = batch.offset,
                        error = %e,
                        "batch analysis failed, skipping"
                    );
                    stats.failed_batches += 1;
                    continue;
                }
            };

            let reconciled = reconcile(&batch, entries);
            if let Some(mismatch) = reconciled.mismatch {
                warn!(
                    place_id,
                    batch = batch.index,
                    offset = batch.offset,
                    expected = mismatch.expected,
                    received = mismatch.received,
                    pairing = reconciled.pairing.as_str(),
                    "analysis count does not match batch size"
                );
                stats.mismatched_batches += 1;
            }
            if reconciled.unclassified > 0 {
                warn!(
                    place_id,
                    batch = batch.index,
                    offset = batch.offset,
                    count = reconciled.unclassified,
                    "analyses failed validation, rows kept without classification"
                );
                stats.unclassified += reconciled.unclassified;
            }
            records.extend(reconciled.records);
        }

        info!(place_id, records = records.len(), "finished place");
        records
    }
}
