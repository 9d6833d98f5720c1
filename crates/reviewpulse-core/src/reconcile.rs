//! Pair model output back with the reviews of the batch it was produced for.
//!
//! Each projected review carries a batch-local `review_index` and the model
//! is asked to echo it. When every returned entry carries a distinct,
//! in-range index, entries are paired by that index. Otherwise pairing
//! falls back to list position.
//!
//! When the two sides differ in length, only paired reviews produce
//! records: the shorter side wins and the excess is dropped. The mismatch is
//! reported in [`Reconciled::mismatch`] so callers can count and log it.

use crate::analysis::ExtractedEntry;
use crate::batch::ReviewBatch;
use crate::report::EnrichedRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pairing {
    /// Entries matched through their echoed `review_index`.
    ByIndex,
    /// Entry `i` matched with review `i`.
    ByPosition,
}

impl Pairing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ByIndex => "index",
            Self::ByPosition => "position",
        }
    }
}

/// Batch size and model output size disagreed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthMismatch {
    pub expected: usize,
    pub received: usize,
}

#[derive(Debug)]
pub struct Reconciled {
    /// One record per paired review, in review order.
    pub records: Vec<EnrichedRecord>,
    pub pairing: Pairing,
    pub mismatch: Option<LengthMismatch>,
    /// Paired entries that failed validation (their records carry no analysis).
    pub unclassified: usize,
}

pub fn reconcile(batch: &ReviewBatch<'_>, entries: Vec<ExtractedEntry>) -> Reconciled {
    let expected = batch.len();
    let received = entries.len();
    let mismatch = (expected != received).then_some(LengthMismatch { expected, received });

    let pairing = if indices_are_usable(&entries, expected) {
        Pairing::ByIndex
    } else {
        Pairing::ByPosition
    };

    let mut pairs: Vec<_> = match pairing {
        Pairing::ByIndex => entries
            .into_iter()
            .filter_map(|e| e.review_index.map(|i| (i, e.analysis)))
            .collect(),
        Pairing::ByPosition => entries
            .into_iter()
            .take(expected)
            .enumerate()
            .map(|(i, e)| (i, e.analysis))
            .collect(),
    };
    pairs.sort_by_key(|(i, _)| *i);

    let unclassified = pairs.iter().filter(|(_, a)| !a.is_classified()).count();
    let records = pairs
        .into_iter()
        .map(|(i, analysis)| EnrichedRecord::from_review(&batch.reviews[i], analysis))
        .collect();

    Reconciled {
        records,
        pairing,
        mismatch,
        unclassified,
    }
}

/// Every entry carries an index, all indices are distinct and inside the batch.
fn indices_are_usable(entries: &[ExtractedEntry], batch_len: usize) -> bool {
    if entries.is_empty() {
        return false;
    }
    let mut seen = vec![false; batch_len];
    for entry in entries {
        match entry.review_index {
            Some(i) if i < batch_len && !seen[i] => seen[i] = true,
            _ => return false,
        }
    }
    true
}
