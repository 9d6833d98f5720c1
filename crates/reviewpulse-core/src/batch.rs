//! Fixed-size, order-preserving partitioning of a place's reviews.

use crate::RawReview;

pub const DEFAULT_BATCH_SIZE: usize = 5;

/// A contiguous slice of one place's reviews, submitted to the model together.
#[derive(Debug, Clone, Copy)]
pub struct ReviewBatch<'a> {
    /// Zero-based position of this batch within the place.
    pub index: usize,
    /// Place-wide position of the first review in the batch.
    pub offset: usize,
    pub reviews: &'a [RawReview],
}

impl<'a> ReviewBatch<'a> {
    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }

    /// Reviews paired with their batch-local index.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &'a RawReview)> + use<'a> {
        self.reviews.iter().enumerate()
    }
}

/// Lazily split `reviews` into batches of `size`; the last one may be shorter.
///
/// An empty list yields no batches. A `size` of zero is treated as one.
pub fn batches(reviews: &[RawReview], size: usize) -> impl Iterator<Item = ReviewBatch<'_>> {
    let size = size.max(1);
    reviews
        .chunks(size)
        .enumerate()
        .map(move |(index, reviews)| ReviewBatch {
            index,
            offset: index * size,
            reviews,
        })
}

/// Number of batches [`batches`] yields for `len` reviews.
pub fn batch_count(len: usize, size: usize) -> usize {
    len.div_ceil(size.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reviews(n: usize) -> Vec<RawReview> {
        (0..n)
            .map(|i| RawReview {
                author_name: Some(format!("author-{i}")),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn batch_count_is_ceiling() {
        for n in 0..=23 {
            for size in 1..=7 {
                let list = reviews(n);
                assert_eq!(batches(&list, size).count(), n.div_ceil(size));
                assert_eq!(batch_count(n, size), n.div_ceil(size));
            }
        }
    }

    #[test]
    fn concatenation_reconstructs_input() {
        let list = reviews(12);
        let rebuilt: Vec<RawReview> = batches(&list, 5)
            .flat_map(|b| b.reviews.iter().cloned())
            .collect();
        assert_eq!(rebuilt, list);
    }

    #[test]
    fn last_batch_holds_remainder() {
        let list = reviews(12);
        let sizes: Vec<usize> = batches(&list, 5).map(|b| b.len()).collect();
        assert_eq!(sizes, vec![5, 5, 2]);
    }

    #[test]
    fn evenly_divisible_last_batch_is_full() {
        let list = reviews(10);
        let sizes: Vec<usize> = batches(&list, 5).map(|b| b.len()).collect();
        assert_eq!(sizes, vec![5, 5]);
    }

    #[test]
    fn empty_list_yields_no_batches() {
        assert_eq!(batches(&[], 5).count(), 0);
    }

    #[test]
    fn indices_and_offsets() {
        let list = reviews(7);
        let meta: Vec<(usize, usize)> = batches(&list, 3).map(|b| (b.index, b.offset)).collect();
        assert_eq!(meta, vec![(0, 0), (1, 3), (2, 6)]);
    }

    #[test]
    fn zero_size_is_clamped() {
        let list = reviews(3);
        assert_eq!(batches(&list, 0).count(), 3);
    }

    #[test]
    fn local_indices_restart_per_batch() {
        let list = reviews(7);
        let second = batches(&list, 3).nth(1).unwrap();
        let locals: Vec<usize> = second.iter().map(|(i, _)| i).collect();
        assert_eq!(locals, vec![0, 1, 2]);
        assert_eq!(second.reviews[0].author(), Some("author-3"));
    }
}
