//! Expansion of index matches into verified file pairs.
//!
//! For each unique fingerprint the index is queried with the conservative
//! radius from [`max_distance_for`]. Every record in the query's bucket is
//! crossed with every record in each matched bucket. Self matches and pairs
//! already seen in either order are dropped; survivors are re-verified from
//! their own fingerprints before being emitted.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use super::buckets::{HashBuckets, DEFAULT_MAX_BUCKET_SIZE};
use super::index::SimilarityIndex;
use crate::scanner::{
    max_distance_for, meets_threshold, similarity_percent, FingerprintRecord, HASH_BITS,
};

/// Two distinct files whose similarity meets the threshold.
///
/// `first` always has the lexicographically smaller path.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarPair {
    pub first: Arc<FingerprintRecord>,
    pub second: Arc<FingerprintRecord>,
    /// Exact Hamming distance between the two fingerprints.
    pub distance: u32,
    /// Similarity percentage rounded to two decimals.
    pub similarity: f64,
}

impl SimilarPair {
    #[must_use]
    pub fn paths(&self) -> (&Path, &Path) {
        (&self.first.path, &self.second.path)
    }
}

/// Pairs produced by one extraction, plus counters for the scan summary.
#[derive(Debug, Default)]
pub struct Extraction {
    pub pairs: Vec<SimilarPair>,
    /// Distinct unordered candidate pairs examined.
    pub candidates: usize,
    /// Candidates discarded by exact re-verification.
    pub rejected: usize,
    /// Buckets larger than the configured limit.
    pub oversized_buckets: usize,
}

/// Turns index matches into [`SimilarPair`]s.
#[derive(Debug, Clone, Copy)]
pub struct PairExtractor {
    hash_width: u32,
    threshold: u8,
    max_bucket_size: usize,
}

impl PairExtractor {
    /// Extractor for 64-bit fingerprints at `threshold` percent.
    #[must_use]
    pub fn new(threshold: u8) -> Self {
        Self {
            hash_width: HASH_BITS,
            threshold,
            max_bucket_size: DEFAULT_MAX_BUCKET_SIZE,
        }
    }

    #[must_use]
    pub fn with_hash_width(mut self, width: u32) -> Self {
        self.hash_width = width;
        self
    }

    /// Buckets above this size are logged as oversized. They are still
    /// processed in full.
    #[must_use]
    pub fn with_max_bucket_size(mut self, size: usize) -> Self {
        self.max_bucket_size = size;
        self
    }

    /// Search radius used for index queries.
    #[must_use]
    pub fn max_distance(&self) -> u32 {
        max_distance_for(self.hash_width, self.threshold)
    }

    pub fn extract(&self, buckets: &HashBuckets, index: &SimilarityIndex) -> Extraction {
        let mut extraction = Extraction::default();
        let max_distance = self.max_distance();

        for (fingerprint, size) in buckets.oversized(self.max_bucket_size) {
            log::warn!(
                "Bucket {} holds {} images (limit {}); comparing all of them",
                fingerprint,
                size,
                self.max_bucket_size
            );
            extraction.oversized_buckets += 1;
        }

        let mut seen: HashSet<(&Path, &Path)> = HashSet::new();

        for query in buckets.fingerprints() {
            let left = buckets.get(query);

            let mut matches = index.find(query, max_distance);
            matches.sort_unstable_by(|a, b| a.1.cmp(b.1));

            for (_, matched) in matches {
                for a in left {
                    for b in buckets.get(matched) {
                        if a.path == b.path {
                            continue;
                        }

                        let (first, second) = if a.path <= b.path { (a, b) } else { (b, a) };
                        if !seen.insert((first.path.as_path(), second.path.as_path())) {
                            continue;
                        }
                        extraction.candidates += 1;

                        let distance = first.fingerprint.distance(&second.fingerprint);
                        if !meets_threshold(self.hash_width, distance, self.threshold) {
                            log::trace!(
                                "Rejected {} ~ {}: distance {}",
                                first.path.display(),
                                second.path.display(),
                                distance
                            );
                            extraction.rejected += 1;
                            continue;
                        }

                        extraction.pairs.push(SimilarPair {
                            first: Arc::clone(first),
                            second: Arc::clone(second),
                            distance,
                            similarity: similarity_percent(self.hash_width, distance),
                        });
                    }
                }
            }
        }

        extraction
    }
}
