//! Similarity search over perceptual fingerprints.
//!
//! - [`index`]: BK-tree over unique fingerprints under Hamming distance
//! - [`buckets`]: records grouped by identical fingerprint
//! - [`pairs`]: candidate expansion, deduplication and exact re-verification
//! - [`finder`]: the scan pipeline tying cache, pool, index and pairs together

pub mod buckets;
pub mod finder;
pub mod index;
pub mod pairs;

pub use buckets::{HashBuckets, DEFAULT_MAX_BUCKET_SIZE};
pub use finder::{
    FinderConfig, FinderError, ScanReport, ScanSummary, SimilarityFinder, DEFAULT_THRESHOLD,
};
pub use index::{HammingMetric, SimilarityIndex};
pub use pairs::{Extraction, PairExtractor, SimilarPair};
