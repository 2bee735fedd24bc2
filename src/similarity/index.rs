//! BK-tree similarity index over fingerprints.
//!
//! Children of a node are filed under their distance to it, so a range
//! query only descends into edges labelled within `[d - max, d + max]`.
//! The triangle inequality guarantees no key within `max` is skipped.

use bk_tree::{BKTree, Metric};

use crate::scanner::Fingerprint;

/// Hamming distance between fingerprints.
#[derive(Default, Clone, Copy, Debug)]
pub struct HammingMetric;

impl Metric<Fingerprint> for HammingMetric {
    fn distance(&self, a: &Fingerprint, b: &Fingerprint) -> u32 {
        a.distance(b)
    }

    fn threshold_distance(&self, a: &Fingerprint, b: &Fingerprint, threshold: u32) -> Option<u32> {
        let d = self.distance(a, b);
        if d <= threshold {
            Some(d)
        } else {
            None
        }
    }
}

/// BK-tree over unique fingerprints under Hamming distance.
///
/// Built from scratch for every scan.
pub struct SimilarityIndex {
    tree: BKTree<Fingerprint, HammingMetric>,
    count: usize,
}

impl SimilarityIndex {
    /// Create a new empty similarity index.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: BKTree::new(HammingMetric),
            count: 0,
        }
    }

    /// Add a fingerprint. Returns `false` if it was already present.
    pub fn insert(&mut self, fingerprint: Fingerprint) -> bool {
        if self.tree.find(&fingerprint, 0).next().is_some() {
            return false;
        }
        self.tree.add(fingerprint);
        self.count += 1;
        true
    }

    /// Every stored fingerprint within `max_distance` of `fingerprint`,
    /// inclusive, paired with its distance. Order is unspecified.
    #[must_use]
    pub fn find(&self, fingerprint: &Fingerprint, max_distance: u32) -> Vec<(u32, &Fingerprint)> {
        self.tree.find(fingerprint, max_distance).collect()
    }

    /// Number of unique fingerprints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl Default for SimilarityIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SimilarityIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimilarityIndex")
            .field("count", &self.count)
            .finish_non_exhaustive()
    }
}

impl Extend<Fingerprint> for SimilarityIndex {
    fn extend<I: IntoIterator<Item = Fingerprint>>(&mut self, iter: I) {
        for fingerprint in iter {
            self.insert(fingerprint);
        }
    }
}

impl FromIterator<Fingerprint> for SimilarityIndex {
    fn from_iter<I: IntoIterator<Item = Fingerprint>>(iter: I) -> Self {
        let mut index = Self::new();
        index.extend(iter);
        index
    }
}
