//! Grouping of records that share an identical fingerprint.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::scanner::{Fingerprint, FingerprintRecord};

/// Default size above which a bucket is reported as oversized.
pub const DEFAULT_MAX_BUCKET_SIZE: usize = 1000;

/// Records keyed by fingerprint. Iteration is in fingerprint order.
#[derive(Debug, Default)]
pub struct HashBuckets {
    buckets: BTreeMap<Fingerprint, Vec<Arc<FingerprintRecord>>>,
    records: usize,
}

impl HashBuckets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Group `records` by fingerprint.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = FingerprintRecord>,
    {
        let mut buckets = Self::new();
        for record in records {
            buckets.insert(record);
        }
        buckets
    }

    pub fn insert(&mut self, record: FingerprintRecord) {
        self.buckets
            .entry(record.fingerprint.clone())
            .or_default()
            .push(Arc::new(record));
        self.records += 1;
    }

    /// Records whose fingerprint equals `fingerprint`.
    #[must_use]
    pub fn get(&self, fingerprint: &Fingerprint) -> &[Arc<FingerprintRecord>] {
        self.buckets.get(fingerprint).map(Vec::as_slice).unwrap_or_default()
    }

    /// Unique fingerprints, sorted.
    pub fn fingerprints(&self) -> impl Iterator<Item = &Fingerprint> + '_ {
        self.buckets.keys()
    }

    /// Number of unique fingerprints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total number of records across all buckets.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records
    }

    /// Buckets holding more than `limit` records, with their sizes.
    pub fn oversized(&self, limit: usize) -> impl Iterator<Item = (&Fingerprint, usize)> + '_ {
        self.buckets
            .iter()
            .filter(move |(_, records)| records.len() > limit)
            .map(|(fingerprint, records)| (fingerprint, records.len()))
    }
}
