//! Fingerprint caching module.
//!
//! This module persists computed fingerprints so that unchanged images are
//! not decoded again on the next scan.
//!
//! # Architecture
//!
//! * [`database`]: SQLite persistence, schema versioning, and batch commits.
//! * [`entry`]: The stored row form and its validation.
//!
//! # Cache Invalidation
//!
//! Entries are keyed by `(path, algorithm)`. An entry is only used when the
//! stored modification time equals the file's current one exactly; any
//! change, even to an older timestamp, forces a recompute. Rows that fail
//! to decode are treated as misses and overwritten by the next commit.

pub mod database;
pub mod entry;

pub use database::{CacheError, CacheResult, CacheStats, CommitReport, FingerprintCache};
pub use entry::{CacheEntry, EntryError};
