//! Persisted form of a fingerprint record.
//!
//! A [`CacheEntry`] mirrors one row of the `fingerprints` table. The bit
//! matrix is stored as a JSON integer array and the resolution as a JSON
//! `[width, height]` pair. Decoding validates both against the hex hash;
//! a row that fails validation is treated as a cache miss by the caller.

use std::path::PathBuf;

use thiserror::Error;

use crate::scanner::path_utils::path_key;
use crate::scanner::{
    Fingerprint, FingerprintError, FingerprintRecord, PerceptualAlgorithm, Resolution, HASH_BITS,
};

/// Why a stored row could not be turned back into a record.
#[derive(Debug, Error)]
pub enum EntryError {
    #[error("unknown algorithm {0:?}")]
    UnknownAlgorithm(String),

    #[error("malformed bit matrix: {0}")]
    Matrix(#[source] serde_json::Error),

    #[error("malformed resolution: {0}")]
    Resolution(#[source] serde_json::Error),

    #[error("expected a {expected}-bit fingerprint, found {found} bits")]
    Width { expected: u32, found: u32 },

    #[error("negative file size {0}")]
    NegativeSize(i64),

    #[error(transparent)]
    Fingerprint(#[from] FingerprintError),
}

/// One row of the fingerprint cache.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub path: String,
    pub algorithm: String,
    pub mod_time: f64,
    pub hash_hex: String,
    pub bit_matrix: String,
    pub resolution: String,
    pub file_size: i64,
}

impl CacheEntry {
    /// Serialize a record into its row form.
    pub fn from_record(record: &FingerprintRecord) -> Result<Self, serde_json::Error> {
        Ok(Self {
            path: path_key(&record.path),
            algorithm: record.algorithm.as_str().to_string(),
            mod_time: record.mod_time,
            hash_hex: record.hash_hex(),
            bit_matrix: serde_json::to_string(&record.bit_matrix())?,
            resolution: serde_json::to_string(&record.resolution)?,
            file_size: i64::try_from(record.file_size).unwrap_or(i64::MAX),
        })
    }

    /// Whether this entry was written for the file's current modification time.
    #[must_use]
    pub fn is_fresh(&self, current_mod_time: f64) -> bool {
        self.mod_time == current_mod_time
    }

    /// Decode and validate the row.
    pub fn into_record(self) -> Result<FingerprintRecord, EntryError> {
        let algorithm: PerceptualAlgorithm = self
            .algorithm
            .parse()
            .map_err(|_| EntryError::UnknownAlgorithm(self.algorithm.clone()))?;

        let fingerprint = Fingerprint::from_hex(&self.hash_hex)?;
        if fingerprint.bit_len() != HASH_BITS {
            return Err(EntryError::Width {
                expected: HASH_BITS,
                found: fingerprint.bit_len(),
            });
        }

        let matrix: Vec<u8> = serde_json::from_str(&self.bit_matrix).map_err(EntryError::Matrix)?;
        if matrix.len() != HASH_BITS as usize {
            return Err(EntryError::Width {
                expected: HASH_BITS,
                found: matrix.len() as u32,
            });
        }
        if Fingerprint::from_bit_matrix(&matrix)? != fingerprint {
            return Err(FingerprintError::EncodingMismatch {
                hex: self.hash_hex,
            }
            .into());
        }

        let resolution: Resolution =
            serde_json::from_str(&self.resolution).map_err(EntryError::Resolution)?;
        let file_size =
            u64::try_from(self.file_size).map_err(|_| EntryError::NegativeSize(self.file_size))?;

        Ok(FingerprintRecord {
            path: PathBuf::from(self.path),
            mod_time: self.mod_time,
            algorithm,
            fingerprint,
            resolution,
            file_size,
        })
    }
}
