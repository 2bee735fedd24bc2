//! CSV output formatter for scan results.
//!
//! One row is generated for each similar pair.
//!
//! # Columns
//!
//! - `pair_id`: 1-based position of the pair
//! - `file1`, `file2`: paths, `file1` sorting first
//! - `similarity`: percentage, two decimals
//! - `distance`: exact Hamming distance
//! - `hash1`, `hash2`: hex fingerprints
//! - `size1`, `size2`: file sizes in bytes
//! - `resolution1`, `resolution2`: `WIDTHxHEIGHT`

use std::io;

use serde::Serialize;
use thiserror::Error;

use crate::similarity::SimilarPair;

/// Errors that can occur during CSV output generation.
#[derive(Debug, Error)]
pub enum CsvOutputError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Serialize)]
struct CsvRow {
    pair_id: usize,
    file1: String,
    file2: String,
    similarity: String,
    distance: u32,
    hash1: String,
    hash2: String,
    size1: u64,
    size2: u64,
    resolution1: String,
    resolution2: String,
}

/// CSV output formatter.
pub struct CsvOutput<'a> {
    pairs: &'a [SimilarPair],
}

impl<'a> CsvOutput<'a> {
    #[must_use]
    pub fn new(pairs: &'a [SimilarPair]) -> Self {
        Self { pairs }
    }

    /// Write the CSV output to the given writer.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), CsvOutputError> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        for (idx, pair) in self.pairs.iter().enumerate() {
            csv_writer.serialize(CsvRow {
                pair_id: idx + 1,
                file1: pair.first.path.to_string_lossy().into_owned(),
                file2: pair.second.path.to_string_lossy().into_owned(),
                similarity: format!("{:.2}", pair.similarity),
                distance: pair.distance,
                hash1: pair.first.hash_hex(),
                hash2: pair.second.hash_hex(),
                size1: pair.first.file_size,
                size2: pair.second.file_size,
                resolution1: pair.first.resolution.to_string(),
                resolution2: pair.second.resolution.to_string(),
            })?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Generate CSV output as a string.
    pub fn to_string(&self) -> Result<String, CsvOutputError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}
