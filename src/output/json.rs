//! JSON output formatter for scan results.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "pairs": [
//!     {
//!       "file1": { "path": "/photos/a.jpg", "resolution": [800, 600], "file_size": 51234, "mod_time": 1700000000.5, "hash": "c3c1e1f0f8f8f0e0" },
//!       "file2": { "path": "/photos/b.jpg", "resolution": [800, 600], "file_size": 50987, "mod_time": 1700000100.0, "hash": "c3c1e1f0f8f8f0e1" },
//!       "similarity": 98.44
//!     }
//!   ]
//! }
//! ```
//!
//! The scan summary is not part of the document; it goes to the log.

use std::io::Write;

use serde::Serialize;

use crate::scanner::{FingerprintRecord, Resolution};
use crate::similarity::SimilarPair;

/// The externally visible fields of one fingerprinted file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRecordView {
    pub path: String,
    /// `[width, height]`
    pub resolution: Resolution,
    pub file_size: u64,
    /// Seconds since the Unix epoch.
    pub mod_time: f64,
    /// Lowercase hex fingerprint.
    pub hash: String,
}

impl From<&FingerprintRecord> for JsonRecordView {
    fn from(record: &FingerprintRecord) -> Self {
        Self {
            path: record.path.to_string_lossy().into_owned(),
            resolution: record.resolution,
            file_size: record.file_size,
            mod_time: record.mod_time,
            hash: record.hash_hex(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonPair {
    pub file1: JsonRecordView,
    pub file2: JsonRecordView,
    pub similarity: f64,
}

impl From<&SimilarPair> for JsonPair {
    fn from(pair: &SimilarPair) -> Self {
        Self {
            file1: JsonRecordView::from(pair.first.as_ref()),
            file2: JsonRecordView::from(pair.second.as_ref()),
            similarity: pair.similarity,
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    pub pairs: Vec<JsonPair>,
}

impl JsonOutput {
    /// Build the document from scan pairs.
    ///
    /// ```
    /// use simdupe::output::json::JsonOutput;
    ///
    /// let output = JsonOutput::new(&[]);
    /// assert_eq!(output.to_json().unwrap(), r#"{"pairs":[]}"#);
    /// ```
    #[must_use]
    pub fn new(pairs: &[SimilarPair]) -> Self {
        Self {
            pairs: pairs.iter().map(JsonPair::from).collect(),
        }
    }

    /// Serialize to compact JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer, followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
