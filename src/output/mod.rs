//! Output formatters for scan results.
//!
//! - JSON, the `{"pairs": [...]}` document for automation
//! - CSV for spreadsheet import
//! - Plain text for people
//!
//! # Example
//!
//! ```no_run
//! use simdupe::output::json::JsonOutput;
//! use simdupe::similarity::SimilarityFinder;
//! use std::path::Path;
//!
//! let report = SimilarityFinder::with_defaults().scan(Path::new(".")).unwrap();
//! println!("{}", JsonOutput::new(&report.pairs).to_json_pretty().unwrap());
//! ```

pub mod csv;
pub mod json;
pub mod text;

pub use self::csv::{CsvOutput, CsvOutputError};
pub use json::{JsonOutput, JsonOutputError};
pub use text::TextOutput;
