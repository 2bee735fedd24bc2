//! Fixed-width perceptual fingerprints and the records built around them.
//!
//! A [`Fingerprint`] is the bit vector produced by a perceptual hash. It has
//! two canonical encodings that the cache and the JSON output expose:
//!
//! - a lowercase hexadecimal string, two digits per byte
//! - a row-major bit matrix of `0`/`1` values, most significant bit first
//!
//! Both encodings are derived from the same bytes, so they can never disagree.

use std::fmt;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::perceptual::PerceptualAlgorithm;

/// Side length of the hash matrix (8×8 = 64 bits).
pub const HASH_SIDE: u32 = 8;

/// Number of bits in every fingerprint produced by this crate.
pub const HASH_BITS: u32 = HASH_SIDE * HASH_SIDE;

/// Errors raised while decoding a fingerprint from one of its encodings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FingerprintError {
    /// The hex string has an odd length or contains a non-hex character.
    #[error("invalid hex fingerprint: {0:?}")]
    InvalidHex(String),

    /// A bit matrix cell held something other than 0 or 1.
    #[error("bit matrix contains non-binary value {value} at index {index}")]
    NonBinaryCell { index: usize, value: u8 },

    /// The bit matrix length is not a whole number of bytes.
    #[error("bit matrix length {0} is not a multiple of 8")]
    RaggedMatrix(usize),

    /// Two encodings of the same fingerprint disagree.
    #[error("hex fingerprint {hex} does not match its bit matrix")]
    EncodingMismatch { hex: String },
}

/// A perceptual hash as a packed bit vector.
///
/// Ordering and hashing are byte-wise so fingerprints can key both
/// `HashMap`s and `BTreeMap`s.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint {
    bytes: Box<[u8]>,
}

impl Fingerprint {
    /// Wrap raw hash bytes.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Box<[u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Parse the canonical hex encoding.
    pub fn from_hex(hex: &str) -> Result<Self, FingerprintError> {
        if hex.len() % 2 != 0 || !hex.is_ascii() {
            return Err(FingerprintError::InvalidHex(hex.to_string()));
        }

        let bytes = (0..hex.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&hex[i..i + 2], 16))
            .collect::<Result<Vec<u8>, _>>()
            .map_err(|_| FingerprintError::InvalidHex(hex.to_string()))?;

        Ok(Self::from_bytes(bytes))
    }

    /// Pack a row-major 0/1 matrix back into a fingerprint.
    pub fn from_bit_matrix(bits: &[u8]) -> Result<Self, FingerprintError> {
        if bits.len() % 8 != 0 {
            return Err(FingerprintError::RaggedMatrix(bits.len()));
        }

        let mut bytes = vec![0u8; bits.len() / 8];
        for (index, &value) in bits.iter().enumerate() {
            match value {
                0 => {}
                1 => bytes[index / 8] |= 0x80 >> (index % 8),
                _ => return Err(FingerprintError::NonBinaryCell { index, value }),
            }
        }

        Ok(Self::from_bytes(bytes))
    }

    /// Raw packed bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of bits in the vector.
    #[must_use]
    pub fn bit_len(&self) -> u32 {
        (self.bytes.len() * 8) as u32
    }

    /// Lowercase hex encoding.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Row-major bit matrix, most significant bit of the first byte first.
    #[must_use]
    pub fn bit_matrix(&self) -> Vec<u8> {
        self.bytes
            .iter()
            .flat_map(|byte| (0..8).map(move |shift| (byte >> (7 - shift)) & 1))
            .collect()
    }

    /// Hamming distance to `other`.
    ///
    /// Bits present in only one of two differently sized vectors all count
    /// as differing.
    #[must_use]
    pub fn distance(&self, other: &Self) -> u32 {
        let common: u32 = self
            .bytes
            .iter()
            .zip(other.bytes.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum();
        let extra = self.bytes.len().abs_diff(other.bytes.len()) as u32 * 8;
        common + extra
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Pixel dimensions of a decoded image. Serialized as `[width, height]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(u32, u32)", into = "(u32, u32)")]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl From<(u32, u32)> for Resolution {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

impl From<Resolution> for (u32, u32) {
    fn from(r: Resolution) -> Self {
        (r.width, r.height)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// One file's fingerprint under one algorithm, plus the file facts that
/// travel with it through the cache and into the scan report.
#[derive(Debug, Clone, PartialEq)]
pub struct FingerprintRecord {
    /// Path as discovered by the walker.
    pub path: PathBuf,
    /// Modification time in seconds since the Unix epoch.
    pub mod_time: f64,
    /// Algorithm that produced `fingerprint`.
    pub algorithm: PerceptualAlgorithm,
    /// The hash itself.
    pub fingerprint: Fingerprint,
    /// Decoded image dimensions.
    pub resolution: Resolution,
    /// File size in bytes.
    pub file_size: u64,
}

impl FingerprintRecord {
    /// Canonical hex encoding of the fingerprint.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        self.fingerprint.to_hex()
    }

    /// Row-major bit matrix of the fingerprint.
    #[must_use]
    pub fn bit_matrix(&self) -> Vec<u8> {
        self.fingerprint.bit_matrix()
    }
}

/// Convert a file timestamp to the float-seconds form stored in the cache.
///
/// Pre-epoch timestamps come out negative rather than failing.
#[must_use]
pub fn mtime_seconds(time: SystemTime) -> f64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64(),
        Err(e) => -e.duration().as_secs_f64(),
    }
}

/// Largest Hamming distance that can still reach `threshold` percent
/// similarity for a `width`-bit hash.
///
/// Equivalent to `floor(width * (1 - threshold / 100))` without the float
/// rounding. Thresholds above 100 clamp to 0.
#[must_use]
pub fn max_distance_for(width: u32, threshold: u8) -> u32 {
    let threshold = u32::from(threshold.min(100));
    width * (100 - threshold) / 100
}

/// Similarity percentage for a distance, rounded to two decimals.
#[must_use]
pub fn similarity_percent(width: u32, distance: u32) -> f64 {
    if width == 0 {
        return 0.0;
    }
    let raw = f64::from(width.saturating_sub(distance)) / f64::from(width) * 100.0;
    (raw * 100.0).round() / 100.0
}

/// Exact check of `similarity(width, distance) >= threshold` on unrounded
/// values, in integer arithmetic.
#[must_use]
pub fn meets_threshold(width: u32, distance: u32, threshold: u8) -> bool {
    if distance > width {
        return false;
    }
    u64::from(width - distance) * 100 >= u64::from(threshold) * u64::from(width)
}
