//! Perceptual image hashing.
//!
//! This module provides the [`PerceptualHasher`], which turns a decoded
//! image into a fixed-width [`Fingerprint`] that stays stable under
//! resizing and recompression, and [`PerceptualHasher::fingerprint_file`],
//! which packages that hash together with the file facts the cache needs.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use image::DynamicImage;
use image_hasher::{HashAlg, HasherConfig};
use serde::{Deserialize, Serialize};

use super::fingerprint::{mtime_seconds, Fingerprint, FingerprintRecord, Resolution, HASH_SIDE};
use super::ComputeError;

/// Supported perceptual hashing algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PerceptualAlgorithm {
    /// aHash - each cell compared with the mean brightness.
    #[serde(alias = "ahash")]
    Average,
    /// dHash - each cell compared with its horizontal neighbour.
    #[serde(alias = "dhash")]
    Difference,
    /// pHash - DCT-based, the most resilient to transformations.
    #[default]
    #[serde(alias = "phash")]
    Perceptual,
}

impl PerceptualAlgorithm {
    /// All algorithms, in cache-key order.
    pub const ALL: [Self; 3] = [Self::Average, Self::Difference, Self::Perceptual];

    /// Stable name used as the cache key and in user-facing output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Average => "average",
            Self::Difference => "difference",
            Self::Perceptual => "perceptual",
        }
    }
}

impl fmt::Display for PerceptualAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PerceptualAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "average" | "ahash" => Ok(Self::Average),
            "difference" | "dhash" => Ok(Self::Difference),
            "perceptual" | "phash" => Ok(Self::Perceptual),
            other => Err(format!("unknown hash algorithm: {other}")),
        }
    }
}

/// Computes perceptual hashes for images.
pub struct PerceptualHasher {
    hasher: image_hasher::Hasher,
    algorithm: PerceptualAlgorithm,
}

impl PerceptualHasher {
    /// Create a hasher producing `HASH_SIDE`×`HASH_SIDE` fingerprints.
    #[must_use]
    pub fn new(algorithm: PerceptualAlgorithm) -> Self {
        let config = HasherConfig::new().hash_size(HASH_SIDE, HASH_SIDE);

        let config = match algorithm {
            PerceptualAlgorithm::Perceptual => config.hash_alg(HashAlg::Median).preproc_dct(),
            PerceptualAlgorithm::Difference => config.hash_alg(HashAlg::Gradient),
            PerceptualAlgorithm::Average => config.hash_alg(HashAlg::Mean),
        };

        Self {
            hasher: config.to_hasher(),
            algorithm,
        }
    }

    /// Algorithm used by this hasher.
    #[must_use]
    pub fn algorithm(&self) -> PerceptualAlgorithm {
        self.algorithm
    }

    /// Width in bits of every fingerprint this hasher produces.
    #[must_use]
    pub fn bit_len(&self) -> u32 {
        HASH_SIDE * HASH_SIDE
    }

    /// Hash an already decoded image. Pure function of the pixels.
    #[must_use]
    pub fn hash_image(&self, image: &DynamicImage) -> Fingerprint {
        Fingerprint::from_bytes(self.hasher.hash_image(image).as_bytes())
    }

    /// Open, decode and hash the image at `path`.
    ///
    /// The modification time is read before decoding so a file rewritten
    /// mid-hash gets a stale timestamp and is recomputed on the next scan.
    pub fn fingerprint_file(&self, path: &Path) -> Result<FingerprintRecord, ComputeError> {
        let metadata = fs::metadata(path).map_err(|e| ComputeError::from_io(path, e))?;
        let modified = metadata
            .modified()
            .map_err(|e| ComputeError::from_io(path, e))?;

        let image = image::open(path).map_err(|e| ComputeError::Decode {
            path: path.to_path_buf(),
            source: e,
        })?;

        let fingerprint = self.hash_image(&image);
        if fingerprint.bit_len() != self.bit_len() {
            return Err(ComputeError::UnexpectedWidth {
                path: path.to_path_buf(),
                bits: fingerprint.bit_len(),
            });
        }

        Ok(FingerprintRecord {
            path: path.to_path_buf(),
            mod_time: mtime_seconds(modified),
            algorithm: self.algorithm,
            fingerprint,
            resolution: Resolution::new(image.width(), image.height()),
            file_size: metadata.len(),
        })
    }
}

impl Default for PerceptualHasher {
    fn default() -> Self {
        Self::new(PerceptualAlgorithm::Perceptual)
    }
}

impl fmt::Debug for PerceptualHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PerceptualHasher")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn blocky_image() -> image::RgbImage {
        image::RgbImage::from_fn(64, 64, |x, y| {
            let cell = (x / 8) * 8 + (y / 8);
            let v = ((cell * 97 + 31) % 251) as u8;
            image::Rgb([v, v, v])
        })
    }

    #[test]
    fn test_algorithm_names() {
        assert_eq!(PerceptualAlgorithm::Average.to_string(), "average");
        assert_eq!(PerceptualAlgorithm::Difference.to_string(), "difference");
        assert_eq!(PerceptualAlgorithm::Perceptual.to_string(), "perceptual");
        assert_eq!(PerceptualAlgorithm::default(), PerceptualAlgorithm::Perceptual);
    }

    #[test]
    fn test_algorithm_from_str_accepts_short_names() {
        assert_eq!("phash".parse(), Ok(PerceptualAlgorithm::Perceptual));
        assert_eq!("DHASH".parse(), Ok(PerceptualAlgorithm::Difference));
        assert_eq!("average".parse(), Ok(PerceptualAlgorithm::Average));
        assert!("blake3".parse::<PerceptualAlgorithm>().is_err());
    }

    #[test]
    fn test_algorithm_serde_aliases() {
        let a: PerceptualAlgorithm = serde_json::from_str("\"ahash\"").unwrap();
        assert_eq!(a, PerceptualAlgorithm::Average);
        let json = serde_json::to_string(&PerceptualAlgorithm::Difference).unwrap();
        assert_eq!(json, "\"difference\"");
    }

    #[test]
    fn test_invalid_image() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("invalid.png");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "not an image").unwrap();

        let hasher = PerceptualHasher::default();
        let result = hasher.fingerprint_file(&file_path);
        assert!(matches!(result, Err(ComputeError::Decode { .. })));
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = tempdir().unwrap();
        let hasher = PerceptualHasher::default();
        let result = hasher.fingerprint_file(&temp_dir.path().join("gone.png"));
        assert!(matches!(result, Err(ComputeError::NotFound(_))));
    }

    #[test]
    fn test_fingerprint_file_fields() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("blocks.png");
        blocky_image().save(&file_path).unwrap();

        for algorithm in PerceptualAlgorithm::ALL {
            let hasher = PerceptualHasher::new(algorithm);
            let record = hasher.fingerprint_file(&file_path).unwrap();

            assert_eq!(record.algorithm, algorithm);
            assert_eq!(record.resolution, Resolution::new(64, 64));
            assert_eq!(record.file_size, fs::metadata(&file_path).unwrap().len());
            assert_eq!(record.fingerprint.bit_len(), 64);
            assert_eq!(record.hash_hex().len(), 16);
            assert_eq!(record.bit_matrix().len(), 64);
        }
    }

    #[test]
    fn test_hash_is_deterministic() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("blocks.png");
        blocky_image().save(&file_path).unwrap();

        for algorithm in PerceptualAlgorithm::ALL {
            let first = PerceptualHasher::new(algorithm)
                .fingerprint_file(&file_path)
                .unwrap();
            let second = PerceptualHasher::new(algorithm)
                .fingerprint_file(&file_path)
                .unwrap();
            assert_eq!(first.hash_hex(), second.hash_hex());
        }
    }
}
