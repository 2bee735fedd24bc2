//! Path normalization for cache keys.
//!
//! The same file can be spelled many ways: relative or absolute, with `.`
//! components, or with a decomposed (NFD) filename as macOS produces. The
//! cache keys every row by [`path_key`], so all of these spellings must map
//! to one string:
//!
//! - the path is made absolute against the current directory
//! - `.` components are dropped (`..` is kept; symlinks are not resolved)
//! - UTF-8 paths are normalized to NFC
//!
//! Paths that are not valid UTF-8 cannot be NFC-normalized or stored
//! losslessly as text. They are keyed as `raw:` followed by the hex of their
//! platform bytes, which no absolute UTF-8 path can collide with.
//!
//! ```
//! use simdupe::scanner::path_utils::path_key;
//! use std::path::Path;
//!
//! assert_eq!(
//!     path_key(Path::new("/photos/./cafe\u{0301}.jpg")),
//!     path_key(Path::new("/photos/caf\u{e9}.jpg"))
//! );
//! ```

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use unicode_normalization::UnicodeNormalization;

const RAW_KEY_PREFIX: &str = "raw:";

/// Normalize a path string to NFC (composed) form.
#[must_use]
pub fn normalize_path_str(s: &str) -> String {
    s.nfc().collect()
}

/// Absolute form of `path` without `.` components.
///
/// Falls back to `path` itself if the current directory is unavailable.
#[must_use]
pub fn absolute_path(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|e| {
        log::debug!("Cannot make {} absolute: {}", path.display(), e);
        path.to_path_buf()
    });
    absolute.components().collect()
}

/// Cache key for `path`.
#[must_use]
pub fn path_key(path: &Path) -> String {
    let absolute = absolute_path(path);
    match absolute.to_str() {
        Some(s) => normalize_path_str(s),
        None => {
            let bytes = absolute.as_os_str().as_encoded_bytes();
            let mut key = String::with_capacity(RAW_KEY_PREFIX.len() + bytes.len() * 2);
            key.push_str(RAW_KEY_PREFIX);
            for byte in bytes {
                let _ = write!(key, "{byte:02x}");
            }
            key
        }
    }
}

/// Path a stored key refers to.
///
/// Returns `None` for a raw key that cannot be decoded on this platform.
#[must_use]
pub fn path_from_key(key: &str) -> Option<PathBuf> {
    let Some(hex) = key.strip_prefix(RAW_KEY_PREFIX) else {
        return Some(PathBuf::from(key));
    };
    decode_raw(hex)
}

#[cfg(unix)]
fn decode_raw(hex: &str) -> Option<PathBuf> {
    use std::os::unix::ffi::OsStrExt;

    if hex.len() % 2 != 0 || !hex.is_ascii() {
        return None;
    }
    let bytes = (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16))
        .collect::<Result<Vec<u8>, _>>()
        .ok()?;
    Some(PathBuf::from(std::ffi::OsStr::from_bytes(&bytes)))
}

#[cfg(not(unix))]
fn decode_raw(_hex: &str) -> Option<PathBuf> {
    None
}
