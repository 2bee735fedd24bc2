//! Automatic choice of which image in each pair to delete.
//!
//! Every active rule is tried in a fixed order (resolution, then file size,
//! then modification time) and the first rule that tells the two images
//! apart picks the loser. When all active rules tie, the first image of the
//! pair is chosen. With no rules active nothing is chosen.
//!
//! An image can appear in many pairs, so [`select_for_deletion`] returns
//! each chosen path once, in the order it was first chosen.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::scanner::FingerprintRecord;
use crate::similarity::SimilarPair;

/// One way of telling two similar images apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectRule {
    /// Delete the image with fewer pixels.
    SmallerResolution,
    /// Delete the smaller file.
    SmallerSize,
    /// Delete the image modified earlier.
    Older,
}

/// The set of active rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionCriteria {
    pub smaller_resolution: bool,
    pub smaller_size: bool,
    pub older: bool,
}

impl SelectionCriteria {
    #[must_use]
    pub fn from_rules(rules: &[SelectRule]) -> Self {
        let mut criteria = Self::default();
        for rule in rules {
            match rule {
                SelectRule::SmallerResolution => criteria.smaller_resolution = true,
                SelectRule::SmallerSize => criteria.smaller_size = true,
                SelectRule::Older => criteria.older = true,
            }
        }
        criteria
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.smaller_resolution || self.smaller_size || self.older
    }

    /// Record in `pair` that should be deleted, if any.
    #[must_use]
    pub fn choose<'a>(&self, pair: &'a SimilarPair) -> Option<&'a FingerprintRecord> {
        if !self.is_active() {
            return None;
        }
        let (a, b) = (pair.first.as_ref(), pair.second.as_ref());

        let mut ordering = Ordering::Equal;
        if self.smaller_resolution {
            ordering = pixels(a).cmp(&pixels(b));
        }
        if ordering == Ordering::Equal && self.smaller_size {
            ordering = a.file_size.cmp(&b.file_size);
        }
        if ordering == Ordering::Equal && self.older {
            ordering = a.mod_time.partial_cmp(&b.mod_time).unwrap_or(Ordering::Equal);
        }

        Some(if ordering == Ordering::Greater { b } else { a })
    }
}

fn pixels(record: &FingerprintRecord) -> u64 {
    u64::from(record.resolution.width) * u64::from(record.resolution.height)
}

/// Paths to delete for `pairs`, without duplicates.
#[must_use]
pub fn select_for_deletion(pairs: &[SimilarPair], criteria: &SelectionCriteria) -> Vec<PathBuf> {
    let mut seen: HashSet<&Path> = HashSet::new();
    let mut selected = Vec::new();
    for pair in pairs {
        if let Some(record) = criteria.choose(pair) {
            if seen.insert(record.path.as_path()) {
                selected.push(record.path.clone());
            }
        }
    }
    log::debug!(
        "Selected {} files for deletion from {} pairs",
        selected.len(),
        pairs.len()
    );
    selected
}
