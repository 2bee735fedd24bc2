//! File actions module.
//!
//! Deleting an image goes through [`delete::delete_image`], which refuses
//! parent-directory traversal, removes the file (permanently or to the
//! system trash) and then drops every cached fingerprint for the path.
//! [`select::select_for_deletion`] picks one image from each similar pair
//! by resolution, size or age.
//!
//! ```no_run
//! use simdupe::actions::{delete_image, DeleteConfig};
//! use simdupe::cache::FingerprintCache;
//! use std::path::Path;
//!
//! let cache = FingerprintCache::open_in_memory().unwrap();
//! let result = delete_image(Path::new("/photos/copy.jpg"), &DeleteConfig::trash(), Some(&cache));
//! ```

pub mod delete;
pub mod select;

pub use delete::{
    delete_batch, delete_image, has_parent_traversal, BatchDeleteResult, DeleteConfig,
    DeleteError, DeleteResult,
};
pub use select::{select_for_deletion, SelectRule, SelectionCriteria};
