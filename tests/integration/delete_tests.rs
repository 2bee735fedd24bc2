use super::common::{blocky_image, save};
use simdupe::actions::{delete_batch, delete_image, DeleteConfig, DeleteError};
use simdupe::cache::FingerprintCache;
use simdupe::similarity::{FinderConfig, SimilarityFinder};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::tempdir;

#[test]
fn test_delete_removes_file_and_every_cache_variant() {
    let dir = tempdir().unwrap();
    let img = blocky_image(40);
    let a = save(dir.path(), "a.png", &img);
    save(dir.path(), "b.png", &img);
    let cache = Arc::new(FingerprintCache::open_in_memory().unwrap());

    for algorithm in simdupe::scanner::PerceptualAlgorithm::ALL {
        SimilarityFinder::new(
            FinderConfig::default()
                .with_algorithm(algorithm)
                .with_cache(Arc::clone(&cache)),
        )
        .scan(dir.path())
        .unwrap();
    }
    assert_eq!(cache.len().unwrap(), 6);

    let result = delete_image(&a, &DeleteConfig::default(), Some(cache.as_ref())).unwrap();

    assert!(!a.exists());
    assert!(result.permanent);
    assert_eq!(result.cache_entries_removed, 3);
    assert!(result.size > 0);
    assert_eq!(cache.len().unwrap(), 3);
}

#[test]
fn test_delete_finds_rows_cached_under_a_dotted_root() {
    let dir = tempdir().unwrap();
    let img = blocky_image(41);
    let a = save(dir.path(), "a.png", &img);
    save(dir.path(), "b.png", &img);
    let cache = Arc::new(FingerprintCache::open_in_memory().unwrap());

    SimilarityFinder::new(FinderConfig::default().with_cache(Arc::clone(&cache)))
        .scan(&dir.path().join("."))
        .unwrap();
    assert_eq!(cache.len().unwrap(), 2);

    let result = delete_image(&a, &DeleteConfig::default(), Some(cache.as_ref())).unwrap();

    assert_eq!(result.cache_entries_removed, 1);
    assert_eq!(cache.len().unwrap(), 1);
}

#[test]
fn test_delete_missing_file_reports_not_found() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("gone.png");

    let err = delete_image(&missing, &DeleteConfig::default(), None).unwrap_err();
    assert!(matches!(err, DeleteError::NotFound(_)));
    assert_eq!(err.path(), missing.as_path());
}

#[test]
fn test_delete_refuses_directories_and_traversal() {
    let dir = tempdir().unwrap();

    let err = delete_image(dir.path(), &DeleteConfig::default(), None).unwrap_err();
    assert!(matches!(err, DeleteError::NotAFile(_)));

    let sneaky = dir.path().join("sub").join("..").join("a.png");
    let err = delete_image(&sneaky, &DeleteConfig::default(), None).unwrap_err();
    assert!(matches!(err, DeleteError::InvalidPath(_)));
}

#[test]
fn test_batch_continues_past_failures() {
    let dir = tempdir().unwrap();
    let img = blocky_image(41);
    let a = save(dir.path(), "a.png", &img);
    let b = save(dir.path(), "b.png", &img);
    let paths: Vec<PathBuf> = vec![a.clone(), dir.path().join("missing.png"), b.clone()];

    let result = delete_batch(&paths, &DeleteConfig::default(), None);

    assert_eq!(result.successes.len(), 2);
    assert_eq!(result.failures.len(), 1);
    assert!(!result.all_succeeded());
    assert!(result.bytes_freed() > 0);
    assert!(!a.exists() && !b.exists());
}
