use super::common::{blocky_image, inverted, save};
use filetime::{set_file_mtime, FileTime};
use simdupe::actions::{delete_image, DeleteConfig};
use simdupe::cache::FingerprintCache;
use simdupe::scanner::PerceptualAlgorithm;
use simdupe::similarity::{FinderConfig, SimilarityFinder};
use std::sync::Arc;
use tempfile::tempdir;

fn cached_finder(cache: &Arc<FingerprintCache>) -> SimilarityFinder {
    SimilarityFinder::new(
        FinderConfig::default()
            .with_threads(2)
            .with_cache(Arc::clone(cache)),
    )
}

#[test]
fn test_rescan_is_served_from_cache() {
    let dir = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let img = blocky_image(30);
    save(dir.path(), "a.png", &img);
    save(dir.path(), "b.png", &img);
    save(dir.path(), "c.png", &inverted(&img));

    let cache = Arc::new(FingerprintCache::open(&cache_dir.path().join("cache.db")).unwrap());
    let first = cached_finder(&cache).scan(dir.path()).unwrap();
    assert_eq!(first.summary.cache_misses, 3);
    assert_eq!(first.summary.computed, 3);

    let second = cached_finder(&cache).scan(dir.path()).unwrap();
    assert_eq!(second.summary.cache_hits, 3);
    assert_eq!(second.summary.computed, 0);
    assert_eq!(second.summary.cache_hit_rate(), 1.0);
    assert_eq!(first.pairs, second.pairs);
}

#[test]
fn test_cache_survives_reopen() {
    let dir = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let cache_path = cache_dir.path().join("nested").join("cache.db");
    let img = blocky_image(31);
    save(dir.path(), "a.png", &img);
    save(dir.path(), "b.png", &img);

    {
        let cache = Arc::new(FingerprintCache::open(&cache_path).unwrap());
        cached_finder(&cache).scan(dir.path()).unwrap();
    }

    let reopened = Arc::new(FingerprintCache::open(&cache_path).unwrap());
    assert_eq!(reopened.len().unwrap(), 2);
    let report = cached_finder(&reopened).scan(dir.path()).unwrap();
    assert_eq!(report.summary.cache_hits, 2);
}

#[test]
fn test_modified_file_is_rehashed() {
    let dir = tempdir().unwrap();
    let img = blocky_image(32);
    let a = save(dir.path(), "a.png", &img);
    save(dir.path(), "b.png", &img);

    let cache = Arc::new(FingerprintCache::open_in_memory().unwrap());
    cached_finder(&cache).scan(dir.path()).unwrap();

    save(dir.path(), "a.png", &inverted(&img));
    set_file_mtime(&a, FileTime::from_unix_time(1_500_000_000, 0)).unwrap();

    let report = cached_finder(&cache).scan(dir.path()).unwrap();
    assert_eq!(report.summary.cache_hits, 1);
    assert_eq!(report.summary.computed, 1);
    assert!(report.pairs.is_empty());
}

#[test]
fn test_algorithms_are_cached_separately() {
    let dir = tempdir().unwrap();
    let img = blocky_image(33);
    save(dir.path(), "a.png", &img);
    save(dir.path(), "b.png", &img);
    let cache = Arc::new(FingerprintCache::open_in_memory().unwrap());

    for algorithm in PerceptualAlgorithm::ALL {
        let finder = SimilarityFinder::new(
            FinderConfig::default()
                .with_algorithm(algorithm)
                .with_cache(Arc::clone(&cache)),
        );
        let report = finder.scan(dir.path()).unwrap();
        assert_eq!(report.summary.computed, 2, "algorithm {algorithm}");
    }

    let stats = cache.stats().unwrap();
    assert_eq!(stats.total, 6);
    assert_eq!(stats.per_algorithm.len(), 3);
}

#[test]
fn test_deleted_file_is_not_resurrected_from_cache() {
    let dir = tempdir().unwrap();
    let img = blocky_image(34);
    let a = save(dir.path(), "a.png", &img);
    save(dir.path(), "b.png", &img);
    let mtime = FileTime::from_unix_time(1_600_000_000, 0);
    set_file_mtime(&a, mtime).unwrap();

    let cache = Arc::new(FingerprintCache::open_in_memory().unwrap());
    let before = cached_finder(&cache).scan(dir.path()).unwrap();
    assert_eq!(before.pairs.len(), 1);

    let deleted = delete_image(&a, &DeleteConfig::default(), Some(cache.as_ref())).unwrap();
    assert_eq!(deleted.cache_entries_removed, 1);
    assert!(cache
        .get_entry(&a, PerceptualAlgorithm::default())
        .unwrap()
        .is_none());

    // Same path and same mtime: only the dropped rows force a rehash.
    save(dir.path(), "a.png", &inverted(&img));
    set_file_mtime(&a, mtime).unwrap();

    let after = cached_finder(&cache).scan(dir.path()).unwrap();
    assert_eq!(after.summary.computed, 1);
    assert_eq!(after.summary.cache_hits, 1);
    assert!(after.pairs.is_empty());
}

#[test]
fn test_prune_drops_vanished_files() {
    let dir = tempdir().unwrap();
    let img = blocky_image(35);
    let a = save(dir.path(), "a.png", &img);
    save(dir.path(), "b.png", &img);

    let cache = Arc::new(FingerprintCache::open_in_memory().unwrap());
    cached_finder(&cache).scan(dir.path()).unwrap();
    std::fs::remove_file(&a).unwrap();

    assert_eq!(cache.prune_missing().unwrap(), 1);
    assert_eq!(cache.len().unwrap(), 1);
}
