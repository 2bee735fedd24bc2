use super::common::{blocky_image, half_size, inverted, save};
use simdupe::actions::{select_for_deletion, SelectRule, SelectionCriteria};
use simdupe::output::JsonOutput;
use simdupe::scanner::{PerceptualAlgorithm, WalkerConfig};
use simdupe::similarity::{FinderConfig, FinderError, SimilarityFinder};
use std::fs;
use tempfile::tempdir;

fn finder(threshold: u8) -> SimilarityFinder {
    SimilarityFinder::new(
        FinderConfig::default()
            .with_threshold(threshold)
            .with_threads(2),
    )
}

#[test]
fn test_identical_images_form_one_pair() {
    let dir = tempdir().unwrap();
    let img = blocky_image(21);
    save(dir.path(), "original.png", &img);
    fs::copy(
        dir.path().join("original.png"),
        dir.path().join("copy.png"),
    )
    .unwrap();
    save(dir.path(), "other.png", &inverted(&img));

    let report = finder(90).scan(dir.path()).unwrap();

    assert_eq!(report.pairs.len(), 1);
    let pair = &report.pairs[0];
    assert_eq!(pair.similarity, 100.0);
    assert_eq!(pair.distance, 0);
    assert!(pair.first.path.ends_with("copy.png"));
    assert!(pair.second.path.ends_with("original.png"));
    assert_eq!(report.summary.files_discovered, 3);
    assert_eq!(report.summary.pairs, 1);
}

#[test]
fn test_empty_directory_renders_empty_pairs() {
    let dir = tempdir().unwrap();

    let report = finder(90).scan(dir.path()).unwrap();

    assert!(report.pairs.is_empty());
    let json = JsonOutput::new(&report.pairs).to_json().unwrap();
    assert_eq!(json, r#"{"pairs":[]}"#);
}

#[test]
fn test_threshold_hundred_keeps_only_exact_matches() {
    let dir = tempdir().unwrap();
    for seed in 0..6 {
        let img = blocky_image(seed);
        save(dir.path(), &format!("img_{seed}.png"), &img);
        save(dir.path(), &format!("img_{seed}_dup.png"), &img);
    }

    let report = finder(100).scan(dir.path()).unwrap();

    assert!(report.pairs.len() >= 6);
    for pair in &report.pairs {
        assert_eq!(pair.distance, 0);
        assert_eq!(pair.similarity, 100.0);
    }
}

#[test]
fn test_pairs_are_unique_and_ordered() {
    let dir = tempdir().unwrap();
    let img = blocky_image(9);
    for name in ["c.png", "a.png", "b.png"] {
        save(dir.path(), name, &img);
    }

    let report = finder(90).scan(dir.path()).unwrap();

    assert_eq!(report.pairs.len(), 3);
    let mut seen = std::collections::HashSet::new();
    for pair in &report.pairs {
        let (first, second) = pair.paths();
        assert!(first < second);
        assert!(seen.insert((first.to_path_buf(), second.to_path_buf())));
    }
}

#[test]
fn test_every_algorithm_pairs_copies() {
    let dir = tempdir().unwrap();
    let img = blocky_image(4);
    save(dir.path(), "a.png", &img);
    save(dir.path(), "b.png", &img);

    for algorithm in PerceptualAlgorithm::ALL {
        let finder = SimilarityFinder::new(
            FinderConfig::default()
                .with_algorithm(algorithm)
                .with_threshold(95),
        );
        let report = finder.scan(dir.path()).unwrap();
        assert_eq!(report.pairs.len(), 1, "algorithm {algorithm}");
        assert_eq!(report.pairs[0].first.algorithm, algorithm);
    }
}

#[test]
fn test_non_image_and_corrupt_files() {
    let dir = tempdir().unwrap();
    let img = blocky_image(13);
    save(dir.path(), "a.png", &img);
    save(dir.path(), "b.png", &img);
    fs::write(dir.path().join("notes.txt"), b"not an image").unwrap();
    fs::write(dir.path().join("broken.png"), b"\x89PNG truncated").unwrap();

    let report = finder(90).scan(dir.path()).unwrap();

    assert_eq!(report.summary.files_discovered, 3);
    assert_eq!(report.summary.failed, 1);
    assert!(report.failures[0].path().ends_with("broken.png"));
    assert_eq!(report.pairs.len(), 1);
}

#[test]
fn test_nested_directories_and_ignore_patterns() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("nested").join("deeper");
    fs::create_dir_all(&sub).unwrap();
    let skipped = dir.path().join("thumbs");
    fs::create_dir(&skipped).unwrap();

    let img = blocky_image(17);
    save(dir.path(), "top.png", &img);
    save(&sub, "inner.png", &img);
    save(&skipped, "thumb.png", &img);

    let walker = WalkerConfig::default().with_ignore_patterns(vec!["thumbs/".to_string()]);
    let finder = SimilarityFinder::new(FinderConfig::default().with_walker_config(walker));
    let report = finder.scan(dir.path()).unwrap();

    assert_eq!(report.summary.files_discovered, 2);
    assert_eq!(report.pairs.len(), 1);
}

#[test]
fn test_missing_root_is_rejected() {
    let dir = tempdir().unwrap();
    let result = finder(90).scan(&dir.path().join("absent"));

    match result {
        Err(FinderError::PathNotFound(path)) => assert!(path.ends_with("absent")),
        other => panic!("Expected PathNotFound, got {:?}", other.map(|r| r.pairs.len())),
    }
}

#[test]
fn test_select_smaller_resolution_from_scan() {
    let dir = tempdir().unwrap();
    let img = blocky_image(12);
    let full = save(dir.path(), "full.png", &img);
    let small = save(dir.path(), "small.png", &half_size(&img));

    let report = finder(90).scan(dir.path()).unwrap();
    assert!(report.pairs.iter().any(|p| {
        let (a, b) = p.paths();
        (a == full && b == small) || (a == small && b == full)
    }));

    let criteria = SelectionCriteria::from_rules(&[SelectRule::SmallerResolution]);
    let selected = select_for_deletion(&report.pairs, &criteria);

    assert_eq!(selected, vec![small]);
}
