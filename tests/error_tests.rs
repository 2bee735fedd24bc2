use clap::Parser;
use image::{Rgb, RgbImage};
use simdupe::cache::FingerprintCache;
use simdupe::cli::Cli;
use simdupe::error::{ExitCode, StructuredError};
use simdupe::run_app;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn run(args: &[&str]) -> anyhow::Result<ExitCode> {
    let mut argv = vec!["simdupe", "--quiet"];
    argv.extend_from_slice(args);
    run_app(Cli::try_parse_from(argv).unwrap())
}

fn exit_code(args: &[&str]) -> ExitCode {
    match run(args) {
        Ok(code) => code,
        Err(err) => ExitCode::from_error(&err),
    }
}

fn save_gradient(path: &Path) {
    RgbImage::from_fn(48, 48, |x, y| Rgb([(x * 5) as u8, (y * 5) as u8, 128]))
        .save(path)
        .unwrap();
}

#[test]
fn test_scan_missing_path_is_invalid_input() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("no_such_dir");

    let err = run(&["scan", missing.to_str().unwrap(), "--no-cache"]).unwrap_err();
    assert_eq!(ExitCode::from_error(&err), ExitCode::InvalidInput);
    assert!(err.to_string().contains("no_such_dir"));
}

#[test]
fn test_scan_file_root_is_invalid_input() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("photo.png");
    save_gradient(&file);

    assert_eq!(
        exit_code(&["scan", file.to_str().unwrap(), "--no-cache"]),
        ExitCode::InvalidInput
    );
}

#[test]
fn test_threshold_above_hundred_is_rejected_by_the_parser() {
    let err = Cli::try_parse_from(["simdupe", "scan", "/p", "-t", "150"]).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
}

#[test]
fn test_configured_threshold_above_hundred_is_invalid_input() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "threshold = 150\n").unwrap();

    assert_eq!(
        exit_code(&[
            "--config",
            config.to_str().unwrap(),
            "scan",
            dir.path().to_str().unwrap(),
            "--no-cache",
        ]),
        ExitCode::InvalidInput
    );
}

fn seeded_cache(images: &Path, cache: &Path) -> usize {
    save_gradient(&images.join("a.png"));
    save_gradient(&images.join("b.png"));
    let args = [
        "scan",
        images.to_str().unwrap(),
        "--cache",
        cache.to_str().unwrap(),
        "-o",
        "json",
    ];
    assert_eq!(exit_code(&args), ExitCode::Success);
    FingerprintCache::open(cache).unwrap().len().unwrap()
}

#[test]
fn test_invalid_root_does_not_clear_cache() {
    let images = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let cache = cache_dir.path().join("fp.db");
    assert_eq!(seeded_cache(images.path(), &cache), 2);

    let missing = images.path().join("no_such_dir");
    let err = run(&[
        "scan",
        missing.to_str().unwrap(),
        "--cache",
        cache.to_str().unwrap(),
        "--clear-cache",
    ])
    .unwrap_err();

    assert_eq!(ExitCode::from_error(&err), ExitCode::InvalidInput);
    assert_eq!(FingerprintCache::open(&cache).unwrap().len().unwrap(), 2);
}

#[test]
fn test_invalid_threshold_does_not_clear_cache() {
    let images = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let cache = cache_dir.path().join("fp.db");
    assert_eq!(seeded_cache(images.path(), &cache), 2);

    let config = cache_dir.path().join("config.toml");
    fs::write(&config, "threshold = 101\n").unwrap();
    let err = run(&[
        "--config",
        config.to_str().unwrap(),
        "scan",
        images.path().to_str().unwrap(),
        "--cache",
        cache.to_str().unwrap(),
        "--clear-cache",
    ])
    .unwrap_err();

    assert_eq!(ExitCode::from_error(&err), ExitCode::InvalidInput);
    assert_eq!(FingerprintCache::open(&cache).unwrap().len().unwrap(), 2);
}

#[test]
fn test_select_lists_without_deleting() {
    let dir = tempdir().unwrap();
    save_gradient(&dir.path().join("a.png"));
    save_gradient(&dir.path().join("b.png"));

    assert_eq!(
        exit_code(&[
            "scan",
            dir.path().to_str().unwrap(),
            "--no-cache",
            "--select",
            "smaller-size",
        ]),
        ExitCode::Success
    );
    assert!(dir.path().join("a.png").exists());
    assert!(dir.path().join("b.png").exists());
}

#[test]
fn test_scan_without_pairs_exits_with_no_pairs() {
    let dir = tempdir().unwrap();
    assert_eq!(
        exit_code(&["scan", dir.path().to_str().unwrap(), "--no-cache", "-o", "json"]),
        ExitCode::NoPairs
    );
}

#[test]
fn test_scan_with_pairs_succeeds() {
    let dir = tempdir().unwrap();
    save_gradient(&dir.path().join("a.png"));
    save_gradient(&dir.path().join("b.png"));

    assert_eq!(
        exit_code(&["scan", dir.path().to_str().unwrap(), "--no-cache", "-o", "csv"]),
        ExitCode::Success
    );
}

#[test]
fn test_unreadable_image_is_partial_success() {
    let dir = tempdir().unwrap();
    save_gradient(&dir.path().join("a.png"));
    save_gradient(&dir.path().join("b.png"));
    fs::write(dir.path().join("c.jpg"), b"garbage").unwrap();

    assert_eq!(
        exit_code(&["scan", dir.path().to_str().unwrap(), "--no-cache"]),
        ExitCode::PartialSuccess
    );
}

#[test]
fn test_scan_uses_explicit_cache_file() {
    let dir = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let cache = cache_dir.path().join("fp.db");
    save_gradient(&dir.path().join("a.png"));
    save_gradient(&dir.path().join("b.png"));

    let args = [
        "scan",
        dir.path().to_str().unwrap(),
        "--cache",
        cache.to_str().unwrap(),
        "-o",
        "json",
    ];
    assert_eq!(exit_code(&args), ExitCode::Success);
    assert!(cache.exists());
    assert_eq!(
        exit_code(&["cache", "stats", "--cache", cache.to_str().unwrap()]),
        ExitCode::Success
    );
}

#[test]
fn test_delete_missing_file_is_not_found() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing.png");

    let err = run(&["delete", missing.to_str().unwrap(), "--no-cache"]).unwrap_err();
    assert_eq!(ExitCode::from_error(&err), ExitCode::NotFound);

    let structured = StructuredError::new(&err, ExitCode::NotFound);
    assert_eq!(structured.code, "SD005");
    assert_eq!(structured.exit_code, 5);
    assert!(!structured.interrupted);
}

#[test]
fn test_delete_with_some_failures_is_partial_success() {
    let dir = tempdir().unwrap();
    let present = dir.path().join("a.png");
    save_gradient(&present);
    let missing = dir.path().join("b.png");

    assert_eq!(
        exit_code(&[
            "delete",
            present.to_str().unwrap(),
            missing.to_str().unwrap(),
            "--no-cache"
        ]),
        ExitCode::PartialSuccess
    );
    assert!(!present.exists());
}

#[test]
fn test_invalid_config_file_is_general_error() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "threshold = -3\n").unwrap();

    let err = run(&[
        "--config",
        config.to_str().unwrap(),
        "scan",
        dir.path().to_str().unwrap(),
        "--no-cache",
    ])
    .unwrap_err();
    assert_eq!(ExitCode::from_error(&err), ExitCode::GeneralError);
    assert!(err.to_string().contains("config.toml"));
}
