use figment::providers::{Env, Serialized};
use figment::Figment;
use simdupe::config::{Config, ENV_PREFIX};
use simdupe::scanner::PerceptualAlgorithm;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_config_load_from_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    let toml_content = r#"
algorithm = "ahash"
threshold = 85
threads = 3
cache_path = "/tmp/simdupe-test/fingerprints.db"
extensions = ["png", "jpg"]
skip_hidden = true
"#;
    fs::write(&config_path, toml_content).unwrap();

    let config = Config::load_from(&config_path).unwrap();
    assert_eq!(config.algorithm, PerceptualAlgorithm::Average);
    assert_eq!(config.threshold, 85);
    assert_eq!(config.threads, 3);
    assert_eq!(
        config.cache_path.as_deref(),
        Some(std::path::Path::new("/tmp/simdupe-test/fingerprints.db"))
    );
    assert_eq!(config.extensions, vec!["png", "jpg"]);
    assert!(config.skip_hidden);
    assert!(!config.follow_symlinks);
}

#[test]
fn test_config_missing_file_uses_defaults() {
    let temp_dir = tempdir().unwrap();
    let config = Config::load_from(&temp_dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.algorithm, Config::default().algorithm);
    assert_eq!(config.extensions, Config::default().extensions);
}

#[test]
fn test_config_rejects_unknown_algorithm() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "algorithm = \"wavelet\"\n").unwrap();

    assert!(Config::load_from(&config_path).is_err());
}

#[test]
fn test_config_load_from_env() {
    std::env::set_var("SIMDUPE_PROGRESS_INTERVAL", "7");

    let figment = Figment::from(Serialized::defaults(Config::default()))
        .merge(Env::prefixed(ENV_PREFIX));
    let config: Config = figment.extract().unwrap();

    assert_eq!(config.progress_interval, 7);

    std::env::remove_var("SIMDUPE_PROGRESS_INTERVAL");
}
