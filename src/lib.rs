//! simdupe - near-duplicate image finder
//!
//! Fingerprints images with a perceptual hash, caches the fingerprints in
//! SQLite keyed by path and algorithm, and finds similar pairs with a
//! BK-tree over Hamming distance followed by exact re-verification.

pub mod actions;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;
pub mod similarity;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::actions::{delete_batch, select_for_deletion, DeleteConfig, SelectRule, SelectionCriteria};
use crate::cache::FingerprintCache;
use crate::cli::{CacheAction, CacheArgs, CacheLocation, Cli, Commands, DeleteArgs, OutputFormat, ScanArgs};
use crate::config::Config;
use crate::error::ExitCode;
use crate::output::{CsvOutput, JsonOutput, TextOutput};
use crate::progress::{Progress, ProgressCallback};
use crate::scanner::WalkerConfig;
use crate::signal::CancelToken;
use crate::similarity::{FinderConfig, ScanReport, SimilarityFinder};

/// Run the command described by `cli`.
///
/// # Errors
///
/// Returns structural failures: bad input, an unusable cache, interruption.
/// Per-file problems only affect the exit code.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    if let Err(e) = logging::init_logging(cli.verbose, cli.quiet) {
        eprintln!("Warning: logging unavailable: {e}");
    }

    let config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Invalid configuration file {}", path.display()))?,
        None => Config::load(),
    };
    log::debug!("Effective configuration: {:?}", config);

    match cli.command {
        Commands::Scan(args) => run_scan(args, &config, cli.quiet),
        Commands::Delete(args) => run_delete(args, &config),
        Commands::Cache(args) => run_cache(args, &config),
    }
}

fn cache_path(explicit: Option<&PathBuf>, config: &Config) -> Option<PathBuf> {
    explicit
        .cloned()
        .or_else(|| config.cache_path.clone())
        .or_else(FingerprintCache::default_path)
}

fn open_cache(location: &CacheLocation, config: &Config) -> Result<Option<Arc<FingerprintCache>>> {
    if location.no_cache {
        log::debug!("Fingerprint cache disabled");
        return Ok(None);
    }
    let Some(path) = cache_path(location.cache.as_ref(), config) else {
        log::warn!("No cache directory available; fingerprints will not be cached");
        return Ok(None);
    };
    let cache = FingerprintCache::open(&path)
        .with_context(|| format!("Failed to open fingerprint cache at {}", path.display()))?;
    Ok(Some(Arc::new(cache)))
}

fn run_scan(args: ScanArgs, config: &Config, quiet: bool) -> Result<ExitCode> {
    let walker_config = WalkerConfig {
        follow_symlinks: args.follow_symlinks || config.follow_symlinks,
        skip_hidden: args.skip_hidden || config.skip_hidden,
        ..WalkerConfig::default()
    }
    .with_extensions(&config.extensions)
    .with_ignore_patterns(args.ignore_patterns);

    let mut finder_config = FinderConfig::default()
        .with_algorithm(args.algorithm.map_or(config.algorithm, Into::into))
        .with_threshold(args.threshold.unwrap_or(config.threshold))
        .with_threads(args.threads.unwrap_or(config.threads))
        .with_walker_config(walker_config)
        .with_max_bucket_size(config.max_bucket_size)
        .with_progress_interval(config.progress_interval);
    finder_config.validate(&args.path)?;

    let cache = open_cache(&args.cache, config)?;
    if args.clear_cache {
        if let Some(cache) = &cache {
            let removed = cache.clear().context("Failed to clear fingerprint cache")?;
            log::info!("Cleared {} cached fingerprints", removed);
        }
    }
    if let Some(cache) = cache {
        finder_config = finder_config.with_cache(cache);
    }

    let cancel = signal::install_handler().unwrap_or_else(|e| {
        log::warn!("{}; Ctrl+C will not stop the scan cleanly", e);
        CancelToken::new()
    });
    let progress: Arc<dyn ProgressCallback> = Arc::new(Progress::new(quiet));
    let finder_config = finder_config
        .with_cancel_token(cancel)
        .with_progress_callback(progress);

    let report = SimilarityFinder::new(finder_config).scan(&args.path)?;
    if args.select.is_empty() {
        write_report(&report, args.output)?;
    } else {
        let rules: Vec<SelectRule> = args.select.iter().copied().map(Into::into).collect();
        write_selection(&report, &SelectionCriteria::from_rules(&rules))?;
    }

    Ok(scan_exit_code(&report))
}

fn write_selection(report: &ScanReport, criteria: &SelectionCriteria) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for path in select_for_deletion(&report.pairs, criteria) {
        writeln!(out, "{}", path.display())?;
    }
    out.flush()?;
    Ok(())
}

fn write_report(report: &ScanReport, format: OutputFormat) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => JsonOutput::new(&report.pairs).write_to(&mut out, true)?,
        OutputFormat::Csv => CsvOutput::new(&report.pairs).write_to(&mut out)?,
        OutputFormat::Text => TextOutput::new(&report.pairs, &report.summary).write_to(&mut out)?,
    }
    out.flush()?;
    Ok(())
}

/// Exit code for a finished scan.
#[must_use]
pub fn scan_exit_code(report: &ScanReport) -> ExitCode {
    if report.pairs.is_empty() {
        ExitCode::NoPairs
    } else if !report.failures.is_empty() || report.summary.walk_errors > 0 {
        ExitCode::PartialSuccess
    } else {
        ExitCode::Success
    }
}

fn run_delete(args: DeleteArgs, config: &Config) -> Result<ExitCode> {
    let cache = open_cache(&args.cache, config)?;
    let delete_config = DeleteConfig { trash: args.trash };
    let result = delete_batch(&args.paths, &delete_config, cache.as_deref());

    for deleted in &result.successes {
        println!(
            "{} {}",
            if deleted.permanent { "Deleted" } else { "Trashed" },
            deleted.path.display()
        );
    }

    if result.successes.is_empty() {
        if let Some(first) = result.failures.into_iter().next() {
            return Err(first.into());
        }
        return Ok(ExitCode::Success);
    }
    for failure in &result.failures {
        log::error!("{}", failure);
    }
    Ok(if result.all_succeeded() {
        ExitCode::Success
    } else {
        ExitCode::PartialSuccess
    })
}

fn run_cache(args: CacheArgs, config: &Config) -> Result<ExitCode> {
    let path = cache_path(args.cache.as_ref(), config)
        .context("No cache location configured and no platform cache directory")?;
    let cache = FingerprintCache::open(&path)
        .with_context(|| format!("Failed to open fingerprint cache at {}", path.display()))?;

    match args.action {
        CacheAction::Stats => {
            let stats = cache.stats()?;
            println!("Cache: {}", path.display());
            println!("Entries: {}", stats.total);
            for (algorithm, count) in &stats.per_algorithm {
                println!("  {algorithm}: {count}");
            }
        }
        CacheAction::Clear => {
            let removed = cache.clear()?;
            println!("Removed {removed} entries from {}", path.display());
        }
        CacheAction::Prune => {
            let removed = cache.prune_missing()?;
            println!("Pruned {removed} entries for missing files");
        }
    }
    cache.close()?;
    Ok(ExitCode::Success)
}
