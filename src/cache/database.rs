//! SQLite-backed fingerprint cache.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use super::entry::CacheEntry;
use crate::scanner::path_utils::{path_from_key, path_key};
use crate::scanner::{mtime_seconds, FingerprintRecord, PerceptualAlgorithm};

/// Bumped whenever the table layout changes; older tables are rebuilt.
const SCHEMA_VERSION: i32 = 1;

const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS fingerprints (
        path        TEXT    NOT NULL,
        algorithm   TEXT    NOT NULL,
        mod_time    REAL    NOT NULL,
        hash_hex    TEXT    NOT NULL,
        bit_matrix  TEXT    NOT NULL,
        resolution  TEXT    NOT NULL,
        file_size   INTEGER NOT NULL,
        PRIMARY KEY (path, algorithm)
    ) WITHOUT ROWID;
";

/// Errors raised by the cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("failed to serialize cache entry: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to prepare cache directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cache connection lock poisoned")]
    LockPoisoned,
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Outcome of [`FingerprintCache::commit_batch`].
#[derive(Debug, Default)]
pub struct CommitReport {
    /// Records written.
    pub written: usize,
    /// Records that could not be written, with the reason.
    pub failed: Vec<(PathBuf, CacheError)>,
}

/// Entry counts for `cache stats`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub total: usize,
    pub per_algorithm: BTreeMap<String, usize>,
}

/// Persistent fingerprint cache keyed by `(path, algorithm)`.
///
/// The connection sits behind a mutex so one handle can be shared through
/// an `Arc`; the scan pipeline only touches it from the initiating thread.
pub struct FingerprintCache {
    conn: Mutex<Connection>,
    location: Option<PathBuf>,
}

impl std::fmt::Debug for FingerprintCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FingerprintCache")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl FingerprintCache {
    /// Opens or creates a cache database at `path`.
    ///
    /// Fails if the file exists but is not a SQLite database.
    pub fn open(path: &Path) -> CacheResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| CacheError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::init_schema(&conn)?;
        log::debug!("Opened fingerprint cache at {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
            location: Some(path.to_path_buf()),
        })
    }

    /// Opens a throwaway in-memory cache.
    pub fn open_in_memory() -> CacheResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            location: None,
        })
    }

    /// Default location: `<platform cache dir>/fingerprints.db`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "simdupe", "simdupe")
            .map(|dirs| dirs.cache_dir().join("fingerprints.db"))
    }

    /// File backing this cache, if any.
    #[must_use]
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    fn init_schema(conn: &Connection) -> CacheResult<()> {
        let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        if version != 0 && version != SCHEMA_VERSION {
            log::warn!(
                "Cache schema version {} is not {}; rebuilding the cache",
                version,
                SCHEMA_VERSION
            );
            conn.execute_batch("DROP TABLE IF EXISTS fingerprints;")?;
        }
        conn.execute_batch(CREATE_TABLE)?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        Ok(())
    }

    fn lock(&self) -> CacheResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| CacheError::LockPoisoned)
    }

    /// Raw row for `(path, algorithm)`, without freshness checks.
    pub fn get_entry(
        &self,
        path: &Path,
        algorithm: PerceptualAlgorithm,
    ) -> CacheResult<Option<CacheEntry>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT path, algorithm, mod_time, hash_hex, bit_matrix, resolution, file_size
             FROM fingerprints WHERE path = ?1 AND algorithm = ?2",
        )?;
        let entry = stmt
            .query_row(params![path_key(path), algorithm.as_str()], |row| {
                Ok(CacheEntry {
                    path: row.get(0)?,
                    algorithm: row.get(1)?,
                    mod_time: row.get(2)?,
                    hash_hex: row.get(3)?,
                    bit_matrix: row.get(4)?,
                    resolution: row.get(5)?,
                    file_size: row.get(6)?,
                })
            })
            .optional()?;
        Ok(entry)
    }

    /// Cached record for `path`, if one exists for the file's current mtime.
    ///
    /// A file that cannot be stat'ed is a miss, as is a row that fails
    /// validation.
    pub fn lookup(
        &self,
        path: &Path,
        algorithm: PerceptualAlgorithm,
    ) -> CacheResult<Option<FingerprintRecord>> {
        let current = match fs::metadata(path).and_then(|m| m.modified()) {
            Ok(modified) => mtime_seconds(modified),
            Err(e) => {
                log::debug!("Cache miss for {}: cannot read mtime: {}", path.display(), e);
                return Ok(None);
            }
        };
        self.lookup_at(path, algorithm, current)
    }

    /// Like [`lookup`](Self::lookup) with an already known modification time.
    pub fn lookup_at(
        &self,
        path: &Path,
        algorithm: PerceptualAlgorithm,
        current_mod_time: f64,
    ) -> CacheResult<Option<FingerprintRecord>> {
        let Some(entry) = self.get_entry(path, algorithm)? else {
            return Ok(None);
        };

        if !entry.is_fresh(current_mod_time) {
            log::trace!(
                "Stale cache entry for {} ({} != {})",
                path.display(),
                entry.mod_time,
                current_mod_time
            );
            return Ok(None);
        }

        match entry.into_record() {
            Ok(mut record) => {
                record.path = path.to_path_buf();
                Ok(Some(record))
            }
            Err(e) => {
                log::warn!("Ignoring malformed cache entry for {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    /// Upsert every record. Each row is written or not at all; a failing
    /// row is reported and the rest of the batch still lands.
    pub fn commit_batch(&self, records: &[FingerprintRecord]) -> CacheResult<CommitReport> {
        let mut report = CommitReport::default();
        if records.is_empty() {
            return Ok(report);
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR REPLACE INTO fingerprints
                 (path, algorithm, mod_time, hash_hex, bit_matrix, resolution, file_size)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;

            for record in records {
                let written = CacheEntry::from_record(record)
                    .map_err(CacheError::from)
                    .and_then(|entry| {
                        stmt.execute(params![
                            entry.path,
                            entry.algorithm,
                            entry.mod_time,
                            entry.hash_hex,
                            entry.bit_matrix,
                            entry.resolution,
                            entry.file_size,
                        ])
                        .map_err(CacheError::from)
                    });

                match written {
                    Ok(_) => report.written += 1,
                    Err(e) => {
                        log::warn!("Failed to cache {}: {}", record.path.display(), e);
                        report.failed.push((record.path.clone(), e));
                    }
                }
            }
        }
        tx.commit()?;

        log::debug!(
            "Cache commit: {} written, {} failed",
            report.written,
            report.failed.len()
        );
        Ok(report)
    }

    /// Delete every algorithm variant for `path`. Returns the rows removed.
    pub fn remove(&self, path: &Path) -> CacheResult<usize> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM fingerprints WHERE path = ?1",
            params![path_key(path)],
        )?;
        log::debug!("Removed {} cache entries for {}", removed, path.display());
        Ok(removed)
    }

    /// Delete entries whose file no longer exists. Returns the rows removed.
    pub fn prune_missing(&self) -> CacheResult<usize> {
        let paths: Vec<String> = {
            let conn = self.lock()?;
            let mut stmt = conn.prepare("SELECT DISTINCT path FROM fingerprints")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            let paths = rows.collect::<Result<Vec<_>, _>>()?;
            paths
        };

        let mut removed = 0;
        for path in paths.iter().filter_map(|key| path_from_key(key)) {
            if !path.exists() {
                removed += self.remove(&path)?;
            }
        }
        Ok(removed)
    }

    /// Remove every entry.
    pub fn clear(&self) -> CacheResult<usize> {
        let conn = self.lock()?;
        Ok(conn.execute("DELETE FROM fingerprints", [])?)
    }

    /// Number of stored rows across all algorithms.
    pub fn len(&self) -> CacheResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM fingerprints", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Entry counts, total and per algorithm.
    pub fn stats(&self) -> CacheResult<CacheStats> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT algorithm, COUNT(*) FROM fingerprints GROUP BY algorithm")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
        })?;

        let mut stats = CacheStats::default();
        for row in rows {
            let (algorithm, count) = row?;
            stats.total += count;
            stats.per_algorithm.insert(algorithm, count);
        }
        drop(stmt);
        Ok(stats)
    }

    /// Close the underlying connection, surfacing any final error.
    pub fn close(self) -> CacheResult<()> {
        let conn = self
            .conn
            .into_inner()
            .map_err(|_| CacheError::LockPoisoned)?;
        conn.close().map_err(|(_, e)| CacheError::Database(e))
    }
}
