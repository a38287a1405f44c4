//! Content-addressed result cache.
//!
//! An entry is keyed by the SHA-256 of the cache format version, the
//! serialized configuration and the bytes of the three source files, and
//! is stored at `<cache_dir>/<fingerprint>.json`. Any entry that is
//! missing, unreadable or does not match is ignored and the pipeline runs
//! from scratch; entries are never partially reused.

use std::path::{Path, PathBuf};

use evision_config::PipelineConfig;
use evision_source::{SourceError, SourcePaths};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use strum_macros::{AsRefStr, Display};
use thiserror::Error;

use crate::{PipelineError, PipelineOutput};

/// Bump when [`PipelineOutput`] or the fingerprint inputs change shape.
const CACHE_FORMAT_VERSION: u32 = 1;

/// Errors writing a cache entry.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Filesystem operation failed.
    #[error("Cache I/O error at {path}: {source}")]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The result could not be serialized.
    #[error("Failed to serialize cache entry: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// How [`crate::run_cached`] obtained its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum CacheOutcome {
    /// Served from a matching entry.
    Hit,
    /// No usable entry; computed and stored.
    Miss,
    /// Lookup skipped on request; computed and stored.
    Forced,
}

/// One stored result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheEntry {
    version: u32,
    fingerprint: String,
    /// RFC 3339 timestamp of when the entry was written.
    created_at: String,
    output: PipelineOutput,
}

/// Computes the cache key for a configuration and its source files.
///
/// # Errors
///
/// * If the configuration cannot be serialized
/// * If a source file cannot be read
pub fn fingerprint(config: &PipelineConfig, paths: &SourcePaths) -> Result<String, PipelineError> {
    let mut hasher = Sha256::new();
    hasher.update(CACHE_FORMAT_VERSION.to_le_bytes());

    let config_toml = config.to_toml_string()?;
    update_framed(&mut hasher, config_toml.as_bytes());

    for path in paths.all() {
        let bytes = std::fs::read(path).map_err(|source| SourceError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        update_framed(&mut hasher, &bytes);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Hashes a length prefix before the data so adjacent inputs cannot run
/// into each other.
fn update_framed(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

/// Directory of cached pipeline results.
#[derive(Debug, Clone)]
pub struct ResultCache {
    dir: PathBuf,
}

impl ResultCache {
    /// Creates a cache rooted at `dir`. The directory is created on the
    /// first store.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the entry for `fingerprint`.
    #[must_use]
    pub fn entry_path(&self, fingerprint: &str) -> PathBuf {
        self.dir.join(format!("{fingerprint}.json"))
    }

    /// Returns the cached output for `fingerprint`, or `None` if there is
    /// no usable entry.
    #[must_use]
    pub fn load(&self, fingerprint: &str) -> Option<PipelineOutput> {
        let path = self.entry_path(fingerprint);
        let Ok(contents) = std::fs::read_to_string(&path) else {
            log::info!("No cache entry for {fingerprint}");
            return None;
        };

        let entry: CacheEntry = match serde_json::from_str(&contents) {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Ignoring unreadable cache entry {}: {e}", path.display());
                return None;
            }
        };

        if entry.version != CACHE_FORMAT_VERSION || entry.fingerprint != fingerprint {
            log::warn!(
                "Ignoring mismatched cache entry {} (version {}, fingerprint {})",
                path.display(),
                entry.version,
                entry.fingerprint
            );
            return None;
        }

        log::info!(
            "Loaded cached result from {} (created {})",
            path.display(),
            entry.created_at
        );
        Some(entry.output)
    }

    /// Stores `output` under `fingerprint`.
    ///
    /// Writes to a `.tmp` file first and renames it into place, so readers
    /// never see a half-written entry.
    ///
    /// # Errors
    ///
    /// * If the cache directory cannot be created
    /// * If the entry cannot be serialized or written
    pub fn store(&self, fingerprint: &str, output: &PipelineOutput) -> Result<PathBuf, CacheError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| CacheError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let entry = CacheEntry {
            version: CACHE_FORMAT_VERSION,
            fingerprint: fingerprint.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            output: output.clone(),
        };
        let contents = serde_json::to_string(&entry)?;

        let path = self.entry_path(fingerprint);
        let tmp_path = self.dir.join(format!("{fingerprint}.json.tmp"));
        std::fs::write(&tmp_path, contents).map_err(|source| CacheError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        std::fs::rename(&tmp_path, &path).map_err(|source| CacheError::Io {
            path: path.clone(),
            source,
        })?;

        log::info!("Saved cache entry {}", path.display());
        Ok(path)
    }
}
