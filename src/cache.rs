/// The cache module persists the parsed releases of a music directory as a JSON file, so that
/// reopening an unchanged library skips the walk entirely.
///
/// Invalidation is coarse: the whole file is valid or it is not. It is valid when it was written
/// by this schema version, for this exact root path, and the root directory has not been modified
/// since. Anything else (including a file we cannot read or decode) is a miss, never an error.
///
/// Writes go to a temporary file in the cache directory which is then renamed over the old cache,
/// so readers never observe a half-written file.
use crate::common::mtime_seconds;
use crate::config::Config;
use crate::error::Result;
use crate::releases::Release;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Bump when the serialized shape of `Release` changes.
pub const CACHE_VERSION: u32 = 2;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CacheRecord {
    pub version: u32,
    pub music_dir: String,
    pub last_modified: f64,
    pub releases: Vec<Release>,
}

#[derive(Serialize)]
struct CacheRecordRef<'a> {
    version: u32,
    music_dir: &'a str,
    last_modified: f64,
    releases: &'a [Release],
}

#[derive(Debug, Clone)]
pub struct ReleaseCache {
    cache_dir: PathBuf,
    path: PathBuf,
}

/// One cache file per music root, named by a hash of the root path.
pub fn cache_file_name(root: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(root.to_string_lossy().as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("releases-{}.json", &digest[..16])
}

impl ReleaseCache {
    pub fn new(c: &Config, root: &Path) -> Self {
        Self {
            cache_dir: c.cache_dir.clone(),
            path: c.cache_dir.join(cache_file_name(root)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `(true, Some(releases))` on a hit and `(false, None)` on any kind of miss.
    pub fn load(&self, root: &Path) -> (bool, Option<Vec<Release>>) {
        match self.try_load(root) {
            Some(releases) => (true, Some(releases)),
            None => (false, None),
        }
    }

    fn try_load(&self, root: &Path) -> Option<Vec<Release>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) => {
                debug!("No usable cache at {}: {}", self.path.display(), e);
                return None;
            }
        };

        let value: serde_json::Value = match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(e) => {
                self.discard_corrupt(&e.to_string());
                return None;
            }
        };
        let version = value.get("version").and_then(|v| v.as_u64());
        if version != Some(CACHE_VERSION as u64) {
            info!("Ignoring cache {} with version {:?}, expected {}", self.path.display(), version, CACHE_VERSION);
            return None;
        }
        let mut record: CacheRecord = match serde_json::from_value(value) {
            Ok(record) => record,
            Err(e) => {
                self.discard_corrupt(&e.to_string());
                return None;
            }
        };

        let root_str = root.to_string_lossy();
        if record.music_dir != root_str {
            debug!("Cache {} is for {}, not {}", self.path.display(), record.music_dir, root_str);
            return None;
        }
        let root_mtime = match mtime_seconds(root) {
            Ok(t) => t,
            Err(e) => {
                warn!("Failed to stat music directory {}: {}", root.display(), e);
                return None;
            }
        };
        if record.last_modified < root_mtime {
            info!("Cache for {} is stale", root.display());
            return None;
        }

        for release in &mut record.releases {
            release.relink_tracks();
        }
        debug!("Loaded {} releases from cache {}", record.releases.len(), self.path.display());
        Some(record.releases)
    }

    fn discard_corrupt(&self, reason: &str) {
        warn!("Deleting corrupt cache {}: {}", self.path.display(), reason);
        if let Err(e) = fs::remove_file(&self.path) {
            warn!("Failed to delete corrupt cache {}: {}", self.path.display(), e);
        }
    }

    /// Persist `releases` for `root`. `scanned_at` is the root mtime read before the walk that
    /// produced `releases`, so a change made during the walk leaves the cache stale. Failures are
    /// logged and reported as `false`.
    pub fn save(&self, root: &Path, releases: &[Release], scanned_at: f64) -> bool {
        match self.try_save(root, releases, scanned_at) {
            Ok(()) => {
                debug!("Saved {} releases to cache {}", releases.len(), self.path.display());
                true
            }
            Err(e) => {
                warn!("Failed to save cache {}: {}", self.path.display(), e);
                false
            }
        }
    }

    fn try_save(&self, root: &Path, releases: &[Release], scanned_at: f64) -> Result<()> {
        fs::create_dir_all(&self.cache_dir)?;
        let music_dir = root.to_string_lossy();
        let record = CacheRecordRef {
            version: CACHE_VERSION,
            music_dir: &music_dir,
            last_modified: scanned_at,
            releases,
        };

        let tmp = NamedTempFile::new_in(&self.cache_dir)?;
        let mut writer = BufWriter::new(tmp);
        serde_json::to_writer(&mut writer, &record)?;
        writer.flush()?;
        let tmp = writer.into_inner().map_err(|e| e.into_error())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Remove the cache file. A missing file is not an error.
    pub fn clear(&self) -> bool {
        match fs::remove_file(&self.path) {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => {
                warn!("Failed to clear cache {}: {}", self.path.display(), e);
                false
            }
        }
    }
}
