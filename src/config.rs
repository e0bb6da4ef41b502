/// The config module provides the config schema and parsing logic.
///
/// Configuration lives in a TOML file. Only `music_source_dir` is required; everything else has a
/// default. Unrecognized keys are not fatal, we warn about them instead.
use crate::common::project_dirs;
use crate::error::{PickerExpectedError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DEFAULT_AUDIO_EXTENSIONS: &[&str] = &[".mp3", ".flac", ".wav", ".m4a", ".aac", ".ogg", ".opus", ".wma", ".ape", ".alac"];

pub const DEFAULT_ARTWORK_PATTERNS: &[&str] = &["*cover*.*", "*artwork*.*", "*front*.*", "folder.*", "*.jpg", "*.jpeg", "*.png"];

pub const DEFAULT_VALID_ART_EXTS: &[&str] = &["jpg", "jpeg", "png"];

pub const DEFAULT_MAX_DEPTH: usize = 10;
pub const DEFAULT_PROGRESS_INTERVAL: usize = 10;
pub const DEFAULT_BATCH_SIZE: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub music_source_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub max_proc: usize,
    /// Directories deeper than this below the music source dir are never visited.
    pub max_depth: usize,
    /// Emit a progress update every this many directories.
    pub progress_interval: usize,
    /// Number of releases handed to the consumer per batch.
    pub batch_size: usize,
    /// Lowercase, dot-prefixed.
    pub audio_extensions: Vec<String>,
    pub artwork_patterns: Vec<String>,
    /// Lowercase, without the dot.
    pub valid_art_exts: Vec<String>,
    pub ignore_release_directories: Vec<String>,
    pub background_refresh: bool,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    music_source_dir: Option<String>,
    cache_dir: Option<String>,
    max_proc: Option<i64>,
    max_depth: Option<i64>,
    progress_interval: Option<i64>,
    batch_size: Option<i64>,
    audio_extensions: Option<Vec<String>>,
    artwork_patterns: Option<Vec<String>>,
    valid_art_exts: Option<Vec<String>>,
    ignore_release_directories: Option<Vec<String>>,
    background_refresh: Option<bool>,
    #[serde(flatten)]
    unrecognized: toml::Table,
}

impl Config {
    /// A config with every optional value at its default.
    pub fn new(music_source_dir: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            music_source_dir: music_source_dir.into(),
            cache_dir: cache_dir.into(),
            max_proc: num_cpus::get().max(1),
            max_depth: DEFAULT_MAX_DEPTH,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            batch_size: DEFAULT_BATCH_SIZE,
            audio_extensions: DEFAULT_AUDIO_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            artwork_patterns: DEFAULT_ARTWORK_PATTERNS.iter().map(|s| s.to_string()).collect(),
            valid_art_exts: DEFAULT_VALID_ART_EXTS.iter().map(|s| s.to_string()).collect(),
            ignore_release_directories: vec![],
            background_refresh: true,
        }
    }

    pub fn default_config_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    pub fn default_cache_dir() -> Result<PathBuf> {
        Ok(project_dirs()?.cache_dir().to_path_buf())
    }

    /// Read and validate the configuration file. Pass `None` to read the default location.
    pub fn parse(config_path_override: Option<&Path>) -> Result<Self> {
        let cfgpath = match config_path_override {
            Some(p) => p.to_path_buf(),
            None => Self::default_config_path()?,
        };

        let text = fs::read_to_string(&cfgpath).map_err(|_| PickerExpectedError::ConfigNotFound { path: cfgpath.clone() })?;
        Self::parse_str(&cfgpath, &text)
    }

    pub fn parse_str(cfgpath: &Path, text: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(text).map_err(|e| PickerExpectedError::ConfigDecode {
            path: cfgpath.to_path_buf(),
            message: e.to_string(),
        })?;

        let music_source_dir = match raw.music_source_dir {
            Some(dir) => expand_path(&dir),
            None => {
                return Err(PickerExpectedError::MissingConfigKey {
                    key: "music_source_dir".to_string(),
                    path: cfgpath.to_path_buf(),
                }
                .into())
            }
        };
        let cache_dir = match raw.cache_dir {
            Some(dir) => expand_path(&dir),
            None => Self::default_cache_dir()?,
        };

        let mut config = Self::new(music_source_dir, cache_dir);

        if let Some(v) = raw.max_proc {
            config.max_proc = positive(cfgpath, "max_proc", v)?;
        }
        if let Some(v) = raw.max_depth {
            config.max_depth = positive(cfgpath, "max_depth", v)?;
        }
        if let Some(v) = raw.progress_interval {
            config.progress_interval = positive(cfgpath, "progress_interval", v)?;
        }
        if let Some(v) = raw.batch_size {
            config.batch_size = positive(cfgpath, "batch_size", v)?;
        }
        if let Some(exts) = raw.audio_extensions {
            config.audio_extensions = exts
                .into_iter()
                .map(|e| {
                    let e = e.to_lowercase();
                    if e.starts_with('.') {
                        e
                    } else {
                        format!(".{e}")
                    }
                })
                .collect();
        }
        if let Some(patterns) = raw.artwork_patterns {
            if patterns.is_empty() {
                return Err(PickerExpectedError::InvalidConfigValue {
                    key: "artwork_patterns".to_string(),
                    path: cfgpath.to_path_buf(),
                    message: "must contain at least one pattern".to_string(),
                }
                .into());
            }
            config.artwork_patterns = patterns;
        }
        if let Some(exts) = raw.valid_art_exts {
            config.valid_art_exts = exts.into_iter().map(|e| e.trim_start_matches('.').to_lowercase()).collect();
        }
        if let Some(ignored) = raw.ignore_release_directories {
            config.ignore_release_directories = ignored;
        }
        if let Some(v) = raw.background_refresh {
            config.background_refresh = v;
        }

        for key in raw.unrecognized.keys() {
            warn!("Unrecognized key {} in configuration file ({})", key, cfgpath.display());
        }

        Ok(config)
    }
}

fn expand_path(s: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(s).into_owned())
}

fn positive(cfgpath: &Path, key: &str, value: i64) -> Result<usize> {
    if value <= 0 {
        return Err(PickerExpectedError::InvalidConfigValue {
            key: key.to_string(),
            path: cfgpath.to_path_buf(),
            message: format!("must be a positive integer: got {value}"),
        }
        .into());
    }
    Ok(value as usize)
}
