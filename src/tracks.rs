/// The tracks module holds the Track type and the filesystem checks that decide what a track is and
/// which image in its directory is its artwork.
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub path: PathBuf,
    pub artwork_path: Option<PathBuf>,
    /// Directory of the owning release. Set once, by `Release::attach`.
    #[serde(skip)]
    pub(crate) release_path: Option<PathBuf>,
}

impl Track {
    pub fn new(path: impl Into<PathBuf>, artwork_path: Option<PathBuf>) -> Self {
        Self {
            path: path.into(),
            artwork_path,
            release_path: None,
        }
    }

    pub fn release_path(&self) -> Option<&Path> {
        self.release_path.as_deref()
    }

    pub fn file_name(&self) -> String {
        self.path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.artwork_path == other.artwork_path
    }
}

/// `extensions` are lowercase and dot-prefixed, as stored in the config.
pub fn is_audio_file(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = path.extension() else {
        return false;
    };
    let ext = format!(".{}", ext.to_string_lossy().to_lowercase());
    extensions.iter().any(|e| *e == ext)
}

static GLOB_SPECIALS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[*?]").unwrap());

/// Ordered shell-style filename patterns (`*cover*.*`, `folder.*`) compiled to case-insensitive
/// regexes. Earlier patterns win.
#[derive(Debug, Clone)]
pub struct ArtworkMatcher {
    patterns: Vec<Regex>,
    valid_exts: Vec<String>,
}

impl ArtworkMatcher {
    pub fn new(patterns: &[String], valid_exts: &[String]) -> Self {
        Self {
            patterns: patterns.iter().filter_map(|p| compile_glob(p)).collect(),
            valid_exts: valid_exts.iter().map(|e| e.trim_start_matches('.').to_lowercase()).collect(),
        }
    }

    fn has_valid_ext(&self, name: &str) -> bool {
        match name.rsplit_once('.') {
            Some((_, ext)) => self.valid_exts.iter().any(|e| e.eq_ignore_ascii_case(ext)),
            None => false,
        }
    }

    /// Pick the artwork from a list of file names in one directory.
    pub fn select<'a>(&self, names: &'a [String]) -> Option<&'a str> {
        for pattern in &self.patterns {
            for name in names {
                if pattern.is_match(name) && self.has_valid_ext(name) {
                    return Some(name);
                }
            }
        }
        None
    }

    /// First matching image in `dir`. Files are considered in name order; hidden files never match.
    pub fn find(&self, dir: &Path) -> Option<PathBuf> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Failed to list {} for artwork: {}", dir.display(), e);
                return None;
            }
        };
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| !t.is_dir()).unwrap_or(false))
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| !name.starts_with('.'))
            .collect();
        names.sort();
        self.select(&names).map(|name| dir.join(name))
    }
}

fn compile_glob(pattern: &str) -> Option<Regex> {
    let mut re = String::from("(?i)^");
    let mut last = 0;
    for m in GLOB_SPECIALS.find_iter(pattern) {
        re.push_str(&regex::escape(&pattern[last..m.start()]));
        re.push_str(if m.as_str() == "*" { ".*" } else { "." });
        last = m.end();
    }
    re.push_str(&regex::escape(&pattern[last..]));
    re.push('$');
    Regex::new(&re).ok()
}

pub fn find_artwork(dir: &Path, patterns: &[String], valid_exts: &[String]) -> Option<PathBuf> {
    ArtworkMatcher::new(patterns, valid_exts).find(dir)
}
