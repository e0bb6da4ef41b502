/// The scanner module walks a music source directory and turns every directory that directly
/// contains audio files into a Release.
///
/// There are two ways to drive it:
///
/// 1. `Scanner::releases` returns a lazy iterator that visits directories one by one, checking the
///    cancel flag between directories. This is what the library loader streams from.
/// 2. `Scanner::scan` collects everything at once, fanning out over a rayon pool for large trees.
///
/// Neither ever fails. Unreadable entries are logged and skipped, and an unreadable root is just
/// a tree with no releases in it.
use crate::config::Config;
use crate::releases::Release;
use crate::tracks::{is_audio_file, ArtworkMatcher, Track};
use rayon::prelude::*;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Below this many directories, `scan` does not bother with the thread pool.
pub const PARALLEL_THRESHOLD: usize = 50;

/// Answers "is this release starred?" for the scanner. Stars are owned elsewhere.
pub trait StarredLookup {
    fn is_starred(&self, release_path: &Path) -> bool;
}

impl<F> StarredLookup for F
where
    F: Fn(&Path) -> bool,
{
    fn is_starred(&self, release_path: &Path) -> bool {
        self(release_path)
    }
}

impl StarredLookup for HashSet<PathBuf> {
    fn is_starred(&self, release_path: &Path) -> bool {
        self.contains(release_path)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoStars;

impl StarredLookup for NoStars {
    fn is_starred(&self, _: &Path) -> bool {
        false
    }
}

/// Cooperative cancellation shared between the caller and a running scan.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanProgress {
    pub processed: usize,
    pub total: usize,
}

impl ScanProgress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.processed as f64 / self.total as f64
    }
}

pub type ProgressCallback = Arc<dyn Fn(ScanProgress) + Send + Sync>;

#[derive(Clone)]
pub struct Scanner {
    audio_extensions: Vec<String>,
    artwork: ArtworkMatcher,
    ignored: HashSet<String>,
    max_depth: usize,
    max_proc: usize,
    progress_interval: usize,
    starred: Arc<dyn StarredLookup + Send + Sync>,
    progress: Option<ProgressCallback>,
    cancel: CancelFlag,
}

impl fmt::Debug for Scanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scanner")
            .field("audio_extensions", &self.audio_extensions)
            .field("max_depth", &self.max_depth)
            .field("max_proc", &self.max_proc)
            .field("progress_interval", &self.progress_interval)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl Scanner {
    pub fn new(c: &Config) -> Self {
        Self {
            audio_extensions: c.audio_extensions.clone(),
            artwork: ArtworkMatcher::new(&c.artwork_patterns, &c.valid_art_exts),
            ignored: c.ignore_release_directories.iter().cloned().collect(),
            max_depth: c.max_depth.max(1),
            max_proc: c.max_proc.max(1),
            progress_interval: c.progress_interval.max(1),
            starred: Arc::new(NoStars),
            progress: None,
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_starred(mut self, starred: Arc<dyn StarredLookup + Send + Sync>) -> Self {
        self.starred = starred;
        self
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    fn report(&self, processed: usize, total: usize) {
        if let Some(progress) = &self.progress {
            progress(ScanProgress { processed, total });
        }
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        name.starts_with('.') || (entry.file_type().is_dir() && self.ignored.contains(name.as_ref()))
    }

    /// Every directory below `root` that could be a release, in walk order. The root itself is
    /// never a candidate.
    /// A cancelled scan stops listing and returns what it found so far.
    pub fn discover(&self, root: &Path) -> Vec<PathBuf> {
        if !root.is_dir() {
            warn!("Music directory {} is not accessible; no releases found", root.display());
            return vec![];
        }

        let mut dirs = vec![];
        let walker = WalkDir::new(root)
            .min_depth(1)
            .max_depth(self.max_depth)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !self.is_excluded(e));
        for entry in walker {
            if self.cancel.is_cancelled() {
                debug!("Discovery under {} cancelled after {} directories", root.display(), dirs.len());
                break;
            }
            match entry {
                Ok(entry) if entry.file_type().is_dir() => dirs.push(entry.into_path()),
                Ok(_) => {}
                Err(e) => warn!("Skipping unreadable entry under {}: {}", root.display(), e),
            }
        }
        debug!("Discovered {} candidate directories under {}", dirs.len(), root.display());
        dirs
    }

    /// Build the release for `dir`, or nothing if `dir` has no audio files of its own. A release
    /// is only returned once all of its tracks are collected.
    pub fn build_release(&self, dir: &Path) -> Option<Release> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to read directory {}: {}", dir.display(), e);
                return None;
            }
        };

        let mut audio = vec![];
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                    continue;
                }
            };
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            let path = entry.path();
            // is_file follows symlinks; broken links fall out here.
            if path.is_file() && is_audio_file(&path, &self.audio_extensions) {
                audio.push(path);
            }
        }
        if audio.is_empty() {
            return None;
        }

        let artwork = self.artwork.find(dir);
        let mut release = Release::new(dir);
        release.starred = self.starred.is_starred(dir);
        release.attach(audio.into_iter().map(|p| Track::new(p, artwork.clone())));
        Some(release)
    }

    /// Lazily walk `root`. Discovery happens on the first call to `next`.
    pub fn releases(&self, root: &Path) -> ReleaseWalk {
        ReleaseWalk {
            scanner: self.clone(),
            root: root.to_path_buf(),
            pending: None,
            total: 0,
            processed: 0,
            last_reported: None,
            finished: false,
        }
    }

    /// Scan `root` to completion. Output order is unspecified; sort by `Release::sort_key` for
    /// presentation.
    pub fn scan(&self, root: &Path) -> Vec<Release> {
        let dirs = self.discover(root);
        let total = dirs.len();
        if total < PARALLEL_THRESHOLD {
            let mut walk = self.releases(root);
            walk.total = total;
            walk.pending = Some(dirs.into_iter());
            return walk.collect();
        }

        info!("Scanning {} directories with {} threads", total, self.max_proc);
        let processed = AtomicUsize::new(0);
        let batch_size = (total / self.max_proc).max(PARALLEL_THRESHOLD);
        let work = || {
            dirs.par_chunks(batch_size)
                .flat_map_iter(|chunk| {
                    chunk
                        .iter()
                        .filter_map(|dir| {
                            if self.cancel.is_cancelled() {
                                return None;
                            }
                            let release = self.build_release(dir);
                            let n = processed.fetch_add(1, Ordering::SeqCst) + 1;
                            if n % self.progress_interval == 0 {
                                self.report(n, total);
                            }
                            release
                        })
                        .collect::<Vec<_>>()
                })
                .collect::<Vec<_>>()
        };
        let releases = match rayon::ThreadPoolBuilder::new().num_threads(self.max_proc).build() {
            Ok(pool) => pool.install(work),
            Err(e) => {
                warn!("Failed to build scan thread pool, using the global one: {}", e);
                work()
            }
        };

        if self.cancel.is_cancelled() {
            info!("Scan of {} cancelled after {} directories", root.display(), processed.load(Ordering::SeqCst));
        } else if total % self.progress_interval != 0 {
            self.report(total, total);
        }
        releases
    }
}

/// Lazy, cancellable walk over the releases under a root. See `Scanner::releases`.
pub struct ReleaseWalk {
    scanner: Scanner,
    root: PathBuf,
    pending: Option<std::vec::IntoIter<PathBuf>>,
    total: usize,
    processed: usize,
    last_reported: Option<usize>,
    finished: bool,
}

impl ReleaseWalk {
    pub fn progress(&self) -> ScanProgress {
        ScanProgress {
            processed: self.processed,
            total: self.total,
        }
    }

    fn report(&mut self) {
        self.scanner.report(self.processed, self.total);
        self.last_reported = Some(self.processed);
    }
}

impl Iterator for ReleaseWalk {
    type Item = Release;

    fn next(&mut self) -> Option<Release> {
        if self.finished {
            return None;
        }
        if self.scanner.cancel.is_cancelled() {
            debug!("Walk of {} cancelled after {} directories", self.root.display(), self.processed);
            self.finished = true;
            return None;
        }
        if self.pending.is_none() {
            let dirs = self.scanner.discover(&self.root);
            self.total = dirs.len();
            self.pending = Some(dirs.into_iter());
        }

        loop {
            if self.scanner.cancel.is_cancelled() {
                debug!("Walk of {} cancelled after {} directories", self.root.display(), self.processed);
                self.finished = true;
                return None;
            }
            let Some(dir) = self.pending.as_mut().and_then(|p| p.next()) else {
                self.finished = true;
                if self.last_reported != Some(self.processed) {
                    self.report();
                }
                return None;
            };

            let release = self.scanner.build_release(&dir);
            self.processed += 1;
            if self.processed % self.scanner.progress_interval == 0 {
                self.report();
            }
            if release.is_some() {
                return release;
            }
        }
    }
}
