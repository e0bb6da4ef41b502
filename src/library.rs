/// The library module loads a music directory in the background and streams the result to the
/// caller over a channel.
///
/// A load first tries the release cache. On a hit, the cached releases are sent right away and,
/// if enabled, a full rescan runs afterwards to catch changes the coarse cache check missed; the
/// caller only hears about it again if the set of release paths changed. On a miss, the tree is
/// walked and releases are sent in sorted batches as they are found, then saved to the cache.
use crate::cache::ReleaseCache;
use crate::common::mtime_seconds;
use crate::config::Config;
use crate::error::{PickerError, Result};
use crate::releases::Release;
use crate::scanner::{CancelFlag, NoStars, ScanProgress, Scanner, StarredLookup};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub enum LibraryEvent {
    Progress(ScanProgress),
    /// A sorted batch of newly found releases.
    Releases(Vec<Release>),
    /// The complete, sorted release list, replacing everything sent before.
    Refreshed(Vec<Release>),
    Finished { total: usize, from_cache: bool },
}

/// Presentation order: case-folded artist + title, then path.
pub fn sort_releases(releases: &mut [Release]) {
    releases.sort_by_cached_key(|r| (r.sort_key(), r.path.clone()));
}

pub fn path_set(releases: &[Release]) -> HashSet<PathBuf> {
    releases.iter().map(|r| r.path.clone()).collect()
}

/// Releases from `incoming` replace those in `existing` with the same path; the rest are appended.
pub fn merge_by_path(existing: Vec<Release>, incoming: Vec<Release>) -> Vec<Release> {
    let mut index: HashMap<PathBuf, usize> = HashMap::new();
    let mut merged = existing;
    for (i, release) in merged.iter().enumerate() {
        index.insert(release.path.clone(), i);
    }
    for release in incoming {
        match index.get(&release.path) {
            Some(&i) => merged[i] = release,
            None => {
                index.insert(release.path.clone(), merged.len());
                merged.push(release);
            }
        }
    }
    merged
}

/// The root mtime to stamp a scan's cache with. Read before walking; `None` means nothing gets
/// cached.
fn root_mtime(root: &Path) -> Option<f64> {
    match mtime_seconds(root) {
        Ok(t) => Some(t),
        Err(e) => {
            warn!("Failed to stat music directory {}, not caching this scan: {}", root.display(), e);
            None
        }
    }
}

#[derive(Clone)]
pub struct LibraryLoader {
    config: Arc<Config>,
    starred: Arc<dyn StarredLookup + Send + Sync>,
    cancel: CancelFlag,
}

impl LibraryLoader {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            starred: Arc::new(NoStars),
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_starred(mut self, starred: Arc<dyn StarredLookup + Send + Sync>) -> Self {
        self.starred = starred;
        self
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Start loading `root` on a worker thread.
    pub fn spawn(&self, root: impl Into<PathBuf>) -> Result<LibraryHandle> {
        let root = root.into();
        let (tx, rx) = mpsc::channel();
        let loader = self.clone();
        let thread = thread::Builder::new().name("library-loader".to_string()).spawn(move || loader.load(&root, &tx))?;
        Ok(LibraryHandle {
            events: rx,
            cancel: self.cancel.clone(),
            thread: Some(thread),
        })
    }

    /// Load `root` on the current thread, sending events to `tx`. A closed channel stops nothing;
    /// the load still completes and updates the cache.
    pub fn load(&self, root: &Path, tx: &Sender<LibraryEvent>) {
        let cache = ReleaseCache::new(&self.config, root);
        match cache.load(root) {
            (true, Some(releases)) => self.load_cached(root, &cache, releases, tx),
            _ => self.load_fresh(root, &cache, tx),
        }
    }

    fn scanner(&self) -> Scanner {
        Scanner::new(&self.config).with_starred(self.starred.clone()).with_cancel(self.cancel.clone())
    }

    fn send_batches(&self, releases: &[Release], tx: &Sender<LibraryEvent>) {
        for chunk in releases.chunks(self.config.batch_size.max(1)) {
            let _ = tx.send(LibraryEvent::Releases(chunk.to_vec()));
        }
    }

    fn load_cached(&self, root: &Path, cache: &ReleaseCache, mut releases: Vec<Release>, tx: &Sender<LibraryEvent>) {
        // Stars may have changed since the cache was written.
        for release in &mut releases {
            release.starred = self.starred.is_starred(&release.path);
        }
        sort_releases(&mut releases);
        info!("Loaded {} releases for {} from cache", releases.len(), root.display());
        self.send_batches(&releases, tx);
        let _ = tx.send(LibraryEvent::Finished {
            total: releases.len(),
            from_cache: true,
        });

        if !self.config.background_refresh || self.cancel.is_cancelled() {
            return;
        }
        let scanned_at = root_mtime(root);
        let mut fresh = self.scanner().scan(root);
        if self.cancel.is_cancelled() {
            debug!("Background refresh of {} cancelled", root.display());
            return;
        }
        if path_set(&fresh) == path_set(&releases) {
            debug!("Background refresh of {} found no changes", root.display());
            return;
        }
        sort_releases(&mut fresh);
        info!("Background refresh of {} found {} releases (was {})", root.display(), fresh.len(), releases.len());
        if let Some(scanned_at) = scanned_at {
            cache.save(root, &fresh, scanned_at);
        }
        let _ = tx.send(LibraryEvent::Refreshed(fresh));
    }

    fn load_fresh(&self, root: &Path, cache: &ReleaseCache, tx: &Sender<LibraryEvent>) {
        let progress_tx = Mutex::new(tx.clone());
        let scanner = self.scanner().with_progress(Arc::new(move |progress: ScanProgress| {
            if let Ok(tx) = progress_tx.lock() {
                let _ = tx.send(LibraryEvent::Progress(progress));
            }
        }));

        let scanned_at = root_mtime(root);
        let batch_size = self.config.batch_size.max(1);
        let mut all: Vec<Release> = vec![];
        let mut batch: Vec<Release> = vec![];
        for release in scanner.releases(root) {
            batch.push(release);
            if batch.len() >= batch_size {
                self.flush_batch(&mut batch, &mut all, tx);
            }
        }
        self.flush_batch(&mut batch, &mut all, tx);

        if self.cancel.is_cancelled() {
            info!("Load of {} cancelled after {} releases", root.display(), all.len());
        } else {
            info!("Scanned {} releases under {}", all.len(), root.display());
            if let Some(scanned_at) = scanned_at {
                cache.save(root, &all, scanned_at);
            }
        }
        let _ = tx.send(LibraryEvent::Finished {
            total: all.len(),
            from_cache: false,
        });
    }

    fn flush_batch(&self, batch: &mut Vec<Release>, all: &mut Vec<Release>, tx: &Sender<LibraryEvent>) {
        if batch.is_empty() {
            return;
        }
        sort_releases(batch);
        let _ = tx.send(LibraryEvent::Releases(batch.clone()));
        all.append(batch);
    }
}

/// What a finished load produced, as assembled by `LibraryHandle::collect`.
#[derive(Debug, Clone, Default)]
pub struct LoadedLibrary {
    /// Sorted for presentation.
    pub releases: Vec<Release>,
    pub from_cache: bool,
    pub refreshed: bool,
    pub progress: Vec<ScanProgress>,
}

pub struct LibraryHandle {
    events: Receiver<LibraryEvent>,
    cancel: CancelFlag,
    thread: Option<JoinHandle<()>>,
}

impl LibraryHandle {
    pub fn events(&self) -> &Receiver<LibraryEvent> {
        &self.events
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn join(mut self) -> Result<()> {
        self.join_thread()
    }

    fn join_thread(&mut self) -> Result<()> {
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| PickerError::Generic("Library loader thread panicked".to_string())),
            None => Ok(()),
        }
    }

    /// Drain every event until the worker exits and fold them into the final release list.
    pub fn collect(mut self) -> Result<LoadedLibrary> {
        let mut loaded = LoadedLibrary::default();
        for event in self.events.iter() {
            match event {
                LibraryEvent::Progress(p) => loaded.progress.push(p),
                LibraryEvent::Releases(batch) => {
                    loaded.releases = merge_by_path(std::mem::take(&mut loaded.releases), batch);
                }
                LibraryEvent::Refreshed(releases) => {
                    loaded.releases = releases;
                    loaded.refreshed = true;
                }
                LibraryEvent::Finished { from_cache, .. } => loaded.from_cache = from_cache,
            }
        }
        self.join_thread()?;
        sort_releases(&mut loaded.releases);
        Ok(loaded)
    }
}
