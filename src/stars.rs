/// The stars module persists which releases the user starred. Stars are keyed by release path and
/// live in a small SQLite database next to the release cache. Unlike the cache they are user data,
/// so they are never invalidated.
use crate::common::system_time_seconds;
use crate::config::Config;
use crate::error::Result;
use crate::scanner::StarredLookup;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

const STARS_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS starred (
    path TEXT PRIMARY KEY,
    starred_at REAL NOT NULL
);
";

#[derive(Debug, Clone)]
pub struct StarStore {
    db_path: PathBuf,
}

impl StarStore {
    pub fn open(c: &Config) -> Result<Self> {
        fs::create_dir_all(&c.cache_dir)?;
        let store = Self {
            db_path: c.cache_dir.join("stars.sqlite3"),
        };
        store.connect()?.execute_batch(STARS_SCHEMA)?;
        Ok(store)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA busy_timeout = 15000;
            ",
        )?;
        Ok(conn)
    }

    fn try_is_starred(&self, path: &Path) -> Result<bool> {
        let conn = self.connect()?;
        let found: Option<i64> = conn
            .query_row("SELECT 1 FROM starred WHERE path = ?1", params![path.to_string_lossy()], |row| row.get(0))
            .optional()?;
        Ok(found.is_some())
    }

    pub fn is_starred(&self, path: &Path) -> bool {
        self.try_is_starred(path).unwrap_or_else(|e| {
            warn!("Failed to read star for {}: {}", path.display(), e);
            false
        })
    }

    pub fn set_starred(&self, path: &Path, starred: bool) -> Result<()> {
        let conn = self.connect()?;
        if starred {
            conn.execute(
                "INSERT INTO starred (path, starred_at) VALUES (?1, ?2) ON CONFLICT (path) DO NOTHING",
                params![path.to_string_lossy(), system_time_seconds(SystemTime::now())],
            )?;
        } else {
            conn.execute("DELETE FROM starred WHERE path = ?1", params![path.to_string_lossy()])?;
        }
        debug!("Set starred={} for {}", starred, path.display());
        Ok(())
    }

    /// Flip the star on `path` and return the new state.
    pub fn toggle(&self, path: &Path) -> Result<bool> {
        let starred = !self.try_is_starred(path)?;
        self.set_starred(path, starred)?;
        Ok(starred)
    }

    pub fn starred_paths(&self) -> Result<HashSet<PathBuf>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT path FROM starred ORDER BY starred_at")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut paths = HashSet::new();
        for row in rows {
            paths.insert(PathBuf::from(row?));
        }
        Ok(paths)
    }

    /// Every starred path, read once. Cheaper than `is_starred` per release during a scan.
    pub fn snapshot(&self) -> HashSet<PathBuf> {
        self.starred_paths().unwrap_or_else(|e| {
            warn!("Failed to read starred releases: {}", e);
            HashSet::new()
        })
    }
}

impl StarredLookup for StarStore {
    fn is_starred(&self, release_path: &Path) -> bool {
        StarStore::is_starred(self, release_path)
    }
}
