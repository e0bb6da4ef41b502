/// The common module is our grab bag of small shared helpers: dedup, case folding, mtimes and
/// logging setup.
use crate::error::{PickerError, Result};
use directories::ProjectDirs;
use once_cell::sync::OnceCell;
use std::collections::HashSet;
use std::fs;
use std::hash::Hash;
use std::path::Path;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, EnvFilter};
use unicode_normalization::UnicodeNormalization;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const APP_NAME: &str = "music-picker";

pub fn uniq<T: Clone + Eq + Hash>(xs: Vec<T>) -> Vec<T> {
    let mut rv = Vec::new();
    let mut seen = HashSet::new();
    for x in xs {
        if seen.insert(x.clone()) {
            rv.push(x);
        }
    }
    rv
}

/// Lowercased, compatibility-decomposed form of a string, used for presentation ordering.
pub fn casefold(s: &str) -> String {
    s.nfkd().filter(|c| !('\u{300}'..='\u{36f}').contains(c)).collect::<String>().to_lowercase()
}

/// Modification time of `path` as fractional seconds since the Unix epoch.
pub fn mtime_seconds(path: &Path) -> Result<f64> {
    let modified = fs::metadata(path)?.modified()?;
    Ok(system_time_seconds(modified))
}

pub fn system_time_seconds(t: SystemTime) -> f64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64(),
        Err(e) => -e.duration().as_secs_f64(),
    }
}

pub fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", APP_NAME).ok_or_else(|| PickerError::Generic("Failed to get project directories".to_string()))
}

static LOGGING_INITIALIZED: Mutex<Option<HashSet<Option<String>>>> = Mutex::new(None);
static LOG_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

pub fn initialize_logging(logger_name: Option<&str>, output: &str) -> Result<()> {
    {
        let mut initialized = LOGGING_INITIALIZED.lock().map_err(|e| PickerError::Generic(e.to_string()))?;
        let initialized = initialized.get_or_insert_with(HashSet::new);
        if !initialized.insert(logger_name.map(|s| s.to_string())) {
            return Ok(());
        }
    }

    let log_despite_testing = std::env::var("LOG_TEST").is_ok();
    let is_testing = std::env::var("CARGO_TEST").is_ok();
    if is_testing && !log_despite_testing {
        return Ok(());
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match output {
        "stderr" => {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(!log_despite_testing)
                .with_thread_ids(log_despite_testing)
                .with_line_number(log_despite_testing)
                .with_file(log_despite_testing)
                .finish();
            // Another subscriber may already be installed by the host application.
            let _ = tracing::subscriber::set_global_default(subscriber);
        }
        "file" => {
            let proj_dirs = project_dirs()?;
            let log_dir = if cfg!(target_os = "macos") {
                proj_dirs.cache_dir()
            } else {
                proj_dirs.state_dir().unwrap_or(proj_dirs.cache_dir())
            };
            fs::create_dir_all(log_dir)?;

            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix(APP_NAME)
                .filename_suffix("log")
                .build(log_dir)
                .map_err(|e| PickerError::Generic(format!("Failed to open log file: {e}")))?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let _ = LOG_GUARD.set(guard);

            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(env_filter)
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_file(true)
                .finish();
            let _ = tracing::subscriber::set_global_default(subscriber);
        }
        other => {
            return Err(PickerError::Generic(format!("Unknown log output {other:?}: expected \"stderr\" or \"file\"")));
        }
    }

    Ok(())
}
