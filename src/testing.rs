use crate::config::Config;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tempfile::TempDir;

static INIT: Once = Once::new();

pub fn init() -> TempDir {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")))
            .with_test_writer()
            .try_init();
    });
    TempDir::new().expect("failed to create temp dir")
}

// Creates a test config with an empty music directory and cache directory.
pub fn config() -> (Config, TempDir) {
    let temp_dir = init();
    let base_path = temp_dir.path();

    fs::create_dir_all(base_path.join("cache")).expect("failed to create cache dir");
    fs::create_dir_all(base_path.join("music")).expect("failed to create music dir");

    let mut config = Config::new(base_path.join("music"), base_path.join("cache"));
    config.max_proc = 2;
    (config, temp_dir)
}

/// Create `root/name` with the given (empty) files in it.
pub fn release_dir(root: &Path, name: &str, files: &[&str]) -> PathBuf {
    let dir = root.join(name);
    fs::create_dir_all(&dir).expect("failed to create release dir");
    for file in files {
        fs::write(dir.join(file), b"").expect("failed to create file");
    }
    dir
}

// Creates a small music tree: three releases, one nested, plus directories that must not count.
pub fn seeded_music() -> (Config, TempDir) {
    let (config, temp_dir) = config();
    let music = &config.music_source_dir;

    release_dir(music, "Artist-Title-2023-GROUP", &["01.flac", "02.flac", "cover.jpg"]);
    release_dir(music, "VA-Compilation_Title-2022-GRP", &["01.mp3", "folder.png", "notes.nfo"]);
    release_dir(music, "Label/Converge-Jane_Doe-2001-XXX", &["01.FLAC"]);
    release_dir(music, "Empty-Release-2020-GRP", &["readme.txt"]);
    release_dir(music, ".hidden/Hidden-Release-2020-GRP", &["01.flac"]);

    (config, temp_dir)
}
