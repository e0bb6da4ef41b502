use crate::config::*;
use crate::error::{PickerError, PickerExpectedError};
use tempfile::TempDir;

fn home() -> std::path::PathBuf {
    directories::BaseDirs::new().unwrap().home_dir().to_path_buf()
}

#[test]
fn test_config_minimal() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    std::fs::write(
        &config_path,
        r#"
        music_source_dir = "~/.music-src"
        "#,
    )
    .unwrap();

    let config = Config::parse(Some(&config_path)).unwrap();

    assert_eq!(config.music_source_dir, home().join(".music-src"));
    assert_eq!(config.cache_dir, Config::default_cache_dir().unwrap());
    assert!(config.max_proc >= 1);
    assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
    assert_eq!(config.progress_interval, DEFAULT_PROGRESS_INTERVAL);
    assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
    assert_eq!(config.audio_extensions, DEFAULT_AUDIO_EXTENSIONS);
    assert_eq!(config.artwork_patterns, DEFAULT_ARTWORK_PATTERNS);
    assert_eq!(config.valid_art_exts, DEFAULT_VALID_ART_EXTS);
    assert!(config.ignore_release_directories.is_empty());
    assert!(config.background_refresh);
}

#[test]
fn test_config_full() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    let cache_dir = temp_dir.path().join("cache");

    let config_content = format!(
        r#"
        music_source_dir = "~/.music-src"
        cache_dir = "{}"
        max_proc = 8
        max_depth = 4
        progress_interval = 25
        batch_size = 100
        audio_extensions = [ "FLAC", ".mp3" ]
        artwork_patterns = [ "cover.*" ]
        valid_art_exts = [ ".PNG", "webp" ]
        ignore_release_directories = [ "dummy boy" ]
        background_refresh = false
        "#,
        cache_dir.display()
    );
    std::fs::write(&config_path, config_content).unwrap();

    let config = Config::parse(Some(&config_path)).unwrap();
    assert_eq!(config.music_source_dir, home().join(".music-src"));
    assert_eq!(config.cache_dir, cache_dir);
    assert_eq!(config.max_proc, 8);
    assert_eq!(config.max_depth, 4);
    assert_eq!(config.progress_interval, 25);
    assert_eq!(config.batch_size, 100);
    assert_eq!(config.audio_extensions, vec![".flac", ".mp3"]);
    assert_eq!(config.artwork_patterns, vec!["cover.*"]);
    assert_eq!(config.valid_art_exts, vec!["png", "webp"]);
    assert_eq!(config.ignore_release_directories, vec!["dummy boy"]);
    assert!(!config.background_refresh);
}

#[test]
fn test_config_unrecognized_keys_are_not_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        r#"
        music_source_dir = "/music"
        window_width = 800
        "#,
    )
    .unwrap();
    let config = Config::parse(Some(&config_path)).unwrap();
    assert_eq!(config.music_source_dir, std::path::PathBuf::from("/music"));
}

#[test]
fn test_config_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    let result = Config::parse(Some(&config_path));
    assert!(matches!(result, Err(PickerError::Expected(PickerExpectedError::ConfigNotFound { .. }))));
}

#[test]
fn test_config_decode_error() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "music_source_dir = [").unwrap();
    let result = Config::parse(Some(&config_path));
    assert!(matches!(result, Err(PickerError::Expected(PickerExpectedError::ConfigDecode { .. }))));

    // Wrong type for a known key is a decode error too.
    std::fs::write(&config_path, "music_source_dir = \"/m\"\nmax_proc = \"lots\"").unwrap();
    let result = Config::parse(Some(&config_path));
    assert!(matches!(result, Err(PickerError::Expected(PickerExpectedError::ConfigDecode { .. }))));
}

#[test]
fn test_config_missing_key_validation() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "max_proc = 2").unwrap();
    let result = Config::parse(Some(&config_path));
    assert!(matches!(
        result,
        Err(PickerError::Expected(PickerExpectedError::MissingConfigKey { ref key, .. })) if key == "music_source_dir"
    ));
}

#[test]
fn test_config_value_validation() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    for key in ["max_proc", "max_depth", "progress_interval", "batch_size"] {
        std::fs::write(&config_path, format!("music_source_dir = \"/m\"\n{key} = 0")).unwrap();
        let result = Config::parse(Some(&config_path));
        assert!(
            matches!(result, Err(PickerError::Expected(PickerExpectedError::InvalidConfigValue { key: ref k, .. })) if k == key),
            "{key}"
        );
    }

    std::fs::write(&config_path, "music_source_dir = \"/m\"\nartwork_patterns = []").unwrap();
    let result = Config::parse(Some(&config_path));
    assert!(matches!(
        result,
        Err(PickerError::Expected(PickerExpectedError::InvalidConfigValue { ref key, .. })) if key == "artwork_patterns"
    ));
}

#[test]
fn test_default_values() {
    let config = Config::new("/music", "/cache");
    assert_eq!(config.music_source_dir, std::path::PathBuf::from("/music"));
    assert_eq!(config.cache_dir, std::path::PathBuf::from("/cache"));
    assert_eq!(config.max_proc, num_cpus::get().max(1));
    assert_eq!(config.max_depth, 10);
    assert_eq!(config.progress_interval, 10);
    assert_eq!(config.batch_size, 50);
    assert!(config.audio_extensions.iter().all(|e| e.starts_with('.') && *e == e.to_lowercase()));
}
