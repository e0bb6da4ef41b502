use crate::scanner::{Scanner, StarredLookup};
use crate::stars::*;
use crate::testing;
use std::sync::Arc;

#[test]
fn test_star_round_trip() {
    let (config, _tmp) = testing::config();
    let store = StarStore::open(&config).unwrap();
    let path = config.music_source_dir.join("Artist-Title-2023-GROUP");

    assert!(!store.is_starred(&path));
    store.set_starred(&path, true).unwrap();
    assert!(store.is_starred(&path));
    // Starring twice is a no-op.
    store.set_starred(&path, true).unwrap();
    assert_eq!(store.starred_paths().unwrap().len(), 1);

    store.set_starred(&path, false).unwrap();
    assert!(!store.is_starred(&path));
    assert!(store.starred_paths().unwrap().is_empty());
}

#[test]
fn test_toggle() {
    let (config, _tmp) = testing::config();
    let store = StarStore::open(&config).unwrap();
    let path = config.music_source_dir.join("r1");
    assert!(store.toggle(&path).unwrap());
    assert!(store.is_starred(&path));
    assert!(!store.toggle(&path).unwrap());
    assert!(!store.is_starred(&path));
}

#[test]
fn test_stars_persist_across_opens() {
    let (config, _tmp) = testing::config();
    let path = config.music_source_dir.join("r1");
    StarStore::open(&config).unwrap().set_starred(&path, true).unwrap();

    let store = StarStore::open(&config).unwrap();
    assert!(store.db_path().starts_with(&config.cache_dir));
    assert!(store.snapshot().contains(&path));
    assert!(StarredLookup::is_starred(&store, &path));
}

#[test]
fn test_store_drives_scanner() {
    let (config, _tmp) = testing::seeded_music();
    let store = StarStore::open(&config).unwrap();
    let starred = config.music_source_dir.join("Artist-Title-2023-GROUP");
    store.set_starred(&starred, true).unwrap();

    let releases = Scanner::new(&config).with_starred(Arc::new(store.snapshot())).scan(&config.music_source_dir);
    assert_eq!(releases.iter().filter(|r| r.starred).map(|r| r.path.clone()).collect::<Vec<_>>(), vec![starred.clone()]);

    let releases = Scanner::new(&config).with_starred(Arc::new(store)).scan(&config.music_source_dir);
    assert_eq!(releases.iter().filter(|r| r.starred).count(), 1);
}

#[test]
fn test_unreadable_store_reads_as_unstarred() {
    let (config, _tmp) = testing::config();
    let store = StarStore::open(&config).unwrap();
    std::fs::remove_dir_all(&config.cache_dir).unwrap();
    let path = config.music_source_dir.join("r1");
    assert!(!store.is_starred(&path));
    assert!(store.snapshot().is_empty());
}
