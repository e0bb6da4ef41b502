use crate::releases::*;
use crate::tracks::Track;
use std::path::{Path, PathBuf};

#[test]
fn test_release_from_directory_name() {
    let release = Release::new("/music/Artist-Title-LTD-2023-GROUP_INT");
    assert_eq!(release.path, PathBuf::from("/music/Artist-Title-LTD-2023-GROUP_INT"));
    assert_eq!(release.artist, "Artist");
    assert_eq!(release.title, "Title");
    assert_eq!(release.year, Some(2023));
    assert_eq!(release.label.as_deref(), Some("GROUP"));
    assert_eq!(release.tags_string(), "INT · Limited Edition");
    assert_eq!(release.label_string(), "GROUP");
    assert!(!release.starred);
    assert_eq!(release.track_count(), 0);
}

#[test]
fn test_attach_sets_back_reference_and_orders_tracks() {
    let mut release = Release::new("/music/Artist-Title-2023-GROUP");
    release.attach(vec![
        Track::new("/music/Artist-Title-2023-GROUP/02.flac", None),
        Track::new("/music/Artist-Title-2023-GROUP/01.flac", Some(PathBuf::from("/music/Artist-Title-2023-GROUP/cover.jpg"))),
    ]);
    assert_eq!(release.track_count(), 2);
    assert_eq!(release.tracks[0].file_name(), "01.flac");
    for track in &release.tracks {
        assert_eq!(track.release_path(), Some(Path::new("/music/Artist-Title-2023-GROUP")));
    }
    assert_eq!(release.artwork_path(), Some(Path::new("/music/Artist-Title-2023-GROUP/cover.jpg")));
}

#[test]
fn test_sort_key_is_case_and_accent_insensitive() {
    let a = Release::new("/m/Émile-Album-2020-GRP");
    let b = Release::new("/m/emile-album-2020-GRP");
    assert_eq!(a.sort_key(), b.sort_key());
    assert_eq!(a.sort_key(), "emilealbum");
}

#[test]
fn test_empty_helpers() {
    let release = Release::new("/m/Artist");
    assert_eq!(release.tags_string(), "");
    assert_eq!(release.label_string(), "");
    assert_eq!(release.artwork_path(), None);
}

#[test]
fn test_json_shape() {
    let mut release = Release::new("/m/Artist-Title-2023-GROUP");
    release.attach(vec![Track::new("/m/Artist-Title-2023-GROUP/01.flac", None)]);
    let value = serde_json::to_value(&release).unwrap();
    assert_eq!(value["title"], "Title");
    assert_eq!(value["artist"], "Artist");
    assert_eq!(value["year"], 2023);
    assert_eq!(value["label"], "GROUP");
    assert_eq!(value["starred"], false);
    assert_eq!(value["tracks"][0]["path"], "/m/Artist-Title-2023-GROUP/01.flac");
    assert!(value["tracks"][0]["artwork_path"].is_null());
    assert!(value["tracks"][0].get("release_path").is_none());
}
