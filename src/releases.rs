/// The releases module holds the Release aggregate: one directory of audio files plus the fields
/// parsed from the directory's name.
use crate::common::casefold;
use crate::release_name::{ReleaseName, ReleaseNameInfo};
use crate::tracks::Track;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub path: PathBuf,
    pub title: String,
    pub artist: String,
    pub year: Option<i32>,
    pub label: Option<String>,
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub starred: bool,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl Release {
    /// Build a release for `path` from its parsed name. Tracks are attached separately.
    pub fn from_parsed(path: impl Into<PathBuf>, info: ReleaseNameInfo) -> Self {
        Self {
            path: path.into(),
            title: info.title,
            artist: info.artist,
            year: info.year,
            label: info.label,
            tags: info.tags,
            starred: false,
            tracks: vec![],
        }
    }

    /// Parse the final component of `path` and build a release from it.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        Self::from_parsed(path, ReleaseName::new(name).into_info())
    }

    /// Take ownership of `tracks`, point them back at this release, and keep them ordered by path.
    pub fn attach(&mut self, tracks: impl IntoIterator<Item = Track>) {
        for mut track in tracks {
            if track.release_path.is_none() {
                track.release_path = Some(self.path.clone());
            }
            self.tracks.push(track);
        }
        self.tracks.sort_by(|a, b| a.path.cmp(&b.path));
    }

    /// Re-point every track at this release. Used after deserialization, which drops the link.
    pub(crate) fn relink_tracks(&mut self) {
        for track in &mut self.tracks {
            track.release_path = Some(self.path.clone());
        }
    }

    pub fn sort_key(&self) -> String {
        casefold(&format!("{}{}", self.artist, self.title))
    }

    pub fn artwork_path(&self) -> Option<&Path> {
        self.tracks.first().and_then(|t| t.artwork_path.as_deref())
    }

    pub fn tags_string(&self) -> String {
        self.tags.iter().map(String::as_str).collect::<Vec<_>>().join(" · ")
    }

    pub fn label_string(&self) -> &str {
        self.label.as_deref().unwrap_or("")
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }
}
