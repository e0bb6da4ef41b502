pub mod cache;
pub mod common;
pub mod config;
pub mod error;
pub mod library;
pub mod release_name;
pub mod releases;
pub mod scanner;
pub mod stars;
pub mod tag_vocabulary;
pub mod tracks;

pub use cache::{ReleaseCache, CACHE_VERSION};
pub use common::initialize_logging;
pub use config::Config;
pub use error::{PickerError, PickerExpectedError, Result};
pub use library::{LibraryEvent, LibraryHandle, LibraryLoader, LoadedLibrary};
pub use release_name::{parse_release_name, ReleaseName, ReleaseNameInfo};
pub use releases::Release;
pub use scanner::{CancelFlag, NoStars, ScanProgress, Scanner, StarredLookup};
pub use stars::StarStore;
pub use tracks::Track;

#[cfg(test)]
mod testing;

#[cfg(test)]
mod config_test;
#[cfg(test)]
mod releases_test;
#[cfg(test)]
mod stars_test;
