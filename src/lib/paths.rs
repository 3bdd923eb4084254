//! Path helpers

use std::env;
use std::path::{Path, PathBuf};

/// Find the nearest directory, starting at `start` and walking up, that
/// contains a subdirectory called `name`. Returns that directory.
pub fn find_in_ancestors(start: &Path, name: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(name).is_dir())
        .map(Path::to_path_buf)
}

/// Make a path absolute against the current directory without touching
/// the filesystem
pub fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
