//! Filesystem measurement.

use std::path::Path;

use walkdir::WalkDir;

/// Total size in bytes of the regular files under `path`.
///
/// Unreadable entries are skipped. A missing path measures as zero.
pub fn dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|meta| meta.len())
        .sum()
}
