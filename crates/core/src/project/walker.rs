use super::{has_extension, is_excluded_dir_name};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

fn is_excluded_entry(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name().to_str().is_some_and(is_excluded_dir_name)
}

/// Recursively collect files with `ext` under `dir`, skipping VCS and build output.
///
/// Entries come back sorted by file name within each directory. Unreadable
/// entries are skipped. A missing directory yields nothing.
pub fn collect_files(dir: &Path, ext: &str) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_excluded_entry(e))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!("Skipping unreadable entry under {}: {}", dir.display(), e);
                None
            }
        })
        .filter(|e| e.file_type().is_file() && has_extension(e.path(), ext))
        .map(DirEntry::into_path)
        .collect()
}

/// Find every `.sln` file under `root`. Blank or missing roots yield an empty set.
pub fn find_solutions(root: &Path) -> Vec<PathBuf> {
    if root.as_os_str().to_string_lossy().trim().is_empty() || !root.is_dir() {
        return Vec::new();
    }
    collect_files(root, "sln")
}
