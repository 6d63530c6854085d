pub mod msbuild;
pub mod namespaces;
pub mod scanner;
pub mod solution;
pub mod walker;

use std::path::Path;

/// Directory names never descended into: VCS metadata and build output.
const EXCLUDED_DIRS: &[&str] = &[".git", ".svn", ".hg", ".vs", "bin", "obj"];

/// Checks if a single directory name is VCS metadata or build output.
pub fn is_excluded_dir_name(name: &str) -> bool {
    EXCLUDED_DIRS.iter().any(|d| d.eq_ignore_ascii_case(name))
}

/// Checks if any component of `path` is an excluded directory.
pub fn is_excluded_path(path: &Path) -> bool {
    path.components().any(|c| {
        c.as_os_str()
            .to_str()
            .is_some_and(is_excluded_dir_name)
    })
}

pub(crate) fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_and_vcs_dirs_are_excluded() {
        assert!(is_excluded_path(Path::new("/src/App/bin/Debug/App.sln")));
        assert!(is_excluded_path(Path::new("/src/App/OBJ/x.cs")));
        assert!(is_excluded_path(Path::new("/src/.git/HEAD")));
        assert!(!is_excluded_path(Path::new("/src/binaries/App.sln")));
        assert!(!is_excluded_path(Path::new("/src/App/Program.cs")));
    }

    #[test]
    fn extension_check_ignores_case() {
        assert!(has_extension(Path::new("A.CSPROJ"), "csproj"));
        assert!(!has_extension(Path::new("A.vbproj"), "csproj"));
    }
}
