//! Reader for the text `.sln` format.
//!
//! Only the `Project(...) = ...` entries are needed, so the file is read line by
//! line instead of being parsed in full.

use crate::error::{Result, ScopeError};
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

const SOLUTION_HEADER: &str = "Microsoft Visual Studio Solution File";

/// Type GUID of virtual solution folders. They never point at a project file.
pub const SOLUTION_FOLDER_GUID: &str = "2150E333-8FDC-42A3-9474-1A3956D46DE8";

/// Project file extensions the build system knows how to load.
const MSBUILD_PROJECT_EXTENSIONS: &[&str] = &[
    "csproj", "vbproj", "fsproj", "vcxproj", "sqlproj", "proj", "shproj", "wapproj",
];

static PROJECT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^Project\(\s*"\{([0-9A-Fa-f-]+)\}"\s*\)\s*=\s*"([^"]*)"\s*,\s*"([^"]*)"\s*,\s*"\{([0-9A-Fa-f-]+)\}""#,
    )
    .expect("project line regex is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionEntry {
    pub name: String,
    pub type_guid: String,
    /// Path as written in the solution, relative to the solution directory.
    pub relative_path: String,
    pub absolute_path: PathBuf,
}

impl SolutionEntry {
    pub fn is_solution_folder(&self) -> bool {
        self.type_guid.eq_ignore_ascii_case(SOLUTION_FOLDER_GUID)
    }

    /// Entries with a project file extension the build system can load.
    pub fn is_msbuild_project(&self) -> bool {
        !self.is_solution_folder()
            && MSBUILD_PROJECT_EXTENSIONS
                .iter()
                .any(|ext| super::has_extension(&self.absolute_path, ext))
    }

    pub fn is_csharp_project(&self) -> bool {
        self.is_msbuild_project() && super::has_extension(&self.absolute_path, "csproj")
    }
}

pub fn read_solution(path: &Path) -> Result<Vec<SolutionEntry>> {
    let text = std::fs::read_to_string(path)?;
    parse_solution(path, &text)
}

/// Parse solution text; project paths are resolved against `path`'s directory.
pub fn parse_solution(path: &Path, text: &str) -> Result<Vec<SolutionEntry>> {
    let text = text.trim_start_matches('\u{feff}');
    let has_header = text
        .lines()
        .take_while(|l| l.trim().is_empty() || l.trim_start().starts_with('#') || l.contains(SOLUTION_HEADER))
        .any(|l| l.contains(SOLUTION_HEADER));
    if !has_header {
        return Err(ScopeError::Solution {
            path: path.to_path_buf(),
            reason: "missing solution file header".to_string(),
        });
    }

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    let mut entries = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if !line.starts_with("Project(") {
            continue;
        }
        let Some(caps) = PROJECT_LINE.captures(line) else {
            return Err(ScopeError::Solution {
                path: path.to_path_buf(),
                reason: format!("invalid project entry on line {}", line_no + 1),
            });
        };
        let relative_path = caps[3].to_string();
        entries.push(SolutionEntry {
            name: caps[2].to_string(),
            type_guid: caps[1].to_string(),
            absolute_path: resolve_project_path(base, &relative_path),
            relative_path,
        });
    }
    Ok(entries)
}

/// Join a solution-relative path (which may use `\`) onto `base` and fold `.`/`..`.
fn resolve_project_path(base: &Path, relative: &str) -> PathBuf {
    let relative = relative.replace('\\', "/");
    normalize_lexically(&base.join(relative))
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
