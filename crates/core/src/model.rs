use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Case-insensitive comparison key for project and solution paths.
pub fn path_key(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/").to_lowercase()
}

/// One buildable project, unique per project path across a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub project_path: PathBuf,
    #[serde(default)]
    pub assembly_name: String,
    #[serde(default)]
    pub root_namespace: String,
    /// Namespaces declared in the project's source files (case-sensitive).
    #[serde(default)]
    pub declared_namespaces: BTreeSet<String>,
    /// Solutions referencing this project, unique by case-insensitive path.
    #[serde(default)]
    pub solution_paths: Vec<PathBuf>,
}

impl ProjectRecord {
    pub fn new(project_path: impl Into<PathBuf>) -> Self {
        Self {
            project_path: project_path.into(),
            assembly_name: String::new(),
            root_namespace: String::new(),
            declared_namespaces: BTreeSet::new(),
            solution_paths: Vec::new(),
        }
    }

    pub fn key(&self) -> String {
        path_key(&self.project_path)
    }

    /// Record an owning solution. Returns false if it was already known.
    pub fn add_solution(&mut self, solution: &Path) -> bool {
        let key = path_key(solution);
        if self.solution_paths.iter().any(|p| path_key(p) == key) {
            return false;
        }
        self.solution_paths.push(solution.to_path_buf());
        true
    }

    /// Declared namespaces plus root namespace and assembly name, blanks dropped.
    pub fn naming_facts(&self) -> impl Iterator<Item = &str> {
        self.declared_namespaces
            .iter()
            .map(String::as_str)
            .chain([self.root_namespace.as_str(), self.assembly_name.as_str()])
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn display_name(&self) -> &str {
        self.project_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
    }
}

pub type NamespaceMap = IndexMap<String, Vec<Arc<ProjectRecord>>>;

/// Immutable result of one scan. Never mutated after publication.
#[derive(Debug, Clone)]
pub struct IndexSnapshot {
    namespace_map: NamespaceMap,
    built_at_utc: DateTime<Utc>,
}

impl Default for IndexSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl IndexSnapshot {
    pub fn new(namespace_map: NamespaceMap, built_at_utc: DateTime<Utc>) -> Self {
        Self {
            namespace_map,
            built_at_utc,
        }
    }

    pub fn empty() -> Self {
        Self {
            namespace_map: IndexMap::new(),
            built_at_utc: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    pub fn namespace_map(&self) -> &NamespaceMap {
        &self.namespace_map
    }

    pub fn built_at_utc(&self) -> DateTime<Utc> {
        self.built_at_utc
    }

    pub fn get(&self, prefix: &str) -> Option<&[Arc<ProjectRecord>]> {
        self.namespace_map.get(prefix).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.namespace_map.is_empty()
    }

    /// Number of prefix keys.
    pub fn len(&self) -> usize {
        self.namespace_map.len()
    }

    /// Distinct projects referenced anywhere in the map, in first-seen order.
    pub fn projects(&self) -> Vec<Arc<ProjectRecord>> {
        let mut seen = HashSet::new();
        self.namespace_map
            .values()
            .flatten()
            .filter(|p| seen.insert(p.key()))
            .cloned()
            .collect()
    }
}

/// Flattened query result row for hosts that present a chooser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceHit {
    pub namespace: String,
    pub project_path: PathBuf,
    pub solution_paths: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MalformedSolution,
    MalformedProject,
    UnreadableSource,
}

/// An input artifact that contributed nothing to the scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkipRecord {
    pub path: PathBuf,
    pub reason: SkipReason,
    pub detail: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub solutions: usize,
    pub projects: usize,
    pub source_files: usize,
    /// Most solutions that were being processed at the same moment.
    pub peak_concurrency: usize,
    pub skipped: Vec<SkipRecord>,
}

impl ScanStats {
    pub fn skipped_count(&self, reason: SkipReason) -> usize {
        self.skipped.iter().filter(|s| s.reason == reason).count()
    }
}
