use crate::model::{IndexSnapshot, NamespaceHit, ProjectRecord, path_key};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

fn normalize_identifier(identifier: &str) -> &str {
    let trimmed = identifier.trim();
    trimmed.strip_prefix("global::").unwrap_or(trimmed).trim()
}

impl IndexSnapshot {
    /// Longest indexed prefix of `identifier` that has projects, with those projects.
    pub fn longest_match(&self, identifier: &str) -> Option<(&str, &[Arc<ProjectRecord>])> {
        let identifier = normalize_identifier(identifier);
        if identifier.is_empty() {
            return None;
        }

        let mut end = identifier.len();
        loop {
            let prefix = &identifier[..end];
            if let Some((key, list)) = self.namespace_map().get_key_value(prefix) {
                if !list.is_empty() {
                    return Some((key.as_str(), list.as_slice()));
                }
            }
            end = identifier[..end].rfind('.')?;
        }
    }

    /// Projects for the most specific indexed prefix of `identifier`; empty if none.
    pub fn query(&self, identifier: &str) -> Vec<Arc<ProjectRecord>> {
        self.longest_match(identifier)
            .map(|(_, list)| list.to_vec())
            .unwrap_or_default()
    }

    /// Distinct solutions owning the matched projects, in first-seen order.
    pub fn solutions_for(&self, identifier: &str) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        self.query(identifier)
            .iter()
            .flat_map(|p| p.solution_paths.iter())
            .filter(|sln| seen.insert(path_key(sln)))
            .cloned()
            .collect()
    }

    pub fn hits(&self, identifier: &str) -> Vec<NamespaceHit> {
        let Some((prefix, list)) = self.longest_match(identifier) else {
            return Vec::new();
        };
        list.iter()
            .map(|p| NamespaceHit {
                namespace: prefix.to_string(),
                project_path: p.project_path.clone(),
                solution_paths: p.solution_paths.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::index::build_snapshot;
    use crate::model::{IndexSnapshot, ProjectRecord};
    use std::path::{Path, PathBuf};

    fn project(path: &str, slns: &[&str], namespaces: &[&str]) -> ProjectRecord {
        let mut record = ProjectRecord::new(path);
        record.declared_namespaces = namespaces.iter().map(|s| s.to_string()).collect();
        for sln in slns {
            record.add_solution(Path::new(sln));
        }
        record
    }

    fn names(snapshot: &IndexSnapshot, identifier: &str) -> Vec<String> {
        snapshot
            .query(identifier)
            .iter()
            .map(|p| p.display_name().to_string())
            .collect()
    }

    fn sample() -> IndexSnapshot {
        build_snapshot(vec![
            project("/r/Core/Core.csproj", &["/r/All.sln", "/r/Core.sln"], &["A"]),
            project("/r/Web/Web.csproj", &["/r/All.sln"], &["A.B"]),
        ])
    }

    #[test]
    fn longest_prefix_wins() {
        let snapshot = sample();
        assert_eq!(names(&snapshot, "A.B.C"), vec!["Web"]);
        assert_eq!(names(&snapshot, "A.B"), vec!["Web"]);
        assert_eq!(names(&snapshot, "A.X.Y"), vec!["Core", "Web"]);
        assert_eq!(names(&snapshot, "A"), vec!["Core", "Web"]);
    }

    #[test]
    fn blank_and_unknown_identifiers_are_empty() {
        let snapshot = sample();
        assert!(snapshot.query("").is_empty());
        assert!(snapshot.query("   ").is_empty());
        assert!(snapshot.query("Other").is_empty());
        assert!(snapshot.query("Other.A").is_empty());
        assert!(IndexSnapshot::empty().query("A").is_empty());
    }

    #[test]
    fn global_alias_and_whitespace_are_trimmed() {
        let snapshot = sample();
        assert_eq!(names(&snapshot, "  global::A.B  "), vec!["Web"]);
    }

    #[test]
    fn solutions_are_distinct() {
        let snapshot = sample();
        assert_eq!(
            snapshot.solutions_for("A"),
            vec![PathBuf::from("/r/All.sln"), PathBuf::from("/r/Core.sln")]
        );
        assert!(snapshot.solutions_for("Nope").is_empty());
    }

    #[test]
    fn hits_report_the_matched_prefix() {
        let snapshot = sample();
        let hits = snapshot.hits("A.B.Deep.Type");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].namespace, "A.B");
        assert_eq!(hits[0].project_path, PathBuf::from("/r/Web/Web.csproj"));
    }
}
