use super::prefixes;
use crate::model::{IndexSnapshot, NamespaceMap, ProjectRecord};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub fn build_snapshot(projects: Vec<ProjectRecord>) -> IndexSnapshot {
    build_snapshot_at(projects, Utc::now())
}

pub fn build_snapshot_at(projects: Vec<ProjectRecord>, built_at: DateTime<Utc>) -> IndexSnapshot {
    let map = build_namespace_map(projects.into_iter().map(Arc::new));
    IndexSnapshot::new(map, built_at)
}

/// Map every prefix of every naming fact to the projects contributing it.
///
/// Lists keep first-seen order and hold each project path at most once.
pub fn build_namespace_map<I>(projects: I) -> NamespaceMap
where
    I: IntoIterator<Item = Arc<ProjectRecord>>,
{
    let mut map = NamespaceMap::new();
    let mut members: HashMap<String, HashSet<String>> = HashMap::new();

    for project in projects {
        let key = project.key();
        for fact in project.naming_facts() {
            for prefix in prefixes(fact) {
                let seen = members.entry(prefix.to_string()).or_default();
                if !seen.insert(key.clone()) {
                    continue;
                }
                map.entry(prefix.to_string())
                    .or_default()
                    .push(Arc::clone(&project));
            }
        }
    }

    map
}
