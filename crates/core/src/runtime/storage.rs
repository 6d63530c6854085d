use super::*;
use crate::model::NamespaceMap;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Bumped whenever the cache layout changes; older files are ignored.
pub const CACHE_VERSION: u32 = 1;

/// On-disk form of a snapshot. Projects are stored once and referenced by index.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheDocument {
    version: u32,
    built_at_utc: DateTime<Utc>,
    projects: Vec<ProjectRecord>,
    namespace_map: IndexMap<String, Vec<usize>>,
}

impl CacheDocument {
    fn from_snapshot(snapshot: &IndexSnapshot) -> Self {
        let mut projects = Vec::new();
        let mut positions: std::collections::HashMap<*const ProjectRecord, usize> =
            std::collections::HashMap::new();

        let namespace_map = snapshot
            .namespace_map()
            .iter()
            .map(|(prefix, list)| {
                let indices = list
                    .iter()
                    .map(|project| {
                        *positions.entry(Arc::as_ptr(project)).or_insert_with(|| {
                            projects.push(ProjectRecord::clone(project));
                            projects.len() - 1
                        })
                    })
                    .collect();
                (prefix.clone(), indices)
            })
            .collect();

        Self {
            version: CACHE_VERSION,
            built_at_utc: snapshot.built_at_utc(),
            projects,
            namespace_map,
        }
    }

    fn into_snapshot(self) -> std::result::Result<IndexSnapshot, String> {
        let projects: Vec<Arc<ProjectRecord>> = self.projects.into_iter().map(Arc::new).collect();
        let mut map = NamespaceMap::with_capacity(self.namespace_map.len());
        for (prefix, indices) in self.namespace_map {
            let list = indices
                .into_iter()
                .map(|i| {
                    projects
                        .get(i)
                        .cloned()
                        .ok_or_else(|| format!("prefix {prefix:?} references missing project {i}"))
                })
                .collect::<std::result::Result<Vec<_>, _>>()?;
            map.insert(prefix, list);
        }
        Ok(IndexSnapshot::new(map, self.built_at_utc))
    }
}

/// Read a cached snapshot.
///
/// Returns `Ok(None)` when the file is absent, malformed or from another cache
/// version. I/O failures while reading are returned as errors.
pub fn load_from_disk(path: &Path) -> Result<Option<IndexSnapshot>> {
    if !path.exists() {
        return Ok(None);
    }

    let bytes = std::fs::read(path)?;
    let document: CacheDocument = match serde_json::from_slice(&bytes) {
        Ok(document) => document,
        Err(e) => {
            tracing::warn!("Failed to parse index cache at {}: {}. Will rebuild.", path.display(), e);
            return Ok(None);
        }
    };

    if document.version != CACHE_VERSION {
        tracing::warn!(
            "Index cache version mismatch at {} (found {}, expected {}). Will rebuild.",
            path.display(),
            document.version,
            CACHE_VERSION
        );
        return Ok(None);
    }

    match document.into_snapshot() {
        Ok(snapshot) => {
            tracing::info!("Loaded index cache from {}", path.display());
            Ok(Some(snapshot))
        }
        Err(reason) => {
            tracing::warn!("Inconsistent index cache at {}: {}. Will rebuild.", path.display(), reason);
            Ok(None)
        }
    }
}

/// Sibling file a cache save writes before renaming it into place.
pub(crate) fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Write a snapshot, replacing any previous cache file atomically.
pub fn save_to_disk(snapshot: &IndexSnapshot, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let bytes = serde_json::to_vec_pretty(&CacheDocument::from_snapshot(snapshot))?;

    // Write to file atomically (write to temp, then rename)
    let tmp = temp_path(path);
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)?;

    tracing::info!("Saved index cache to {}", path.display());
    Ok(())
}

impl ProjectIndexService {
    /// Seed the snapshot from the cache file. Any failure leaves the snapshot empty.
    pub async fn load_cache(&self) {
        let path = self.cache_path.clone();
        let loaded = tokio::task::spawn_blocking(move || load_from_disk(&path)).await;

        match loaded {
            Ok(Ok(Some(snapshot))) => self.replace_snapshot(Arc::new(snapshot)),
            Ok(Ok(None)) => tracing::debug!("No usable index cache at {}", self.cache_path.display()),
            Ok(Err(e)) => tracing::warn!(
                "Could not read index cache at {}: {}",
                self.cache_path.display(),
                e
            ),
            Err(e) => tracing::warn!("Index cache load task failed: {}", e),
        }
    }

    /// Persist a published snapshot. Failures are logged, never propagated.
    pub(super) async fn save_cache(&self, snapshot: Arc<IndexSnapshot>) {
        let path = self.cache_path.clone();
        let saved = tokio::task::spawn_blocking(move || save_to_disk(&snapshot, &path)).await;

        match saved {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(
                "Failed to save index cache to {}: {}",
                self.cache_path.display(),
                e
            ),
            Err(e) => tracing::warn!("Index cache save task failed: {}", e),
        }
    }

    /// Delete the cache file and reset the in-memory snapshot.
    pub async fn clear_cache(&self) -> Result<()> {
        if self.cache_path.exists() {
            tokio::fs::remove_file(&self.cache_path).await?;
        }
        self.replace_snapshot(Arc::new(IndexSnapshot::empty()));
        Ok(())
    }
}
