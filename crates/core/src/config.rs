//! Settings consumed by the index service.
//!
//! The settings UI belongs to the host; the engine only reads the final values.
//! They live in a JSON document next to the cache, and every field falls back
//! to its default when absent.

use crate::error::{Result, ScopeError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const HOME_ENV: &str = "SLNSCOPE_HOME";
pub const CONFIG_FILE: &str = "config.json";
pub const CACHE_FILE: &str = "index.json";

/// Base directory for cache, config and logs, supporting the `SLNSCOPE_HOME` env var.
pub fn base_dir() -> PathBuf {
    if let Ok(env_dir) = std::env::var(HOME_ENV) {
        if !env_dir.trim().is_empty() {
            return PathBuf::from(env_dir);
        }
    }

    match dirs::data_local_dir() {
        Some(dir) => dir.join("slnscope"),
        None => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".slnscope"),
    }
}

pub fn default_config_path() -> PathBuf {
    base_dir().join(CONFIG_FILE)
}

pub fn default_cache_path() -> PathBuf {
    base_dir().join(CACHE_FILE)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IndexConfig {
    /// Directory scanned recursively for `.sln` files.
    pub root_directory: Option<PathBuf>,
    pub rescan_on_startup: bool,
    pub max_parallelism: usize,
    /// Open solutions in a new IDE window instead of handing them to the current one.
    pub open_in_new_window: bool,
    /// IDE launcher used for new windows (e.g. `devenv`).
    pub ide_command: Option<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            root_directory: None,
            rescan_on_startup: true,
            max_parallelism: default_max_parallelism(),
            open_in_new_window: false,
            ide_command: None,
        }
    }
}

fn default_max_parallelism() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2);
    (cpus / 2).max(2)
}

impl IndexConfig {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root_directory: Some(root.into()),
            ..Self::default()
        }
    }

    /// Read the config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| ScopeError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// The configured root, if it is set, non-blank and an existing directory.
    pub fn usable_root(&self) -> Option<&Path> {
        let root = self.root_directory.as_deref()?;
        if root.as_os_str().to_string_lossy().trim().is_empty() || !root.is_dir() {
            return None;
        }
        Some(root)
    }

    pub fn effective_parallelism(&self) -> usize {
        self.max_parallelism.max(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = IndexConfig::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, IndexConfig::default());
        assert!(config.rescan_on_startup);
        assert!(config.max_parallelism >= 2);
    }

    #[test]
    fn partial_file_keeps_defaults_for_absent_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{ "rootDirectory": "/src", "rescanOnStartup": false }"#).unwrap();

        let config = IndexConfig::load(&path).unwrap();
        assert_eq!(config.root_directory, Some(PathBuf::from("/src")));
        assert!(!config.rescan_on_startup);
        assert!(!config.open_in_new_window);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(IndexConfig::load(&path), Err(ScopeError::Config(_))));
    }

    #[test]
    fn blank_or_missing_root_is_not_usable() {
        assert!(IndexConfig::default().usable_root().is_none());
        assert!(IndexConfig::with_root("").usable_root().is_none());
        assert!(IndexConfig::with_root("/definitely/not/here").usable_root().is_none());

        let dir = tempdir().unwrap();
        assert_eq!(
            IndexConfig::with_root(dir.path()).usable_root(),
            Some(dir.path())
        );
    }

    #[test]
    fn parallelism_has_a_floor_of_two() {
        let config = IndexConfig {
            max_parallelism: 0,
            ..IndexConfig::default()
        };
        assert_eq!(config.effective_parallelism(), 2);
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let config = IndexConfig {
            root_directory: Some(PathBuf::from("/repos")),
            rescan_on_startup: false,
            max_parallelism: 8,
            open_in_new_window: true,
            ide_command: Some("devenv".into()),
        };
        config.save(&path).unwrap();
        assert_eq!(IndexConfig::load(&path).unwrap(), config);
    }
}
