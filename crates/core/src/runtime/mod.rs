//! Index service: owns the published snapshot and coordinates rescans.
//!
//! Readers get cheap snapshots (an `Arc` clone under a briefly held read lock).
//! Writers build a complete new snapshot off to the side and swap the pointer,
//! so a query never observes a half-built map.
//!
//! Rescans are single-flight. Every request installs a fresh cancellation token
//! and cancels the previous one, then waits for the rescan gate. Only a scan
//! whose token was never cancelled, and whose generation is still the latest,
//! may publish.

use crate::config::IndexConfig;
use crate::error::{Result, ScopeError};
use crate::index::build_snapshot;
use crate::model::{IndexSnapshot, NamespaceHit, ProjectRecord, ScanStats};
use crate::project::scanner::{ScanProgress, Scanner};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};
use tokio_util::sync::CancellationToken;

pub mod debounce;
mod storage;
mod watch;

pub use debounce::{DEBOUNCE_WINDOW, Debouncer};
pub use storage::{CACHE_VERSION, load_from_disk, save_to_disk};

/// How a rescan request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RescanOutcome {
    /// A new snapshot was published.
    Published(ScanStats),
    /// A newer request superseded this one before it could publish.
    Superseded,
    /// No usable root directory is configured; nothing was scanned.
    NoRoot,
}

pub struct ProjectIndexService {
    /// Current snapshot (double Arc so readers never block on a rebuild)
    current: RwLock<Arc<IndexSnapshot>>,

    cache_path: PathBuf,

    /// Set once by `initialize`
    config: OnceLock<IndexConfig>,

    /// Token of the most recent rescan request
    active_scan: Mutex<CancellationToken>,
    generation: AtomicU64,

    /// Held for the whole scan-build-publish sequence
    rescan_gate: tokio::sync::Mutex<()>,

    debouncer: Debouncer,

    scan_progress: Mutex<Option<ScanProgress>>,

    /// Cancellation token for background tasks (like the watcher)
    shutdown: CancellationToken,
}

impl Drop for ProjectIndexService {
    fn drop(&mut self) {
        self.shutdown.cancel();
        self.active_scan
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
    }
}

impl ProjectIndexService {
    pub fn new(cache_path: impl Into<PathBuf>) -> Self {
        Self::with_debounce_window(cache_path, DEBOUNCE_WINDOW)
    }

    pub fn with_debounce_window(cache_path: impl Into<PathBuf>, window: std::time::Duration) -> Self {
        Self {
            current: RwLock::new(Arc::new(IndexSnapshot::empty())),
            cache_path: cache_path.into(),
            config: OnceLock::new(),
            active_scan: Mutex::new(CancellationToken::new()),
            generation: AtomicU64::new(0),
            rescan_gate: tokio::sync::Mutex::new(()),
            debouncer: Debouncer::new(window),
            scan_progress: Mutex::new(None),
            shutdown: CancellationToken::new(),
        }
    }

    /// Service backed by the per-user cache file.
    pub fn with_default_cache() -> Self {
        Self::new(crate::config::default_cache_path())
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    pub fn config(&self) -> Option<&IndexConfig> {
        self.config.get()
    }

    pub fn is_initialized(&self) -> bool {
        self.config.get().is_some()
    }

    /// Install the settings without loading, scanning or watching anything.
    ///
    /// One-shot hosts use this in place of `initialize`. Returns `false` if the
    /// service was already configured.
    pub fn configure(&self, config: IndexConfig) -> bool {
        if self.config.set(config).is_err() {
            tracing::debug!("Index service already initialized");
            return false;
        }
        true
    }

    /// Load the cache, optionally start a rescan, and start watching the root.
    ///
    /// Only the first call has any effect; later calls return `false`.
    pub async fn initialize(self: &Arc<Self>, config: IndexConfig) -> bool {
        if !self.configure(config) {
            return false;
        }

        self.load_cache().await;

        let rescan_on_startup = self.config().is_some_and(|c| c.rescan_on_startup);
        if rescan_on_startup {
            self.request_rescan();
        }

        if let Err(e) = self.start_watcher() {
            tracing::warn!("File watcher not started, index will not refresh on changes: {}", e);
        }

        true
    }

    /// Report each solution as later rescans start processing it.
    pub fn set_scan_progress(&self, progress: ScanProgress) {
        *self
            .scan_progress
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(progress);
    }

    /// Current snapshot (cheap operation)
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&current)
    }

    pub fn query(&self, identifier: &str) -> Vec<Arc<ProjectRecord>> {
        self.snapshot().query(identifier)
    }

    pub fn solutions_for(&self, identifier: &str) -> Vec<PathBuf> {
        self.snapshot().solutions_for(identifier)
    }

    pub fn hits(&self, identifier: &str) -> Vec<NamespaceHit> {
        self.snapshot().hits(identifier)
    }

    /// Submit a rescan without waiting for it. Supersedes any scan in flight.
    pub fn request_rescan(self: &Arc<Self>) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("Rescan requested outside of a Tokio runtime; ignored");
            return;
        };
        let service = Arc::clone(self);
        handle.spawn(async move {
            match service.force_rescan().await {
                Ok(RescanOutcome::Published(stats)) => tracing::info!(
                    "Rescan published: {} solution(s), {} project(s), {} skipped",
                    stats.solutions,
                    stats.projects,
                    stats.skipped.len()
                ),
                Ok(RescanOutcome::Superseded) => tracing::debug!("Rescan superseded"),
                Ok(RescanOutcome::NoRoot) => {
                    tracing::debug!("Rescan skipped: no usable root directory")
                }
                Err(e) => tracing::error!("Rescan failed: {}", e),
            }
        });
    }

    /// Scan the configured root, rebuild the index and publish it.
    ///
    /// Cancels any rescan already in flight. A request that is itself superseded
    /// returns `RescanOutcome::Superseded` and publishes nothing.
    pub async fn force_rescan(&self) -> Result<RescanOutcome> {
        let (token, generation) = self.begin_rescan();

        let _gate = tokio::select! {
            _ = token.cancelled() => return Ok(RescanOutcome::Superseded),
            gate = self.rescan_gate.lock() => gate,
        };
        if token.is_cancelled() {
            return Ok(RescanOutcome::Superseded);
        }

        let Some(config) = self.config.get() else {
            return Ok(RescanOutcome::NoRoot);
        };
        let Some(root) = config.usable_root() else {
            tracing::debug!("Root directory missing or blank; skipping scan");
            return Ok(RescanOutcome::NoRoot);
        };

        tracing::info!("Scanning {}...", root.display());
        let started = std::time::Instant::now();
        let progress = self
            .scan_progress
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let mut scanner = Scanner::new(config.effective_parallelism());
        if let Some(progress) = progress {
            scanner = scanner.with_progress(progress);
        }
        let output = match scanner.scan(root, &token).await {
            Ok(output) => output,
            Err(ScopeError::Cancelled) => return Ok(RescanOutcome::Superseded),
            Err(e) => return Err(e),
        };

        let snapshot = Arc::new(
            tokio::task::spawn_blocking(move || build_snapshot(output.projects)).await?,
        );

        if !self.publish(Arc::clone(&snapshot), &token, generation) {
            return Ok(RescanOutcome::Superseded);
        }
        tracing::info!(
            "Published index with {} prefixes in {:?}",
            snapshot.len(),
            started.elapsed()
        );

        self.save_cache(snapshot).await;

        Ok(RescanOutcome::Published(output.stats))
    }

    /// Stop the watcher and cancel any scan in flight.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        self.active_scan
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
    }

    fn begin_rescan(&self) -> (CancellationToken, u64) {
        let mut active = self
            .active_scan
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        active.cancel();
        let token = self.shutdown.child_token();
        *active = token.clone();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        (token, generation)
    }

    /// Swap in `snapshot` unless the scan that built it has been superseded.
    ///
    /// The check and the swap happen under the same lock `begin_rescan` takes.
    fn publish(&self, snapshot: Arc<IndexSnapshot>, token: &CancellationToken, generation: u64) -> bool {
        let _active = self
            .active_scan
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if token.is_cancelled() || self.generation.load(Ordering::SeqCst) != generation {
            return false;
        }
        self.replace_snapshot(snapshot);
        true
    }

    fn replace_snapshot(&self, snapshot: Arc<IndexSnapshot>) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = snapshot;
    }
}
