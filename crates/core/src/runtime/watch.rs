use super::*;
use crate::project::is_excluded_path;
use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::time::Instant;
use tokio::sync::mpsc;

struct FsWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
}

impl FsWatcher {
    fn new(root: &Path) -> notify::Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;
        watcher.watch(root, RecursiveMode::Recursive)?;
        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    async fn next_event_async(&mut self) -> Option<notify::Result<Event>> {
        self.rx.recv().await
    }
}

/// Files and directories the service writes itself, which must never trigger a rescan.
#[derive(Debug)]
pub(crate) struct OwnOutput {
    files: Vec<PathBuf>,
    dirs: Vec<PathBuf>,
}

impl OwnOutput {
    /// The cache file, its temp sibling, the cache directory and the log directory.
    ///
    /// A directory that contains the watched root is not ignored wholesale; only
    /// the files are.
    pub(crate) fn new(cache_path: &Path, root: &Path, log_dir: PathBuf) -> Self {
        let files = vec![cache_path.to_path_buf(), super::storage::temp_path(cache_path)];
        let mut dirs = vec![log_dir];
        if let Some(cache_dir) = cache_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            dirs.push(cache_dir.to_path_buf());
        }
        dirs.retain(|dir| !root.starts_with(dir));
        Self { files, dirs }
    }

    fn contains(&self, path: &Path) -> bool {
        self.files.iter().any(|f| f == path) || self.dirs.iter().any(|d| path.starts_with(d))
    }
}

/// Create, content change, delete or rename of something outside build output.
pub(crate) fn is_qualifying_event(event: &Event, root: &Path, own_output: &OwnOutput) -> bool {
    let kind_matches = match event.kind {
        EventKind::Create(_) | EventKind::Remove(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        EventKind::Access(_) | EventKind::Any | EventKind::Other => false,
    };
    if !kind_matches {
        return false;
    }

    event.paths.iter().any(|path| {
        if own_output.contains(path) {
            return false;
        }
        let relative = path.strip_prefix(root).unwrap_or(path.as_path());
        !is_excluded_path(relative)
    })
}

impl ProjectIndexService {
    /// Watch the configured root and request debounced rescans on changes.
    ///
    /// The watcher task exits when the service shuts down or is dropped.
    pub fn start_watcher(self: &Arc<Self>) -> Result<()> {
        let root = self
            .config()
            .and_then(IndexConfig::usable_root)
            .map(Path::to_path_buf)
            .ok_or_else(|| ScopeError::Config("no usable root directory to watch".to_string()))?;

        let mut watcher = FsWatcher::new(&root)?;
        let service = Arc::downgrade(self);
        let own_output = OwnOutput::new(&self.cache_path, &root, crate::logging::log_dir());
        let cancel = self.shutdown.child_token();

        tokio::spawn(async move {
            tracing::info!("Started watching {}", root.display());

            loop {
                let event = tokio::select! {
                    _ = cancel.cancelled() => break,
                    event = watcher.next_event_async() => event,
                };

                let event = match event {
                    Some(Ok(event)) => event,
                    Some(Err(e)) => {
                        tracing::warn!("File watcher error under {}: {}", root.display(), e);
                        continue;
                    }
                    None => break,
                };

                if !is_qualifying_event(&event, &root, &own_output) {
                    continue;
                }

                let Some(service) = service.upgrade() else {
                    break;
                };
                if service.debouncer.try_trigger(Instant::now()) {
                    tracing::info!(
                        "Detected changes ({:?}) under {}. Rescanning...",
                        event.kind,
                        root.display()
                    );
                    service.request_rescan();
                } else {
                    tracing::trace!("Change ignored within debounce window: {:?}", event.paths);
                }
            }

            tracing::info!("File watcher task ended for {}", root.display());
        });

        Ok(())
    }
}
