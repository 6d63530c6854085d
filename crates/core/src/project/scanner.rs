use super::msbuild::{self, ProjectProperties};
use super::{namespaces, solution, walker};
use crate::error::{Result, ScopeError};
use crate::model::{ProjectRecord, ScanStats, SkipReason, SkipRecord, path_key};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Called with each solution path as its processing starts, on the blocking pool.
pub type ScanProgress = Arc<dyn Fn(&Path) + Send + Sync>;

/// Projects found by one scan, one record per distinct project path.
#[derive(Debug, Default)]
pub struct ScanOutput {
    pub projects: Vec<ProjectRecord>,
    pub stats: ScanStats,
}

/// A project plus the position of its earliest sighting: (solution, entry) in
/// discovery order.
#[derive(Clone)]
struct ClaimedProject {
    first_seen: (usize, usize),
    record: ProjectRecord,
}

/// State shared by the per-solution tasks of one scan.
#[derive(Default)]
struct ScanState {
    projects: DashMap<String, ClaimedProject>,
    skipped: Mutex<Vec<SkipRecord>>,
    source_files: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    progress: Option<ScanProgress>,
}

impl ScanState {
    fn skip(&self, path: &Path, reason: SkipReason, detail: impl ToString) {
        let detail = detail.to_string();
        tracing::debug!("Skipping {} ({:?}): {}", path.display(), reason, detail);
        if let Ok(mut skipped) = self.skipped.lock() {
            skipped.push(SkipRecord {
                path: path.to_path_buf(),
                reason,
                detail,
            });
        }
    }
}

/// Counts a solution as in flight until dropped.
struct InFlight<'a>(&'a ScanState);

impl<'a> InFlight<'a> {
    fn enter(state: &'a ScanState) -> Self {
        let now = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        state.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(state)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct Scanner {
    max_parallelism: usize,
    progress: Option<ScanProgress>,
}

impl Scanner {
    /// At least two solutions are always processed concurrently.
    pub fn new(max_parallelism: usize) -> Self {
        Self {
            max_parallelism: max_parallelism.max(2),
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ScanProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn max_parallelism(&self) -> usize {
        self.max_parallelism
    }

    /// Discover solutions under `root` and extract every C# project they reference.
    ///
    /// Directory enumeration and each solution's extraction hold a permit of the
    /// same semaphore. Returns `ScopeError::Cancelled` as soon as `cancel` fires;
    /// partial results are dropped.
    pub async fn scan(&self, root: &Path, cancel: &CancellationToken) -> Result<ScanOutput> {
        if cancel.is_cancelled() {
            return Err(ScopeError::Cancelled);
        }

        let semaphore = Arc::new(Semaphore::new(self.max_parallelism));

        let solutions = {
            let _permit = tokio::select! {
                _ = cancel.cancelled() => return Err(ScopeError::Cancelled),
                permit = semaphore.acquire() => permit
                    .map_err(|_| ScopeError::Internal("scan semaphore closed".to_string()))?,
            };
            let walk_root = root.to_path_buf();
            tokio::task::spawn_blocking(move || walker::find_solutions(&walk_root)).await?
        };
        if cancel.is_cancelled() {
            return Err(ScopeError::Cancelled);
        }

        tracing::info!(
            "Found {} solution(s) under {}",
            solutions.len(),
            root.display()
        );

        let state = Arc::new(ScanState {
            progress: self.progress.clone(),
            ..ScanState::default()
        });
        let mut tasks = JoinSet::new();

        for (index, sln) in solutions.iter().cloned().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let state = Arc::clone(&state);
            let cancel = cancel.clone();
            tasks.spawn(async move {
                let _permit = tokio::select! {
                    _ = cancel.cancelled() => return Err(ScopeError::Cancelled),
                    permit = semaphore.acquire_owned() => permit
                        .map_err(|_| ScopeError::Internal("scan semaphore closed".to_string()))?,
                };
                tokio::task::spawn_blocking(move || process_solution(index, &sln, &state, &cancel))
                    .await?
            });
        }

        loop {
            let joined = tokio::select! {
                _ = cancel.cancelled() => {
                    tasks.abort_all();
                    return Err(ScopeError::Cancelled);
                }
                joined = tasks.join_next() => joined,
            };
            match joined {
                None => break,
                Some(Ok(Ok(()))) => {}
                Some(Ok(Err(e))) => {
                    tasks.abort_all();
                    return Err(e);
                }
                Some(Err(e)) => {
                    tasks.abort_all();
                    return Err(e.into());
                }
            }
        }

        // Discovery order, not completion order, so repeated scans agree.
        let mut claimed: Vec<ClaimedProject> = state
            .projects
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        claimed.sort_by(|a, b| {
            a.first_seen
                .cmp(&b.first_seen)
                .then_with(|| a.record.key().cmp(&b.record.key()))
        });
        let mut projects: Vec<ProjectRecord> = claimed.into_iter().map(|c| c.record).collect();
        for project in &mut projects {
            project.solution_paths.sort_by_key(|p| path_key(p));
        }

        let mut skipped = match state.skipped.lock() {
            Ok(mut skipped) => std::mem::take(&mut *skipped),
            Err(_) => Vec::new(),
        };
        skipped.sort_by(|a, b| a.path.cmp(&b.path));

        let stats = ScanStats {
            solutions: solutions.len(),
            projects: projects.len(),
            source_files: state.source_files.load(Ordering::Relaxed),
            peak_concurrency: state.peak_in_flight.load(Ordering::SeqCst),
            skipped,
        };

        Ok(ScanOutput { projects, stats })
    }
}

/// Runs on the blocking pool while the solution's permit is held.
fn process_solution(
    solution_index: usize,
    sln: &Path,
    state: &ScanState,
    cancel: &CancellationToken,
) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(ScopeError::Cancelled);
    }
    let _in_flight = InFlight::enter(state);
    if let Some(progress) = &state.progress {
        progress(sln);
    }

    let entries = match solution::read_solution(sln) {
        Ok(entries) => entries,
        Err(e) => {
            state.skip(sln, SkipReason::MalformedSolution, e);
            return Ok(());
        }
    };

    for (entry_index, entry) in entries.iter().filter(|e| e.is_csharp_project()).enumerate() {
        if cancel.is_cancelled() {
            return Err(ScopeError::Cancelled);
        }

        let key = path_key(&entry.absolute_path);
        let first_seen = (solution_index, entry_index);
        // The first solution to reach a project extracts it; later ones only register.
        let claimed = match state.projects.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                let project = occupied.get_mut();
                project.record.add_solution(sln);
                project.first_seen = project.first_seen.min(first_seen);
                false
            }
            Entry::Vacant(vacant) => {
                let mut record = ProjectRecord::new(entry.absolute_path.clone());
                record.add_solution(sln);
                vacant.insert(ClaimedProject { first_seen, record });
                true
            }
        };
        if !claimed {
            continue;
        }

        let (properties, declared) = extract_project(&entry.absolute_path, state, cancel)?;
        if let Some(mut project) = state.projects.get_mut(&key) {
            let record = &mut project.record;
            record.assembly_name = properties.assembly_name_or_stem(&entry.absolute_path);
            record.root_namespace = properties.root_namespace.unwrap_or_default();
            record.declared_namespaces = declared;
        }
    }

    Ok(())
}

/// Read project properties and scan the project's source files.
///
/// A broken project file contributes no properties; unreadable sources
/// contribute no namespaces. Both are recorded as skips.
fn extract_project(
    project_path: &Path,
    state: &ScanState,
    cancel: &CancellationToken,
) -> Result<(ProjectProperties, BTreeSet<String>)> {
    let properties = match msbuild::read_project_properties(project_path) {
        Ok(properties) => properties,
        Err(e) => {
            state.skip(project_path, SkipReason::MalformedProject, e);
            ProjectProperties::default()
        }
    };

    let project_dir = project_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut declared = BTreeSet::new();
    for file in walker::collect_files(&project_dir, "cs") {
        if cancel.is_cancelled() {
            return Err(ScopeError::Cancelled);
        }
        state.source_files.fetch_add(1, Ordering::Relaxed);
        match namespaces::scan_source_file(&file) {
            Ok(found) => declared.extend(found),
            Err(e) => state.skip(&file, SkipReason::UnreadableSource, e),
        }
    }

    Ok((properties, declared))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn sln_text(projects: &[&str]) -> String {
        let mut text = String::from("Microsoft Visual Studio Solution File, Format Version 12.00\n");
        for (i, p) in projects.iter().enumerate() {
            text.push_str(&format!(
                "Project(\"{{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}}\") = \"P{i}\", \"{p}\", \"{{00000000-0000-0000-0000-00000000000{i}}}\"\nEndProject\n"
            ));
        }
        text
    }

    #[tokio::test]
    async fn shared_project_is_extracted_once() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(
            &root.join("Shared/Shared.csproj"),
            "<Project><PropertyGroup><RootNamespace>Acme.Shared</RootNamespace></PropertyGroup></Project>",
        );
        write(&root.join("Shared/Util.cs"), "namespace Acme.Shared.Util;");
        write(&root.join("One.sln"), &sln_text(&["Shared\\Shared.csproj"]));
        write(&root.join("Two.sln"), &sln_text(&["Shared\\Shared.csproj"]));

        let output = Scanner::new(4)
            .scan(root, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(output.projects.len(), 1);
        let shared = &output.projects[0];
        assert_eq!(shared.solution_paths.len(), 2);
        assert_eq!(shared.root_namespace, "Acme.Shared");
        assert_eq!(shared.assembly_name, "Shared");
        assert!(shared.declared_namespaces.contains("Acme.Shared.Util"));
        assert_eq!(output.stats.solutions, 2);
        assert_eq!(output.stats.source_files, 1);
    }

    #[tokio::test]
    async fn pre_cancelled_scan_returns_cancelled() {
        let dir = tempdir().unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = Scanner::new(2).scan(dir.path(), &cancel).await;
        assert!(matches!(result, Err(ScopeError::Cancelled)));
    }

    #[tokio::test]
    async fn missing_root_is_an_empty_scan() {
        let output = Scanner::new(2)
            .scan(Path::new("/no/such/root"), &CancellationToken::new())
            .await
            .unwrap();
        assert!(output.projects.is_empty());
        assert_eq!(output.stats, ScanStats::default());
    }

    #[test]
    fn parallelism_floor() {
        assert_eq!(Scanner::new(0).max_parallelism(), 2);
        assert_eq!(Scanner::new(6).max_parallelism(), 6);
    }

    /// `count` solutions, each with its own project holding `files` sources.
    fn wide_tree(root: &Path, count: usize, files: usize) {
        for s in 0..count {
            write(
                &root.join(format!("P{s:02}/P{s:02}.csproj")),
                &format!("<Project><PropertyGroup><RootNamespace>Acme.P{s:02}</RootNamespace></PropertyGroup></Project>"),
            );
            for f in 0..files {
                write(
                    &root.join(format!("P{s:02}/F{f:02}.cs")),
                    &format!("namespace Acme.P{s:02}.F{f:02} {{ }}"),
                );
            }
            let project = format!("P{s:02}\\P{s:02}.csproj");
            write(&root.join(format!("S{s:02}.sln")), &sln_text(&[project.as_str()]));
        }
    }

    #[tokio::test]
    async fn concurrent_solutions_never_exceed_permits() {
        let dir = tempdir().unwrap();
        wide_tree(dir.path(), 12, 2);

        // Hold each solution long enough for unbounded work to pile up.
        let slow: ScanProgress = Arc::new(|_: &Path| std::thread::sleep(std::time::Duration::from_millis(20)));
        let output = Scanner::new(2)
            .with_progress(slow)
            .scan(dir.path(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(output.stats.solutions, 12);
        assert_eq!(output.projects.len(), 12);
        assert!(
            (1..=2).contains(&output.stats.peak_concurrency),
            "peak {}",
            output.stats.peak_concurrency
        );
    }

    #[tokio::test]
    async fn cancellation_during_extraction_aborts_the_scan() {
        let dir = tempdir().unwrap();
        wide_tree(dir.path(), 4, 30);

        let cancel = CancellationToken::new();
        let started = Arc::new(AtomicUsize::new(0));
        let hook: ScanProgress = {
            let cancel = cancel.clone();
            let started = Arc::clone(&started);
            Arc::new(move |_: &Path| {
                started.fetch_add(1, Ordering::SeqCst);
                cancel.cancel();
            })
        };

        let result = Scanner::new(2).with_progress(hook).scan(dir.path(), &cancel).await;

        assert!(started.load(Ordering::SeqCst) >= 1);
        assert!(matches!(result, Err(ScopeError::Cancelled)));
    }

    #[tokio::test]
    async fn project_order_follows_discovery_not_name() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(
            &root.join("Zed/Zed.csproj"),
            "<Project><PropertyGroup><RootNamespace>Acme.Zed</RootNamespace></PropertyGroup></Project>",
        );
        write(
            &root.join("Alpha/Alpha.csproj"),
            "<Project><PropertyGroup><RootNamespace>Acme.Alpha</RootNamespace></PropertyGroup></Project>",
        );
        write(&root.join("A.sln"), &sln_text(&["Zed\\Zed.csproj", "Alpha\\Alpha.csproj"]));
        write(&root.join("B.sln"), &sln_text(&["Alpha\\Alpha.csproj"]));

        let output = Scanner::new(4)
            .scan(root, &CancellationToken::new())
            .await
            .unwrap();

        let names: Vec<_> = output.projects.iter().map(|p| p.display_name()).collect();
        assert_eq!(names, vec!["Zed", "Alpha"]);
    }
}
