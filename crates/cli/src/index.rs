use crate::{CliResult, GlobalOptions};
use slnscope_core::{RescanOutcome, SkipReason};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

pub async fn run(options: &GlobalOptions) -> CliResult {
    let config = options.effective_config()?;
    let service = options.service();
    service.configure(config);
    service.set_scan_progress(Arc::new(|sln: &Path| debug!("Processing {}", sln.display())));

    let Some(root) = service.config().and_then(|c| c.usable_root()) else {
        return Err("no usable root directory; pass --root or set rootDirectory in the config".into());
    };
    info!("Indexing solutions under: {}...", root.display());

    match service.force_rescan().await? {
        RescanOutcome::Published(stats) => {
            info!("Indexing complete!");
            info!("Solutions:    {}", stats.solutions);
            info!("Projects:     {}", stats.projects);
            info!("Source files: {}", stats.source_files);
            info!("Prefixes:     {}", service.snapshot().len());
            info!("Parallelism:  {} solution(s) at once", stats.peak_concurrency);
            if !stats.skipped.is_empty() {
                info!(
                    "Skipped: {} solution(s), {} project(s), {} source file(s)",
                    stats.skipped_count(SkipReason::MalformedSolution),
                    stats.skipped_count(SkipReason::MalformedProject),
                    stats.skipped_count(SkipReason::UnreadableSource)
                );
                for skip in &stats.skipped {
                    info!(" - {}: {}", skip.path.display(), skip.detail);
                }
            }
            info!("Index cache: {}", service.cache_path().display());
        }
        RescanOutcome::Superseded => info!("Indexing was superseded by another request."),
        RescanOutcome::NoRoot => info!("Nothing to index."),
    }

    Ok(())
}
