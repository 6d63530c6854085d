use crate::{CliResult, GlobalOptions};
use slnscope_core::{NamespaceHit, ProjectIndexService};
use tabled::{Table, Tabled};
use tracing::info;

#[derive(Tabled)]
struct HitRow {
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Project")]
    project: String,
    #[tabled(rename = "Solutions")]
    solutions: String,
}

impl From<&NamespaceHit> for HitRow {
    fn from(hit: &NamespaceHit) -> Self {
        Self {
            namespace: hit.namespace.clone(),
            project: hit.project_path.display().to_string(),
            solutions: hit
                .solution_paths
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Configure `service`, seed it from the cache and build the index if it is still empty.
pub(crate) async fn prepare(options: &GlobalOptions) -> Result<std::sync::Arc<ProjectIndexService>, Box<dyn std::error::Error>> {
    let service = options.service();
    service.configure(options.effective_config()?);
    service.load_cache().await;

    if service.snapshot().is_empty() && service.config().and_then(|c| c.usable_root()).is_some() {
        info!("No index found at {}. Auto-indexing now...", service.cache_path().display());
        service.force_rescan().await?;
    }
    Ok(service)
}

pub async fn run(options: &GlobalOptions, identifier: &str, json: bool) -> CliResult {
    let service = prepare(options).await?;
    let hits = service.hits(identifier);

    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }

    if hits.is_empty() {
        println!("No project declares a namespace matching '{}'.", identifier);
    } else {
        let rows: Vec<HitRow> = hits.iter().map(HitRow::from).collect();
        println!("{}", Table::new(rows));
    }
    Ok(())
}
