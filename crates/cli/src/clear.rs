use crate::{CliResult, GlobalOptions};
use tracing::info;

pub async fn run(options: &GlobalOptions) -> CliResult {
    let service = options.service();
    info!("Clearing index cache at: {}...", service.cache_path().display());
    service.clear_cache().await?;
    info!("Index cache cleared.");
    Ok(())
}
