use crate::{CliResult, GlobalOptions};
use tracing::info;

pub async fn run(options: &GlobalOptions) -> CliResult {
    let config = options.effective_config()?;
    let Some(root) = config.usable_root().map(|p| p.to_path_buf()) else {
        return Err("no usable root directory; pass --root or set rootDirectory in the config".into());
    };

    let service = options.service();
    info!("Initializing: watching solutions under {}...", root.display());
    service.initialize(config).await;
    info!("Serving {} cached prefixes.", service.snapshot().len());
    info!("Press Ctrl+C to stop.");

    tokio::signal::ctrl_c().await?;
    service.shutdown();
    info!("Watcher stopped.");

    Ok(())
}
