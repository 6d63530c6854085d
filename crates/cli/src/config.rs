use crate::{CliResult, GlobalOptions};

pub fn run(options: &GlobalOptions, save: bool) -> CliResult {
    let config = options.effective_config()?;
    let path = options.config_path();

    println!("Config file: {}", path.display());
    println!("{}", serde_json::to_string_pretty(&config)?);

    if save {
        config.save(&path)?;
        println!("Saved.");
    }
    Ok(())
}
