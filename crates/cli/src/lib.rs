mod clear;
mod config;
mod index;
mod open;
mod query;
mod usings;
mod watch;

use clap::{Args, Parser, Subcommand};
use slnscope_core::{IndexConfig, ProjectIndexService};
use std::path::PathBuf;
use std::sync::Arc;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(
    name = "slnscope",
    version,
    about = "Find the solutions that own a namespace",
    long_about = "slnscope scans a tree of repositories for solution files, indexes the namespaces \
                  their C# projects declare, and answers which solutions own a given namespace. \
                  The index is cached on disk and refreshed when the tree changes."
)]
pub struct Cli {
    #[command(flatten)]
    pub options: GlobalOptions,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags that override values from the config file.
#[derive(Args, Debug, Default)]
pub struct GlobalOptions {
    /// Directory scanned recursively for solution files
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Maximum number of solutions processed at once (at least 2)
    #[arg(long, global = true, value_name = "N")]
    pub max_parallelism: Option<usize>,

    /// Do not rescan when the watcher starts; serve the cached index first
    #[arg(long, global = true)]
    pub no_rescan_on_startup: bool,

    /// Config file to read instead of the default one
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Index cache file to use instead of the default one
    #[arg(long, global = true, value_name = "FILE")]
    pub cache: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan the root directory and rebuild the index
    #[command(
        long_about = "Walks the root directory for .sln files, extracts the namespaces of every \
                      C# project they reference and writes the resulting index to the cache."
    )]
    Index,
    /// Show the projects and solutions owning a namespace or qualified name
    #[command(
        long_about = "Looks up the longest indexed prefix of IDENTIFIER. \
                      Builds the index first when no cache exists yet."
    )]
    Query {
        #[arg(value_name = "IDENTIFIER")]
        identifier: String,

        /// Print the hits as JSON
        #[arg(long)]
        json: bool,
    },
    /// Keep the index fresh while the tree changes
    #[command(
        long_about = "Loads the cached index, rescans (unless disabled) and watches the root directory. \
                      Changes trigger a rescan at most once every 10 seconds."
    )]
    Watch,
    /// Resolve every `using` directive of a C# file to its solutions
    Usings {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Open the solution owning a namespace
    Open {
        #[arg(value_name = "IDENTIFIER")]
        identifier: String,

        /// Open in a new IDE window
        #[arg(long)]
        new_window: bool,

        /// Which candidate to open when several solutions match (0-based)
        #[arg(long, value_name = "N")]
        pick: Option<usize>,
    },
    /// Delete the index cache
    Clear,
    /// Print the effective configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        save: bool,
    },
}

impl GlobalOptions {
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(slnscope_core::config::default_config_path)
    }

    /// The config file with command-line overrides applied.
    pub fn effective_config(&self) -> slnscope_core::Result<IndexConfig> {
        let mut config = IndexConfig::load(&self.config_path())?;
        if let Some(root) = &self.root {
            config.root_directory = Some(root.clone());
        }
        if let Some(n) = self.max_parallelism {
            config.max_parallelism = n;
        }
        if self.no_rescan_on_startup {
            config.rescan_on_startup = false;
        }
        Ok(config)
    }

    pub fn service(&self) -> Arc<ProjectIndexService> {
        let service = match &self.cache {
            Some(path) => ProjectIndexService::new(path),
            None => ProjectIndexService::with_default_cache(),
        };
        Arc::new(service)
    }
}

pub fn run() -> CliResult {
    let cli = Cli::parse();

    let _guard = slnscope_core::logging::init_logging("cli", true);

    let rt = tokio::runtime::Runtime::new()?;
    let options = &cli.options;

    match cli.command {
        Commands::Index => rt.block_on(index::run(options)),
        Commands::Query { identifier, json } => rt.block_on(query::run(options, &identifier, json)),
        Commands::Watch => rt.block_on(watch::run(options)),
        Commands::Usings { file } => rt.block_on(usings::run(options, &file)),
        Commands::Open {
            identifier,
            new_window,
            pick,
        } => rt.block_on(open::run(options, &identifier, new_window, pick)),
        Commands::Clear => rt.block_on(clear::run(options)),
        Commands::Config { save } => config::run(options, save),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "slnscope",
            "query",
            "Acme.Widgets",
            "--root",
            "/src",
            "--max-parallelism",
            "8",
        ])
        .unwrap();
        assert_eq!(cli.options.root, Some(PathBuf::from("/src")));
        assert_eq!(cli.options.max_parallelism, Some(8));
        assert!(matches!(cli.command, Commands::Query { ref identifier, json: false } if identifier == "Acme.Widgets"));
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "rootDirectory": "/from/file", "maxParallelism": 3 }"#).unwrap();

        let options = GlobalOptions {
            root: Some(PathBuf::from("/from/flag")),
            no_rescan_on_startup: true,
            config: Some(path),
            ..GlobalOptions::default()
        };
        let config = options.effective_config().unwrap();
        assert_eq!(config.root_directory, Some(PathBuf::from("/from/flag")));
        assert_eq!(config.max_parallelism, 3);
        assert!(!config.rescan_on_startup);
    }
}
