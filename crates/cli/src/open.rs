use crate::{CliResult, GlobalOptions};
use slnscope_core::opener::{SolutionOpener, candidate_solutions, open_candidate};
use slnscope_core::{Result, ScopeError};
use std::path::Path;
use std::process::Command;
use tracing::{info, warn};

/// Launches solutions through the configured IDE command or the desktop's default handler.
pub struct ShellOpener {
    ide_command: Option<String>,
}

impl ShellOpener {
    pub fn new(ide_command: Option<String>) -> Self {
        Self {
            ide_command: ide_command.filter(|c| !c.trim().is_empty()),
        }
    }

    fn spawn_ide(&self, command: &str, solution_path: &Path) -> Result<()> {
        let mut parts = command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| ScopeError::Config("empty IDE command".to_string()))?;
        Command::new(program)
            .args(parts)
            .arg(solution_path)
            .spawn()?;
        Ok(())
    }
}

fn default_open_command(path: &Path) -> Command {
    if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", ""]).arg(path);
        cmd
    } else if cfg!(target_os = "macos") {
        let mut cmd = Command::new("open");
        cmd.arg(path);
        cmd
    } else {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(path);
        cmd
    }
}

impl SolutionOpener for ShellOpener {
    fn open(&self, solution_path: &Path, new_window: bool) -> Result<()> {
        if new_window {
            if let Some(command) = &self.ide_command {
                match self.spawn_ide(command, solution_path) {
                    Ok(()) => return Ok(()),
                    // Fall back to the default handler in the current session
                    Err(e) => warn!("Failed to launch '{}': {}", command, e),
                }
            }
        }

        default_open_command(solution_path).spawn()?;
        Ok(())
    }
}

pub async fn run(
    options: &GlobalOptions,
    identifier: &str,
    new_window: bool,
    pick: Option<usize>,
) -> CliResult {
    let service = crate::query::prepare(options).await?;
    let candidates = candidate_solutions(&service.hits(identifier));

    let config = service.config().cloned().unwrap_or_default();
    let opener = ShellOpener::new(config.ide_command);
    let new_window = new_window || config.open_in_new_window;

    match open_candidate(&opener, &candidates, pick, new_window)? {
        Some(path) => info!("Opened {}", path.display()),
        None if candidates.is_empty() => {
            println!("No solution owns a namespace matching '{}'.", identifier)
        }
        None => {
            println!("Several solutions match '{}'. Choose one with --pick N:", identifier);
            for (i, path) in candidates.iter().enumerate() {
                println!("  [{}] {}", i, path.display());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_ide_command_is_ignored() {
        assert!(ShellOpener::new(Some("  ".into())).ide_command.is_none());
        assert_eq!(
            ShellOpener::new(Some("devenv /edit".into())).ide_command.as_deref(),
            Some("devenv /edit")
        );
    }

    #[test]
    fn default_command_targets_the_solution() {
        let cmd = default_open_command(Path::new("/r/All.sln"));
        assert!(cmd.get_args().any(|a| a == "/r/All.sln"));
    }
}
