//! Command dispatch

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use tracing::{debug, instrument};

use crate::application::render::to_tree_string;
use crate::application::{ApplicationError, KnowledgeBase};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::cli::session::{describe_distinction, Session};
use crate::config::{global_config_path, Settings};
use crate::domain::integrity::find_violation;
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::TerminalConsole;
use crate::infrastructure::InfraError;

/// Execute the CLI command.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Completion { shell }) => cmd_completion(*shell),
        Some(Commands::Config { command }) => cmd_config(command),
        Some(cmd) => {
            let settings = Settings::load(None)?;
            let data_file = cli
                .file
                .clone()
                .unwrap_or_else(|| settings.data_file.clone());
            let container = ServiceContainer::new(settings);
            match cmd {
                Commands::Play => cmd_play(&container, data_file),
                Commands::Show => cmd_show(&container, &data_file),
                Commands::Check => cmd_check(&container, &data_file),
                Commands::Stats => cmd_stats(&container, &data_file),
                Commands::Compare { first, second } => {
                    cmd_compare(&container, &data_file, first, second)
                }
                Commands::Completion { .. } | Commands::Config { .. } => Ok(()),
            }
        }
        None => {
            let mut cmd = Cli::command();
            cmd.print_help()
                .map_err(|e| CliError::Infra(InfraError::io("print help", e)))?;
            Ok(())
        }
    }
}

fn cmd_completion(shell: clap_complete::Shell) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}

fn cmd_config(command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(None)?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => {
            output::header("Config paths");
            match global_config_path() {
                Some(path) => {
                    let status = if path.exists() { "exists" } else { "not found" };
                    output::detail(&format!("global: {} ({})", path.display(), status));
                }
                None => output::detail("global: (no config directory)"),
            }
            let settings = Settings::load(None)?;
            output::detail(&format!("data:   {}", settings.data_file.display()));
        }
    }
    Ok(())
}

#[instrument(level = "debug", skip(container))]
fn cmd_play(container: &ServiceContainer, data_file: PathBuf) -> CliResult<()> {
    let mut console = TerminalConsole;
    let mut session = Session::start(container, data_file, &mut console)?;
    session.run()
}

/// Knowledge base holding the tree stored at `path`.
fn load_stored(container: &ServiceContainer, path: &Path) -> CliResult<KnowledgeBase> {
    let mut kb = container
        .knowledge_base()
        .map_err(|e| InfraError::Application(e.into()))?;
    let nodes = kb.load(path)?;
    debug!("loaded {} nodes from {}", nodes, path.display());
    Ok(kb)
}

fn cmd_show(container: &ServiceContainer, path: &Path) -> CliResult<()> {
    let kb = load_stored(container, path)?;
    output::info(&to_tree_string(kb.tree()));
    Ok(())
}

fn cmd_check(container: &ServiceContainer, path: &Path) -> CliResult<()> {
    let kb = load_stored(container, path)?;
    match find_violation(kb.tree()).map_err(ApplicationError::from)? {
        None => {
            let nodes = kb.tree().len();
            output::success(&format!("{}: {} nodes, consistent", path.display(), nodes));
            Ok(())
        }
        Some(v) => {
            output::failure(&format!("node {} ({:?}): {}", v.position, v.text, v.reason));
            Err(CliError::Integrity(format!(
                "node {} ({:?}): {}",
                v.position, v.text, v.reason
            )))
        }
    }
}

fn cmd_stats(container: &ServiceContainer, path: &Path) -> CliResult<()> {
    let kb = load_stored(container, path)?;
    let stats = kb.stats().map_err(ApplicationError::from)?;
    output::header(&path.display());
    output::detail(&format!("nodes:     {}", stats.nodes));
    output::detail(&format!("questions: {}", stats.questions));
    output::detail(&format!("animals:   {}", stats.leaves));
    output::detail(&format!("depth:     {}", stats.depth));
    Ok(())
}

fn cmd_compare(
    container: &ServiceContainer,
    path: &Path,
    first: &str,
    second: &str,
) -> CliResult<()> {
    let kb = load_stored(container, path)?;
    let distinction = kb
        .distinguish(first, second)
        .map_err(ApplicationError::from)?
        .ok_or_else(|| {
            CliError::InvalidArgs(format!("{} and {} are not both in the tree", first, second))
        })?;
    for line in describe_distinction(&distinction, first, second) {
        output::info(&line);
    }
    Ok(())
}
