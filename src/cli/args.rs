//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Twenty questions: a yes/no decision tree that learns new animals
#[derive(Parser, Debug)]
#[command(name = "twentyq")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub debug: u8,

    /// Knowledge file (overrides data_file from config)
    #[arg(short = 'f', long, global = true, env = "TWENTYQ_FILE", value_hint = ValueHint::FilePath)]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive session: play rounds, teach, undo/redo, save/load
    Play,

    /// Print the stored knowledge tree
    Show,

    /// Load the knowledge file and verify its structure
    Check,

    /// Node, question and leaf counts of the stored tree
    Stats,

    /// Questions that tell two animals apart
    Compare {
        /// First animal
        first: String,
        /// Second animal
        second: String,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Print config template
    Template,

    /// Show config paths
    Path,
}
