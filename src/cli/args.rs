//! CLI argument definitions using clap
//!
//! Commands:
//! - mvccdb repl [--config <path>] [--debug] [--isolation <level>]
//! - mvccdb run <script> [--config <path>] [--debug] [--isolation <level>]

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// mvccdb - an in-process MVCC key-value engine
#[derive(Parser, Debug)]
#[command(name = "mvccdb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read commands interactively from stdin
    Repl {
        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Execute a command script and exit
    Run {
        /// Path to the script, one command per line
        script: PathBuf,

        #[command(flatten)]
        engine: EngineArgs,
    },
}

/// Options shared by every command that opens a database.
#[derive(Args, Debug, Clone, Default)]
pub struct EngineArgs {
    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Trace every engine decision to stderr
    #[arg(long)]
    pub debug: bool,

    /// Default isolation level for `begin` without a level
    #[arg(long)]
    pub isolation: Option<String>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repl_flags() {
        let cli = Cli::try_parse_from(["mvccdb", "repl", "--debug", "--isolation", "si"]).unwrap();
        match cli.command {
            Command::Repl { engine } => {
                assert!(engine.debug);
                assert_eq!(engine.isolation.as_deref(), Some("si"));
                assert!(engine.config.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_run_script() {
        let cli =
            Cli::try_parse_from(["mvccdb", "run", "demo.mvcc", "--config", "db.json"]).unwrap();
        match cli.command {
            Command::Run { script, engine } => {
                assert_eq!(script, PathBuf::from("demo.mvcc"));
                assert_eq!(engine.config, Some(PathBuf::from("db.json")));
                assert!(!engine.debug);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_run_requires_script() {
        assert!(Cli::try_parse_from(["mvccdb", "run"]).is_err());
    }
}
