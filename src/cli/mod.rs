//! CLI module for mvccdb
//!
//! Provides the command-line interface:
//! - repl: interactive command loop on stdin
//! - run: execute a command script
//!
//! Both share the same command grammar through `Dispatcher`.

mod args;
mod commands;
mod dispatcher;
mod errors;
mod io;

pub use args::{Cli, Command, EngineArgs};
pub use commands::{repl, run, run_command, run_script, serve, Config};
pub use dispatcher::{Command as ReplCommand, Dispatcher, Reply, DEFAULT_SESSION};
pub use errors::{CliError, CliErrorCode, CliResult, DispatchError};
pub use io::{read_lines, write_error, write_prompt, write_reply};
