//! CLI command implementations
//!
//! Both commands resolve configuration the same way (file, then flags), build
//! one shared `Database`, and feed lines through a `Dispatcher`. Per-command
//! failures are printed and the loop continues; only I/O failures and engine
//! corruption end it.

use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::engine::{Database, EngineConfig};
use crate::mvcc::IsolationLevel;
use crate::observability::{
    log_event, log_event_with_fields, Event, LogObserver, Logger, NoopObserver, TraceObserver,
};

use super::args::{Command, EngineArgs};
use super::dispatcher::{Dispatcher, Reply};
use super::errors::{CliError, CliResult, DispatchError};
use super::io::{read_lines, write_error, write_prompt, write_reply};

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Isolation level for `begin` without a level (optional, default "read_committed")
    #[serde(default = "default_isolation")]
    pub default_isolation: String,

    /// Trace engine decisions to stderr (optional, default false)
    #[serde(default)]
    pub debug: bool,
}

fn default_isolation() -> String {
    IsolationLevel::default().as_str().to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_isolation: default_isolation(),
            debug: false,
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Config file (if any) with command-line flags applied on top.
    pub fn resolve(args: &EngineArgs) -> CliResult<Self> {
        let mut config = match args.config {
            Some(ref path) => Self::load(path)?,
            None => Self::default(),
        };

        if args.debug {
            config.debug = true;
        }
        if let Some(ref level) = args.isolation {
            config.default_isolation = level.clone();
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        self.isolation().map(|_| ())
    }

    /// The parsed default isolation level.
    pub fn isolation(&self) -> CliResult<IsolationLevel> {
        self.default_isolation.parse().map_err(|_| {
            CliError::config_error(format!(
                "Invalid default_isolation: '{}'. Expected one of: {}",
                self.default_isolation,
                IsolationLevel::ALL
                    .iter()
                    .map(IsolationLevel::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })
    }

    pub fn engine_config(&self) -> CliResult<EngineConfig> {
        Ok(EngineConfig::with_default_isolation(self.isolation()?))
    }

    /// Trace sink: stderr when debugging, nothing otherwise.
    pub fn observer(&self) -> Arc<dyn TraceObserver> {
        if self.debug {
            Arc::new(LogObserver::stderr())
        } else {
            Arc::new(NoopObserver)
        }
    }

    pub fn open_database(&self) -> CliResult<Arc<Database>> {
        Ok(Arc::new(Database::with_observer(
            self.engine_config()?,
            self.observer(),
        )))
    }
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Repl { engine } => repl(&engine),
        Command::Run { script, engine } => run_script(&script, &engine),
    }
}

/// Interactive loop over stdin.
pub fn repl(args: &EngineArgs) -> CliResult<()> {
    let config = Config::resolve(args)?;
    let mut dispatcher = Dispatcher::new(config.open_database()?);
    announce(&config);

    if config.debug {
        log_event(Event::ReplStart);
    }
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let result = serve(&mut dispatcher, stdin.lock(), &mut stdout, true);
    if config.debug {
        log_event(Event::ReplExit);
    }
    result
}

/// Executes every line of `script`.
pub fn run_script(script: &Path, args: &EngineArgs) -> CliResult<()> {
    let config = Config::resolve(args)?;
    let file = fs::File::open(script).map_err(|e| {
        CliError::io_error(format!("Failed to open script {:?}: {}", script, e))
    })?;
    let mut dispatcher = Dispatcher::new(config.open_database()?);
    announce(&config);

    let mut stdout = io::stdout();
    serve(&mut dispatcher, BufReader::new(file), &mut stdout, false)
}

/// Feeds `input` through `dispatcher`, writing one line per command.
///
/// Stops at end of input, `exit`, or a fatal engine error.
pub fn serve<R: BufRead, W: Write + ?Sized>(
    dispatcher: &mut Dispatcher,
    input: R,
    output: &mut W,
    interactive: bool,
) -> CliResult<()> {
    if interactive {
        write_prompt(output, dispatcher.current_session())?;
    }

    for line in read_lines(input) {
        match dispatcher.exec_line(&line?) {
            Ok(Some(Reply::Exit)) => break,
            Ok(Some(reply)) => write_reply(output, &reply.to_string())?,
            Ok(None) => {}
            Err(DispatchError::Engine(ref err)) if err.is_fatal() => {
                let message = err.to_string();
                Logger::fatal(
                    Event::EngineFatal.as_str(),
                    &[("code", err.code()), ("message", message.as_str())],
                );
                write_error(output, err.code(), &message)?;
                return Err(CliError::engine_fatal(err));
            }
            Err(err) => write_error(output, err.code(), &err.to_string())?,
        }

        if interactive {
            write_prompt(output, dispatcher.current_session())?;
        }
    }
    Ok(())
}

fn announce(config: &Config) {
    if config.debug {
        log_event_with_fields(
            Event::ConfigLoaded,
            &[
                ("default_isolation", config.default_isolation.as_str()),
                ("debug", "true"),
            ],
        );
    }
}
