//! Command dispatcher
//!
//! Turns a verb plus positional arguments into a [`Command`] and runs it
//! against the current session. The REPL and the script runner both go
//! through [`Dispatcher::exec_line`], so they accept exactly the same input.
//!
//! Several named sessions can be open at once against the same database;
//! `session <name>` switches between them (creating on first use). Commands
//! run under whichever session is current.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::engine::{Database, Session};
use crate::mvcc::{IsolationLevel, TxId};

use super::errors::DispatchError;

/// Name of the session a dispatcher starts in.
pub const DEFAULT_SESSION: &str = "main";

const HELP: &str = "\
begin [level]       start a transaction (ru, rc, rr, si, ser)
get <key>           read the visible value
set <key> <value>   write a value
delete <key>        delete the visible value
commit              commit the open transaction
abort               abort the open transaction
session <name>      switch to (or open) a named session
stats               engine counters as JSON
help                this text
exit | quit         leave";

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Begin(Option<IsolationLevel>),
    Get(String),
    Set(String, String),
    Delete(String),
    Commit,
    Abort,
    Session(String),
    Stats,
    Help,
    Exit,
}

impl Command {
    /// Parses a verb (case-insensitive) and its arguments.
    pub fn parse(verb: &str, args: &[&str]) -> Result<Self, DispatchError> {
        let command = match verb.to_ascii_lowercase().as_str() {
            "begin" => match args {
                [] => Command::Begin(None),
                [level] => Command::Begin(Some(level.parse()?)),
                _ => return Err(DispatchError::Usage("begin [level]")),
            },
            "get" => match args {
                [key] => Command::Get(key.to_string()),
                _ => return Err(DispatchError::Usage("get <key>")),
            },
            "set" => match args {
                [key, value @ ..] if !value.is_empty() => {
                    Command::Set(key.to_string(), value.join(" "))
                }
                _ => return Err(DispatchError::Usage("set <key> <value>")),
            },
            "delete" => match args {
                [key] => Command::Delete(key.to_string()),
                _ => return Err(DispatchError::Usage("delete <key>")),
            },
            "session" => match args {
                [name] => Command::Session(name.to_string()),
                _ => return Err(DispatchError::Usage("session <name>")),
            },
            "commit" => Self::bare(Command::Commit, args, "commit")?,
            "abort" => Self::bare(Command::Abort, args, "abort")?,
            "stats" => Self::bare(Command::Stats, args, "stats")?,
            "help" => Command::Help,
            "exit" | "quit" => Command::Exit,
            _ => return Err(DispatchError::UnknownCommand(verb.to_string())),
        };
        Ok(command)
    }

    /// Parses one input line. Blank lines and `#` comments yield `None`.
    pub fn parse_line(line: &str) -> Result<Option<Self>, DispatchError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        let mut words = line.split_whitespace();
        let verb = words.next().unwrap_or_default();
        let args: Vec<&str> = words.collect();
        Self::parse(verb, &args).map(Some)
    }

    fn bare(command: Command, args: &[&str], usage: &'static str) -> Result<Self, DispatchError> {
        if args.is_empty() {
            Ok(command)
        } else {
            Err(DispatchError::Usage(usage))
        }
    }
}

/// Result of a successful command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Begun(TxId),
    Value(String),
    NotFound,
    Stored(String),
    Done,
    Switched(String),
    Text(String),
    Exit,
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Begun(tx) => write!(f, "{}", tx),
            Reply::Value(value) | Reply::Stored(value) => write!(f, "{}", value),
            Reply::NotFound => write!(f, "(not found)"),
            Reply::Done => write!(f, "OK"),
            Reply::Switched(name) => write!(f, "session {}", name),
            Reply::Text(text) => write!(f, "{}", text),
            Reply::Exit => write!(f, "bye"),
        }
    }
}

/// Routes commands to named sessions over one shared database.
#[derive(Debug)]
pub struct Dispatcher {
    db: Arc<Database>,
    sessions: BTreeMap<String, Session>,
    current: String,
}

impl Dispatcher {
    pub fn new(db: Arc<Database>) -> Self {
        let mut sessions = BTreeMap::new();
        sessions.insert(DEFAULT_SESSION.to_string(), db.open_session());
        Self {
            db,
            sessions,
            current: DEFAULT_SESSION.to_string(),
        }
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// Name of the session commands currently run under.
    pub fn current_session(&self) -> &str {
        &self.current
    }

    pub fn session_names(&self) -> Vec<&str> {
        self.sessions.keys().map(String::as_str).collect()
    }

    /// Parses and runs one verb with its arguments.
    pub fn exec(&mut self, verb: &str, args: &[&str]) -> Result<Reply, DispatchError> {
        let command = Command::parse(verb, args)?;
        self.execute(command)
    }

    /// Parses and runs one input line; `None` for blanks and comments.
    pub fn exec_line(&mut self, line: &str) -> Result<Option<Reply>, DispatchError> {
        match Command::parse_line(line)? {
            Some(command) => self.execute(command).map(Some),
            None => Ok(None),
        }
    }

    pub fn execute(&mut self, command: Command) -> Result<Reply, DispatchError> {
        let reply = match command {
            Command::Begin(level) => Reply::Begun(self.session_mut().begin(level)?),
            Command::Get(key) => match self.session_mut().get(&key)? {
                Some(value) => Reply::Value(value),
                None => Reply::NotFound,
            },
            Command::Set(key, value) => Reply::Stored(self.session_mut().set(&key, &value)?),
            Command::Delete(key) => {
                self.session_mut().delete(&key)?;
                Reply::Done
            }
            Command::Commit => {
                self.session_mut().commit()?;
                Reply::Done
            }
            Command::Abort => {
                self.session_mut().abort()?;
                Reply::Done
            }
            Command::Session(name) => {
                if !self.sessions.contains_key(&name) {
                    self.sessions.insert(name.clone(), self.db.open_session());
                }
                self.current = name.clone();
                Reply::Switched(name)
            }
            Command::Stats => Reply::Text(self.db.metrics().to_json()),
            Command::Help => Reply::Text(HELP.to_string()),
            Command::Exit => Reply::Exit,
        };
        Ok(reply)
    }

    fn session_mut(&mut self) -> &mut Session {
        let db = &self.db;
        self.sessions
            .entry(self.current.clone())
            .or_insert_with(|| db.open_session())
    }
}
