//! Line I/O for the command loop
//!
//! - Input: one command per line, UTF-8
//! - Output: one result line per command on stdout
//! - Failures: `ERROR <CODE>: <message>`

use std::io::{BufRead, Write};

use super::errors::{CliError, CliResult};

/// Read command lines from any buffered reader.
pub fn read_lines<R: BufRead>(reader: R) -> impl Iterator<Item = CliResult<String>> {
    reader.lines().map(|line| line.map_err(CliError::from))
}

/// Write a command result.
pub fn write_reply<W: Write + ?Sized>(out: &mut W, reply: &str) -> CliResult<()> {
    writeln!(out, "{}", reply)?;
    out.flush()?;
    Ok(())
}

/// Write a command failure.
pub fn write_error<W: Write + ?Sized>(out: &mut W, code: &str, message: &str) -> CliResult<()> {
    writeln!(out, "ERROR {}: {}", code, message)?;
    out.flush()?;
    Ok(())
}

/// Write the interactive prompt (no newline).
pub fn write_prompt<W: Write + ?Sized>(out: &mut W, session: &str) -> CliResult<()> {
    write!(out, "{}> ", session)?;
    out.flush()?;
    Ok(())
}
