//! Interactive shell and script runner
//!
//! Both read one command per line. Blank lines and lines starting with `#`
//! are skipped.

use std::io::{BufRead, Write};
use std::path::Path;

use super::commands::ShellLine;
use super::session::{Flow, Session};
use crate::error::{BackupError, BackupResult};

/// Shell prompt
pub const PROMPT: &str = "> ";

/// Outcome of a script run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptSummary {
    /// Commands that ran successfully
    pub executed: usize,
    /// Failed commands as (line number, message)
    pub failures: Vec<(usize, String)>,
}

fn tokens(line: &str) -> Option<Vec<&str>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    Some(trimmed.split_whitespace().collect())
}

fn execute_line<W: Write>(
    session: &mut Session,
    tokens: Vec<&str>,
    out: &mut W,
) -> BackupResult<Flow> {
    let command = ShellLine::parse_tokens(tokens)?;
    session.execute(command, out)
}

/// Read commands from `input` until `exit` or end of input
///
/// Errors are reported on `err` as `error: <message>` and the loop goes on.
pub fn run_shell<R, W, E>(
    session: &mut Session,
    input: R,
    out: &mut W,
    err: &mut E,
) -> BackupResult<()>
where
    R: BufRead,
    W: Write,
    E: Write,
{
    let mut lines = input.lines();
    loop {
        write!(out, "{}", PROMPT).and_then(|_| out.flush())?;

        let line = match lines.next() {
            Some(line) => line?,
            None => {
                writeln!(out)?;
                return Ok(());
            }
        };

        let Some(tokens) = tokens(&line) else {
            continue;
        };

        match execute_line(session, tokens, out) {
            Ok(Flow::Exit) => return Ok(()),
            Ok(Flow::Continue) => {}
            Err(e) => writeln!(err, "error: {}", e)?,
        }
    }
}

/// Execute every command of a script file
///
/// Each failure is reported on `err` with its line number. Without
/// `keep_going` the first failure is returned; otherwise failures are
/// collected in the summary.
pub fn run_script<W, E>(
    session: &mut Session,
    script: &Path,
    keep_going: bool,
    out: &mut W,
    err: &mut E,
) -> BackupResult<ScriptSummary>
where
    W: Write,
    E: Write,
{
    let contents = std::fs::read_to_string(script).map_err(|e| {
        BackupError::Io(format!("Failed to read script {}: {}", script.display(), e))
    })?;

    let mut summary = ScriptSummary::default();
    for (index, line) in contents.lines().enumerate() {
        let line_num = index + 1;
        let Some(tokens) = tokens(line) else {
            continue;
        };

        match execute_line(session, tokens, out) {
            Ok(Flow::Exit) => break,
            Ok(Flow::Continue) => summary.executed += 1,
            Err(e) => {
                writeln!(err, "error: line {}: {}", line_num, e)?;
                if !keep_going {
                    return Err(e);
                }
                summary.failures.push((line_num, e.to_string()));
            }
        }
    }

    Ok(summary)
}
