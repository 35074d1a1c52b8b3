//! The shell: runs finished lines and drives the read-execute loop.
//!
//! [`Shell::execute`] takes one submitted line, records it in history, parses
//! it and runs the builtin with standard output sent to the terminal or the
//! redirection target.  [`Shell::run_editor`] repeats that with lines from
//! the line editor; [`Shell::run_script`] with plain lines from a pipe.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;

use crate::builtins::{self, Context, Flow};
use crate::completion::Completer;
use crate::editor::{LineReader, ReadOutcome};
use crate::history::{HistoryError, HistoryStore};
use crate::parse::{self, ParseError, RedirectMode, RedirectionDirective};
use crate::terminal::RawModeGuard;

/// Exit status when an interactive session ends with Ctrl-D.
pub const END_OF_INPUT_STATUS: i32 = 1;

// ── ShellError ────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// A redirection target could not be opened.
    #[error("{}: {}", .path.display(), builtins::describe(.source))]
    Redirect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

// ── Shell ─────────────────────────────────────────────────────────────────────

pub struct Shell {
    history: HistoryStore,
    home: Option<PathBuf>,
    /// Put the terminal in raw mode while a line is being edited.
    raw_mode: bool,
}

impl Shell {
    pub fn new(history: HistoryStore) -> Self {
        Self {
            history,
            home: directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()),
            raw_mode: false,
        }
    }

    /// Override the directory used by `cd` and `~`.
    pub fn with_home(mut self, home: Option<PathBuf>) -> Self {
        self.home = home;
        self
    }

    pub fn with_raw_mode(mut self, raw: bool) -> Self {
        self.raw_mode = raw;
        self
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    // ── Execution ─────────────────────────────────────────────────────────────

    /// Run one submitted line.
    ///
    /// Blank lines are ignored.  Anything else is appended to history first,
    /// so `history` lists the command that invoked it.  Problems with the
    /// line itself are reported on `err` and the shell continues; only a
    /// failed write to `out` or `err` is returned.
    pub fn execute(&mut self, line: &str, out: &mut dyn Write, err: &mut dyn Write) -> io::Result<Flow> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Flow::Continue);
        }
        if let Err(e) = self.history.append(line) {
            tracing::warn!(error = %e, "history append failed");
            writeln!(err, "esh: {e}")?;
        }

        let cmd = match parse::parse(line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => return Ok(Flow::Continue),
            Err(e) => {
                writeln!(err, "esh: {}", ShellError::from(e))?;
                return Ok(Flow::Continue);
            }
        };

        let home = self.home.clone();
        let flow = match &cmd.redirect {
            None => {
                let mut ctx = Context { history: &self.history, out: &mut *out, err: &mut *err, home };
                builtins::run(&cmd, &mut ctx)?
            }
            Some(redirect) => {
                let mut file = match open_redirect(redirect) {
                    Ok(f) => f,
                    Err(e) => {
                        writeln!(err, "esh: {e}")?;
                        return Ok(Flow::Continue);
                    }
                };
                let mut ctx = Context { history: &self.history, out: &mut file, err: &mut *err, home };
                let flow = builtins::run(&cmd, &mut ctx)?;
                file.flush()?;
                flow
            }
        };
        out.flush()?;
        err.flush()?;
        Ok(flow)
    }

    // ── Loops ─────────────────────────────────────────────────────────────────

    /// Read lines with the line editor until `exit` or end of input.
    /// Returns the exit status.
    pub fn run_editor<C, W, R>(
        &mut self,
        reader: &mut LineReader<C, W>,
        input: &mut R,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<i32, ShellError>
    where
        C: Completer,
        W: Write,
        R: Read,
    {
        loop {
            let outcome = {
                let _raw = if self.raw_mode { Some(RawModeGuard::enter()?) } else { None };
                reader.read_line(input, &self.history)?
            };
            match outcome {
                ReadOutcome::Line(line) => {
                    if let Flow::Exit(code) = self.execute(&line, out, err)? {
                        return Ok(code);
                    }
                }
                ReadOutcome::EndOfInput => {
                    tracing::debug!("end of input");
                    return Ok(END_OF_INPUT_STATUS);
                }
            }
        }
    }

    /// Run newline-separated lines from a non-terminal `input`, without a
    /// prompt or echo.  Running out of input exits with status 0.
    pub fn run_script<R: BufRead>(
        &mut self,
        input: R,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<i32, ShellError> {
        for line in input.lines() {
            if let Flow::Exit(code) = self.execute(&line?, out, err)? {
                return Ok(code);
            }
        }
        Ok(0)
    }
}

fn open_redirect(redirect: &RedirectionDirective) -> Result<File, ShellError> {
    let mut opts = OpenOptions::new();
    opts.create(true);
    match redirect.mode {
        RedirectMode::Overwrite => opts.write(true).truncate(true),
        RedirectMode::Append => opts.append(true),
    };
    opts.open(&redirect.target).map_err(|source| ShellError::Redirect {
        path: redirect.target.clone(),
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
