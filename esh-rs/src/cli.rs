//! Command-line argument parsing.
//!
//! Usage:
//!   esh [--rcfile <path> | --norc] [--history-file <path>] [--prompt <text>] [--no-bell]

use std::path::PathBuf;

use clap::Parser;

use crate::config;

// ── Public types ──────────────────────────────────────────────────────────────

/// Interactive shell with a built-in line editor
#[derive(Parser, Debug, Default, Clone, PartialEq, Eq)]
#[command(name = "esh", version, about = "Interactive shell with a built-in line editor")]
pub struct CliArgs {
    /// Durable history log (default: history.txt in the user data directory)
    #[arg(long, value_name = "PATH")]
    pub history_file: Option<PathBuf>,

    /// Read settings from this file instead of the default esh.conf
    #[arg(long, value_name = "PATH", conflicts_with = "norc")]
    pub rcfile: Option<PathBuf>,

    /// Do not read any rc file
    #[arg(long)]
    pub norc: bool,

    /// Prompt shown before each line
    #[arg(long, value_name = "TEXT")]
    pub prompt: Option<String>,

    /// Never ring the terminal bell
    #[arg(long)]
    pub no_bell: bool,
}

/// How to choose the rc file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RcFile {
    /// `--norc`.
    Skip,
    /// The default `esh.conf`, read only if it exists.
    Default(PathBuf),
    /// `--rcfile <path>`; a missing file is reported.
    Explicit(PathBuf),
}

impl CliArgs {
    /// Which rc file to load, if any.
    pub fn rc_file(&self) -> Option<RcFile> {
        if self.norc {
            return Some(RcFile::Skip);
        }
        match &self.rcfile {
            Some(path) => Some(RcFile::Explicit(path.clone())),
            None => config::default_rc_file().map(RcFile::Default),
        }
    }
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()`.  Prints usage and exits on `--help`,
/// `--version` or a bad argument.
pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}

/// Parse a slice of argument strings, without the program name (exposed for
/// testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, clap::Error> {
    CliArgs::try_parse_from(std::iter::once("esh").chain(argv.iter().map(String::as_str)))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
