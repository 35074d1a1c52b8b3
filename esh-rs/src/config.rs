//! `esh.conf` rc file parser and settings resolution.
//!
//! | Line | Meaning |
//! |------|---------|
//! | `prompt = <text>` | prompt shown before each line |
//! | `history_file = <path>` | durable history log |
//! | `bell = on\|off` | ring the bell when completion fails |
//! | `#…` or `;…` | comment, ignored |
//!
//! Values may be wrapped in double quotes to keep surrounding spaces
//! (`prompt = "esh> "`).  Mistakes are collected as [`ConfigError`]s and never
//! stop the shell from starting.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::cli::CliArgs;

pub const DEFAULT_PROMPT: &str = "$ ";
pub const RC_FILE_NAME: &str = "esh.conf";
pub const HISTORY_FILE_NAME: &str = "history.txt";

// ── Public API ────────────────────────────────────────────────────────────────

/// A non-fatal error encountered while loading an rc file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct ConfigError {
    pub line: usize,
    pub message: String,
}

/// Settings read from an rc file.  `None` means the file did not set it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub prompt: Option<String>,
    pub history_file: Option<PathBuf>,
    pub bell: Option<bool>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse rc file text.  Returns the config and any errors found on
    /// individual lines; a later line overrides an earlier one.
    pub fn load_str(s: &str) -> (Self, Vec<ConfigError>) {
        let mut config = Config::new();
        let mut errors = Vec::new();

        for (i, raw) in s.lines().enumerate() {
            let lineno = i + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                errors.push(ConfigError {
                    line: lineno,
                    message: format!("expected `key = value`, got `{line}'"),
                });
                continue;
            };
            let key = key.trim();
            let value = unquote(value.trim());

            if let Err(message) = config.set(key, value) {
                errors.push(ConfigError { line: lineno, message });
            }
        }

        (config, errors)
    }

    /// Read and parse an rc file from disk.
    pub fn load_file(path: &Path) -> std::io::Result<(Self, Vec<ConfigError>)> {
        let s = std::fs::read_to_string(path)?;
        Ok(Self::load_str(&s))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key {
            "prompt" => self.prompt = Some(value.to_owned()),
            "history_file" => {
                if value.is_empty() {
                    return Err("history_file: empty path".to_owned());
                }
                self.history_file = Some(PathBuf::from(value));
            }
            "bell" => {
                let on = parse_switch(value)
                    .ok_or_else(|| format!("bell: expected on or off, got `{value}'"))?;
                self.bell = Some(on);
            }
            _ => return Err(format!("unknown setting `{key}'")),
        }
        Ok(())
    }
}

/// Strip one pair of surrounding double quotes.
fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(s)
}

fn parse_switch(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

/// Per-user directories for esh, if a home directory can be found.
pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "esh")
}

/// `<config dir>/esh.conf`.
pub fn default_rc_file() -> Option<PathBuf> {
    project_dirs().map(|d| d.config_dir().join(RC_FILE_NAME))
}

/// `<data dir>/history.txt`, or `./history.txt` without a home directory.
pub fn default_history_file() -> PathBuf {
    project_dirs()
        .map(|d| d.data_dir().join(HISTORY_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(HISTORY_FILE_NAME))
}

/// Directory for diagnostic log files.
pub fn log_dir() -> Option<PathBuf> {
    project_dirs().map(|d| d.data_dir().join("logs"))
}

// ── Settings ──────────────────────────────────────────────────────────────────

/// Effective settings after merging the command line, the rc file and the
/// defaults, in that order of precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub prompt: String,
    pub history_file: PathBuf,
    pub bell: bool,
}

impl Settings {
    pub fn resolve(cli: &CliArgs, rc: &Config) -> Self {
        Self::resolve_with(cli, rc, default_history_file)
    }

    fn resolve_with(cli: &CliArgs, rc: &Config, default_history: impl FnOnce() -> PathBuf) -> Self {
        let prompt = cli
            .prompt
            .clone()
            .or_else(|| rc.prompt.clone())
            .unwrap_or_else(|| DEFAULT_PROMPT.to_owned());
        let history_file = cli
            .history_file
            .clone()
            .or_else(|| rc.history_file.clone())
            .unwrap_or_else(default_history);
        let bell = !cli.no_bell && rc.bell.unwrap_or(true);
        Self { prompt, history_file, bell }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
