//! Tab completion: command names first, then entries of the working directory.

use std::io;
use std::path::{Path, PathBuf};

use crate::builtins::Builtin;

// ── Completion ────────────────────────────────────────────────────────────────

/// What a completion query produced, as the line editor consumes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// No candidate matches.
    None,
    /// Exactly one candidate.
    Unique(String),
    /// Two or more candidates, in display order.
    Ambiguous(Vec<String>),
}

impl Completion {
    pub fn from_candidates(mut candidates: Vec<String>) -> Self {
        match candidates.len() {
            0 => Completion::None,
            1 => Completion::Unique(candidates.remove(0)),
            _ => Completion::Ambiguous(candidates),
        }
    }
}

// ── Completer ─────────────────────────────────────────────────────────────────

/// Source of completion candidates for a prefix.
pub trait Completer {
    /// Candidates that begin with `prefix`, in a stable order, without
    /// duplicates.
    fn complete(&self, prefix: &str) -> Vec<String>;
}

/// The shell's completer: known command names take priority; otherwise
/// non-hidden names in a directory (the process working directory unless
/// pinned with [`CompletionProvider::in_dir`]).
#[derive(Debug, Clone)]
pub struct CompletionProvider {
    commands: Vec<String>,
    dir: Option<PathBuf>,
}

impl CompletionProvider {
    pub fn new<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            commands: commands.into_iter().map(Into::into).collect(),
            dir: None,
        }
    }

    /// Search `dir` instead of the working directory.
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    fn search_dir(&self) -> io::Result<PathBuf> {
        match &self.dir {
            Some(d) => Ok(d.clone()),
            None => std::env::current_dir(),
        }
    }
}

impl Default for CompletionProvider {
    fn default() -> Self {
        Self::new(Builtin::names())
    }
}

impl Completer for CompletionProvider {
    fn complete(&self, prefix: &str) -> Vec<String> {
        let mut commands: Vec<String> = Vec::new();
        for cmd in &self.commands {
            if cmd.starts_with(prefix) && !commands.contains(cmd) {
                commands.push(cmd.clone());
            }
        }
        if !commands.is_empty() {
            tracing::trace!(prefix, count = commands.len(), "command completion");
            return commands;
        }

        let entries = match self.search_dir().and_then(|dir| list_dir(&dir)) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(prefix, error = %e, "directory completion unavailable");
                return Vec::new();
            }
        };
        let files: Vec<String> = entries
            .into_iter()
            .filter(|name| name.starts_with(prefix))
            .collect();
        tracing::trace!(prefix, count = files.len(), "file completion");
        files
    }
}

// ── Directory listing ─────────────────────────────────────────────────────────

/// Names in `dir`, sorted, skipping hidden (`.`-prefixed) entries.
///
/// Names that are not valid UTF-8 are converted lossily.  Also used by the
/// `ls` builtin.
pub fn list_dir(dir: &Path) -> io::Result<Vec<String>> {
    let mut names: Vec<String> = std::fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| !name.starts_with('.'))
        .collect();
    names.sort();
    Ok(names)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
