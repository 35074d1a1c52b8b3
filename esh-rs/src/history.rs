//! Command history: the durable store and per-line recall state.
//!
//! [`HistoryStore`] is the append-only record of accepted lines, mirrored to
//! a plain-text log (one line per entry).  [`HistoryCursor`] is the transient
//! Up/Down navigation state for a single line being edited; it lives in the
//! line editor and is dropped when the line is submitted.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

// ── HistoryError ──────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// `history n` with an `n` that is not a number.
    #[error("history: {0}: numeric argument required")]
    InvalidFormat(String),
    /// `history n` with `n < 1` or more than the stored entry count.
    #[error("history: {requested}: invalid range (1-{available})")]
    InvalidRange { requested: String, available: usize },
    /// The durable log could not be read or written.
    #[error("history file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

// ── HistoryEntry ──────────────────────────────────────────────────────────────

/// One row of `history` output: an entry and its 1-based position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryEntry<'a> {
    pub index: usize,
    pub line: &'a str,
}

impl fmt::Display for HistoryEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.index, self.line)
    }
}

// ── HistoryStore ──────────────────────────────────────────────────────────────

/// Accepted input lines, oldest first.
///
/// Duplicates are kept; entries are never edited or reordered.
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    entries: Vec<String>,
    /// Durable log.  `None` keeps the history in memory only.
    path: Option<PathBuf>,
}

impl HistoryStore {
    /// A store backed by the log at `path`.  Nothing is read until
    /// [`HistoryStore::load`] is called.
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self {
            entries: Vec::new(),
            path: Some(path.into()),
        }
    }

    /// An in-memory store pre-filled with `entries`.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(Into::into).collect(),
            path: None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    // ── Persistence ───────────────────────────────────────────────────────────

    /// Create the log's parent directory if it is missing.
    pub fn create_parent_dir(&self) -> Result<(), HistoryError> {
        let Some(parent) = self.path.as_deref().and_then(Path::parent) else {
            return Ok(());
        };
        if parent.as_os_str().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(parent).map_err(|source| HistoryError::Io {
            path: parent.to_path_buf(),
            source,
        })
    }

    /// Replace the in-memory entries with the contents of the log.
    ///
    /// Blank lines are skipped.  A missing log is not an error.  On a read
    /// error the store is left empty and the error returned for reporting.
    pub fn load(&mut self) -> Result<usize, HistoryError> {
        self.entries.clear();
        let Some(path) = &self.path else {
            return Ok(0);
        };
        let bytes = match fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(source) => {
                return Err(HistoryError::Io {
                    path: path.clone(),
                    source,
                })
            }
        };
        let text = String::from_utf8_lossy(&bytes);
        self.entries = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_owned)
            .collect();
        tracing::debug!(count = self.entries.len(), path = %path.display(), "history loaded");
        Ok(self.entries.len())
    }

    /// Record `line` as the newest entry and append it to the log.
    ///
    /// The in-memory entry is added even when the log write fails, so recall
    /// in the current session stays correct.
    pub fn append(&mut self, line: &str) -> Result<(), HistoryError> {
        self.entries.push(line.to_owned());
        let Some(path) = &self.path else {
            return Ok(());
        };
        append_line(path, line).map_err(|source| HistoryError::Io {
            path: path.clone(),
            source,
        })
    }

    // ── Listing ───────────────────────────────────────────────────────────────

    /// The last `n` entries (all when `n` is `None`) with their 1-based
    /// positions.
    pub fn slice(&self, n: Option<usize>) -> Result<Vec<HistoryEntry<'_>>, HistoryError> {
        let n = match n {
            None => self.entries.len(),
            Some(n) if n >= 1 && n <= self.entries.len() => n,
            Some(n) => {
                return Err(HistoryError::InvalidRange {
                    requested: n.to_string(),
                    available: self.entries.len(),
                })
            }
        };
        let start = self.entries.len() - n;
        Ok(self.entries[start..]
            .iter()
            .enumerate()
            .map(|(i, line)| HistoryEntry {
                index: start + i + 1,
                line,
            })
            .collect())
    }

    /// Parse the argument of `history [n]` and return the matching slice.
    pub fn slice_arg(&self, arg: Option<&str>) -> Result<Vec<HistoryEntry<'_>>, HistoryError> {
        let n = match arg {
            None => None,
            Some(raw) => Some(self.parse_count(raw)?),
        };
        self.slice(n)
    }

    fn parse_count(&self, raw: &str) -> Result<usize, HistoryError> {
        let digits = raw.strip_prefix(['-', '+']).unwrap_or(raw);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(HistoryError::InvalidFormat(raw.to_owned()));
        }
        match raw.parse::<i64>() {
            Ok(n) if n >= 1 => usize::try_from(n).map_err(|_| self.out_of_range(raw)),
            _ => Err(self.out_of_range(raw)),
        }
    }

    fn out_of_range(&self, raw: &str) -> HistoryError {
        HistoryError::InvalidRange {
            requested: raw.to_owned(),
            available: self.entries.len(),
        }
    }
}

/// Open, append one newline-terminated line, flush, close.
fn append_line(path: &Path, line: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")?;
    file.flush()
}

// ── HistoryCursor ─────────────────────────────────────────────────────────────

/// Up/Down recall state for the line currently being edited.
///
/// `index` is `None` while the user is on the live line.  The live line is
/// saved in `backup` on the first Up of a navigation run and handed back
/// when Down moves past the newest entry.
#[derive(Debug, Clone, Default)]
pub struct HistoryCursor {
    index: Option<usize>,
    backup: String,
}

impl HistoryCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_navigating(&self) -> bool {
        self.index.is_some()
    }

    /// Position of the entry currently shown, if navigating.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Step to the next older entry.
    ///
    /// `current` is the live line; it is saved only when navigation starts.
    /// Returns `None` (nothing to show) when the history is empty.  At the
    /// oldest entry the oldest entry is returned again.
    pub fn previous<'h>(&mut self, history: &'h HistoryStore, current: &str) -> Option<&'h str> {
        if history.is_empty() {
            return None;
        }
        let index = match self.index {
            None => {
                self.backup = current.to_owned();
                history.len() - 1
            }
            Some(i) => i.saturating_sub(1).min(history.len() - 1),
        };
        self.index = Some(index);
        history.get(index)
    }

    /// Step to the next newer entry, or back to the saved live line.
    ///
    /// Returns `None` when not navigating (Down is a no-op then).
    pub fn next(&mut self, history: &HistoryStore) -> Option<String> {
        let index = self.index?;
        if index + 1 < history.len() {
            self.index = Some(index + 1);
            history.get(index + 1).map(str::to_owned)
        } else {
            self.index = None;
            Some(std::mem::take(&mut self.backup))
        }
    }

    /// Forget any navigation in progress.
    pub fn reset(&mut self) {
        self.index = None;
        self.backup.clear();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(entries: &[&str]) -> HistoryStore {
        HistoryStore::from_entries(entries.iter().copied())
    }

    fn rendered(entries: &[HistoryEntry<'_>]) -> Vec<String> {
        entries.iter().map(ToString::to_string).collect()
    }

    // ── create_parent_dir ─────────────────────────────────────────────────────

    #[test]
    fn parent_dir_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/history.txt");
        let mut h = HistoryStore::with_file(&path);
        h.create_parent_dir().unwrap();
        h.append("pwd").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "pwd\n");
    }

    #[test]
    fn parent_dir_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "").unwrap();
        let h = HistoryStore::with_file(blocker.join("history.txt"));
        assert!(matches!(h.create_parent_dir(), Err(HistoryError::Io { path, .. }) if path == blocker));
    }

    #[test]
    fn bare_file_name_needs_no_dir() {
        assert!(HistoryStore::with_file("history.txt").create_parent_dir().is_ok());
        assert!(HistoryStore::default().create_parent_dir().is_ok());
    }

    // ── append ────────────────────────────────────────────────────────────────

    #[test]
    fn append_keeps_duplicates() {
        let mut h = HistoryStore::default();
        h.append("ls").unwrap();
        h.append("ls").unwrap();
        assert_eq!(h.entries(), ["ls", "ls"]);
    }

    #[test]
    fn append_to_unwritable_log_still_records_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for appending.
        let mut h = HistoryStore::with_file(dir.path());
        let err = h.append("pwd").unwrap_err();
        assert!(matches!(err, HistoryError::Io { .. }));
        assert_eq!(h.entries(), ["pwd"]);
    }

    // ── load ──────────────────────────────────────────────────────────────────

    #[test]
    fn load_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.txt");
        fs::write(&path, "pwd\n\necho hi\n\n").unwrap();
        let mut h = HistoryStore::with_file(&path);
        assert_eq!(h.load().unwrap(), 2);
        assert_eq!(h.entries(), ["pwd", "echo hi"]);
    }

    #[test]
    fn load_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.txt");
        fs::write(&path, "a\nb\n").unwrap();
        let mut h = HistoryStore::with_file(&path);
        h.load().unwrap();
        h.load().unwrap();
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut h = HistoryStore::with_file(dir.path().join("nope"));
        assert_eq!(h.load().unwrap(), 0);
        assert!(h.is_empty());
    }

    #[test]
    fn append_then_load_round_trips_through_the_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.txt");
        let mut h = HistoryStore::with_file(&path);
        h.append("cd /tmp").unwrap();
        h.append("ls").unwrap();

        let mut reloaded = HistoryStore::with_file(&path);
        reloaded.load().unwrap();
        assert_eq!(reloaded.entries(), ["cd /tmp", "ls"]);
        assert_eq!(fs::read_to_string(&path).unwrap(), "cd /tmp\nls\n");
    }

    // ── slice ─────────────────────────────────────────────────────────────────

    #[test]
    fn slice_keeps_original_indices() {
        let h = filled(&["pwd", "echo hi", "ls"]);
        let rows = h.slice(Some(2)).unwrap();
        assert_eq!(rendered(&rows), ["2. echo hi", "3. ls"]);
    }

    #[test]
    fn slice_all_when_omitted() {
        let h = filled(&["pwd", "ls"]);
        assert_eq!(rendered(&h.slice(None).unwrap()), ["1. pwd", "2. ls"]);
    }

    #[test]
    fn slice_full_count_is_valid() {
        let h = filled(&["pwd", "ls"]);
        assert_eq!(h.slice(Some(2)).unwrap().len(), 2);
    }

    #[test]
    fn slice_zero_is_invalid_range() {
        let h = filled(&["pwd"]);
        assert!(matches!(h.slice(Some(0)), Err(HistoryError::InvalidRange { .. })));
    }

    #[test]
    fn slice_past_count_is_invalid_range() {
        let h = filled(&["pwd", "ls"]);
        assert!(matches!(h.slice(Some(3)), Err(HistoryError::InvalidRange { .. })));
    }

    #[test]
    fn slice_arg_rejects_non_numeric() {
        let h = filled(&["pwd"]);
        assert!(matches!(h.slice_arg(Some("abc")), Err(HistoryError::InvalidFormat(_))));
        assert!(matches!(h.slice_arg(Some("1x")), Err(HistoryError::InvalidFormat(_))));
    }

    #[test]
    fn slice_arg_negative_is_invalid_range() {
        let h = filled(&["pwd"]);
        assert!(matches!(h.slice_arg(Some("-1")), Err(HistoryError::InvalidRange { .. })));
    }

    #[test]
    fn slice_arg_huge_number_is_invalid_range() {
        let h = filled(&["pwd"]);
        let err = h.slice_arg(Some("99999999999999999999999")).unwrap_err();
        assert!(matches!(err, HistoryError::InvalidRange { .. }));
    }

    // ── HistoryCursor ─────────────────────────────────────────────────────────

    #[test]
    fn previous_starts_at_newest() {
        let h = filled(&["first", "second", "third"]);
        let mut c = HistoryCursor::new();
        assert_eq!(c.previous(&h, "live"), Some("third"));
        assert_eq!(c.previous(&h, "third"), Some("second"));
        assert_eq!(c.previous(&h, "second"), Some("first"));
    }

    #[test]
    fn previous_stops_at_oldest() {
        let h = filled(&["only"]);
        let mut c = HistoryCursor::new();
        c.previous(&h, "live");
        assert_eq!(c.previous(&h, "only"), Some("only"));
        assert_eq!(c.index(), Some(0));
    }

    #[test]
    fn previous_on_empty_history_is_none() {
        let h = HistoryStore::default();
        let mut c = HistoryCursor::new();
        assert_eq!(c.previous(&h, "live"), None);
        assert!(!c.is_navigating());
    }

    #[test]
    fn next_past_newest_restores_backup() {
        let h = filled(&["first", "second"]);
        let mut c = HistoryCursor::new();
        c.previous(&h, "live");
        c.previous(&h, "second");
        assert_eq!(c.next(&h).as_deref(), Some("second"));
        assert_eq!(c.next(&h).as_deref(), Some("live"));
        assert!(!c.is_navigating());
    }

    #[test]
    fn backup_captured_once_per_run() {
        let h = filled(&["first", "second"]);
        let mut c = HistoryCursor::new();
        c.previous(&h, "live");
        // The caller passes the recalled text on later presses; it must not
        // replace the saved live line.
        c.previous(&h, "second");
        c.next(&h);
        assert_eq!(c.next(&h).as_deref(), Some("live"));
    }

    #[test]
    fn next_without_navigation_is_none() {
        let h = filled(&["first"]);
        let mut c = HistoryCursor::new();
        assert_eq!(c.next(&h), None);
    }
}
