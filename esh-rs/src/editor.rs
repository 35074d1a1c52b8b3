//! The line editor's input loop.
//!
//! [`LineReader::read_line`] reads raw bytes, decodes them into [`Key`]s and
//! feeds them to an [`EditSession`], which owns everything that lives for
//! exactly one line: the [`LineBuffer`], the Up/Down [`HistoryCursor`] and
//! the double-Tab tracker.  Every handled key leaves the screen matching the
//! buffer (see [`Renderer::render`]).
//!
//! ## Key handling
//!
//! | Key | Effect |
//! |-----|--------|
//! | Enter | finish the line |
//! | Backspace / Delete | erase before / under the cursor |
//! | Tab | complete the last word; a second Tab lists ambiguous candidates |
//! | Up / Down | walk the history; Down past the newest entry restores the live line |
//! | Left / Right / Home / End | move the cursor |
//! | printable | insert at the cursor |
//! | Ctrl-D | abandon the session without a line |

use std::io::{self, Read, Write};

use crate::completion::{Completer, Completion};
use crate::history::{HistoryCursor, HistoryStore};
use crate::input::LineBuffer;
use crate::keybind::{Key, KeyDecoder};
use crate::terminal::Renderer;

// ── ReadOutcome ───────────────────────────────────────────────────────────────

/// How a call to [`LineReader::read_line`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Enter was pressed; the finished line, untrimmed.
    Line(String),
    /// Ctrl-D was pressed or input ran out.
    EndOfInput,
}

// ── TabPress ──────────────────────────────────────────────────────────────────

/// Whether the last key handled was a Tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TabPress {
    #[default]
    FirstPress,
    RepeatPress,
}

// ── EditSession ───────────────────────────────────────────────────────────────

/// State for one line being edited.
#[derive(Debug, Clone, Default)]
pub struct EditSession {
    buffer: LineBuffer,
    recall: HistoryCursor,
    tab: TabPress,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> &LineBuffer {
        &self.buffer
    }

    pub fn recall(&self) -> &HistoryCursor {
        &self.recall
    }

    pub fn tab(&self) -> TabPress {
        self.tab
    }

    /// Apply one key.  Returns `Some` when the key ends the line.
    pub fn handle<C, W>(
        &mut self,
        key: Key,
        history: &HistoryStore,
        completer: &C,
        renderer: &mut Renderer<W>,
    ) -> io::Result<Option<ReadOutcome>>
    where
        C: Completer + ?Sized,
        W: Write,
    {
        let tab = std::mem::take(&mut self.tab);

        match key {
            Key::Submit => {
                renderer.finish_line()?;
                let line = self.buffer.take_line();
                self.recall.reset();
                return Ok(Some(ReadOutcome::Line(line)));
            }
            Key::EndOfInput => {
                renderer.finish_line()?;
                return Ok(Some(ReadOutcome::EndOfInput));
            }
            Key::EraseBefore => {
                if self.buffer.delete_before() {
                    renderer.render(&self.buffer)?;
                }
            }
            Key::EraseAt => {
                if self.buffer.delete_at() {
                    renderer.render(&self.buffer)?;
                }
            }
            Key::Complete => {
                self.complete(tab, completer, renderer)?;
                self.tab = TabPress::RepeatPress;
            }
            Key::HistoryPrev => {
                let current = self.buffer.text();
                if let Some(entry) = self.recall.previous(history, &current) {
                    self.buffer.set_text(entry);
                    renderer.render(&self.buffer)?;
                }
            }
            Key::HistoryNext => {
                if let Some(text) = self.recall.next(history) {
                    self.buffer.set_text(&text);
                    renderer.render(&self.buffer)?;
                }
            }
            Key::CursorLeft => {
                if self.buffer.move_left() {
                    renderer.render(&self.buffer)?;
                }
            }
            Key::CursorRight => {
                if self.buffer.move_right() {
                    renderer.render(&self.buffer)?;
                }
            }
            Key::CursorHome => {
                self.buffer.move_home();
                renderer.render(&self.buffer)?;
            }
            Key::CursorEnd => {
                self.buffer.move_end();
                renderer.render(&self.buffer)?;
            }
            Key::Insert(ch) => {
                self.buffer.insert(ch);
                renderer.render(&self.buffer)?;
            }
        }
        Ok(None)
    }

    fn complete<C, W>(&mut self, tab: TabPress, completer: &C, renderer: &mut Renderer<W>) -> io::Result<()>
    where
        C: Completer + ?Sized,
        W: Write,
    {
        let word = self.buffer.last_word();
        match (tab, Completion::from_candidates(completer.complete(&word))) {
            (TabPress::RepeatPress, Completion::Ambiguous(candidates)) => {
                renderer.show_candidates(&candidates, &self.buffer)
            }
            (_, Completion::Unique(candidate)) => {
                self.buffer.replace_from(self.buffer.last_word_start(), &candidate);
                renderer.render(&self.buffer)
            }
            _ => renderer.alert(),
        }
    }
}

// ── LineReader ────────────────────────────────────────────────────────────────

/// Reads finished lines from a raw-mode byte stream.
pub struct LineReader<C, W: Write> {
    decoder: KeyDecoder,
    completer: C,
    renderer: Renderer<W>,
}

impl<C: Completer, W: Write> LineReader<C, W> {
    pub fn new(completer: C, renderer: Renderer<W>) -> Self {
        Self {
            decoder: KeyDecoder::new(),
            completer,
            renderer,
        }
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer<W> {
        &mut self.renderer
    }

    /// Show the prompt and edit one line.
    ///
    /// Blocks on `input` one byte at a time.  End of stream counts as
    /// [`ReadOutcome::EndOfInput`].
    pub fn read_line<R: Read>(&mut self, input: &mut R, history: &HistoryStore) -> io::Result<ReadOutcome> {
        self.renderer.start_line()?;
        let mut session = EditSession::new();
        let mut byte = [0u8; 1];
        loop {
            match input.read(&mut byte) {
                Ok(0) => {
                    self.renderer.finish_line()?;
                    return Ok(ReadOutcome::EndOfInput);
                }
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
            let Some(key) = self.decoder.push(byte[0]) else {
                continue;
            };
            tracing::trace!(?key, "key");
            if let Some(outcome) = session.handle(key, history, &self.completer, &mut self.renderer)? {
                return Ok(outcome);
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keybind::key_sequence;

    /// Completer with a fixed candidate list, filtered by prefix.
    struct Fixed(Vec<&'static str>);

    impl Completer for Fixed {
        fn complete(&self, prefix: &str) -> Vec<String> {
            self.0
                .iter()
                .filter(|c| c.starts_with(prefix))
                .map(|c| (*c).to_owned())
                .collect()
        }
    }

    struct Harness {
        session: EditSession,
        history: HistoryStore,
        completer: Fixed,
        renderer: Renderer<Vec<u8>>,
        outcome: Option<ReadOutcome>,
    }

    impl Harness {
        fn new(history: &[&str], candidates: Vec<&'static str>) -> Self {
            Self {
                session: EditSession::new(),
                history: HistoryStore::from_entries(history.iter().copied()),
                completer: Fixed(candidates),
                renderer: Renderer::new(Vec::new(), "$ "),
                outcome: None,
            }
        }

        fn keys(&mut self, s: &str) -> &mut Self {
            for key in KeyDecoder::new().feed(&key_sequence(s)) {
                let out = self
                    .session
                    .handle(key, &self.history, &self.completer, &mut self.renderer)
                    .unwrap();
                if out.is_some() {
                    self.outcome = out;
                }
            }
            self
        }

        fn text(&self) -> String {
            self.session.buffer().text()
        }

        fn cursor(&self) -> usize {
            self.session.buffer().cursor()
        }

        fn output(&self) -> String {
            String::from_utf8_lossy(self.renderer.get_ref()).into_owned()
        }
    }

    // ── Editing ───────────────────────────────────────────────────────────────

    #[test]
    fn typing_builds_line() {
        let mut h = Harness::new(&[], vec![]);
        h.keys("echo hi");
        assert_eq!(h.text(), "echo hi");
        assert_eq!(h.cursor(), 7);
    }

    #[test]
    fn left_then_backspace() {
        let mut h = Harness::new(&[], vec![]);
        h.keys("ls\\e[D");
        assert_eq!(h.cursor(), 1);
        h.keys("^?");
        assert_eq!(h.text(), "s");
        assert_eq!(h.cursor(), 0);
    }

    #[test]
    fn delete_under_cursor() {
        let mut h = Harness::new(&[], vec![]);
        h.keys("abc^A\\e[3~");
        assert_eq!(h.text(), "bc");
        assert_eq!(h.cursor(), 0);
    }

    #[test]
    fn backspace_at_start_is_a_no_op() {
        let mut h = Harness::new(&[], vec![]);
        h.keys("x^A");
        let before = h.output();
        h.keys("^?");
        assert_eq!(h.text(), "x");
        assert_eq!(h.output(), before);
    }

    #[test]
    fn submit_returns_line_and_resets() {
        let mut h = Harness::new(&[], vec![]);
        h.keys("pwd\r");
        assert_eq!(h.outcome, Some(ReadOutcome::Line("pwd".into())));
        assert!(h.session.buffer().is_empty());
    }

    #[test]
    fn ctrl_d_ends_input() {
        let mut h = Harness::new(&[], vec![]);
        h.keys("ls^D");
        assert_eq!(h.outcome, Some(ReadOutcome::EndOfInput));
    }

    // ── Completion ────────────────────────────────────────────────────────────

    #[test]
    fn unique_completion_replaces_word() {
        let mut h = Harness::new(&[], vec!["echo", "exit"]);
        h.keys("ec\\t");
        assert_eq!(h.text(), "echo");
        assert_eq!(h.cursor(), 4);
    }

    #[test]
    fn completion_of_full_match_is_unchanged() {
        let mut h = Harness::new(&[], vec!["echo"]);
        h.keys("echo\\t");
        assert_eq!(h.text(), "echo");
    }

    #[test]
    fn completion_only_touches_last_word() {
        let mut h = Harness::new(&[], vec!["notes.txt"]);
        h.keys("cat no\\t");
        assert_eq!(h.text(), "cat notes.txt");
    }

    #[test]
    fn first_tab_on_ambiguous_rings_bell() {
        let mut h = Harness::new(&[], vec!["cat", "cd"]);
        h.keys("c\\t");
        assert_eq!(h.text(), "c");
        assert!(h.output().ends_with('\x07'));
        assert_eq!(h.session.tab(), TabPress::RepeatPress);
    }

    #[test]
    fn double_tab_lists_candidates_once() {
        let mut h = Harness::new(&[], vec!["cat", "cd"]);
        h.keys("c\\t\\t");
        let out = h.output();
        assert_eq!(out.matches("cat").count(), 1);
        assert_eq!(out.matches("cd").count(), 1);
        assert!(out.ends_with("\r\ncat  cd\r\n$ c"));
        assert_eq!(h.text(), "c");
    }

    #[test]
    fn edit_between_tabs_is_not_double_tab() {
        let mut h = Harness::new(&[], vec!["cat", "cd"]);
        h.keys("c\\tx^?\\t");
        assert!(!h.output().contains("cat  cd"));
    }

    #[test]
    fn no_candidates_rings_bell() {
        let mut h = Harness::new(&[], vec!["cat"]);
        h.keys("zz\\t");
        assert_eq!(h.text(), "zz");
        assert!(h.output().ends_with('\x07'));
    }

    // ── History ───────────────────────────────────────────────────────────────

    #[test]
    fn up_recalls_newest() {
        let mut h = Harness::new(&["pwd", "ls"], vec![]);
        h.keys("\\e[A");
        assert_eq!(h.text(), "ls");
        h.keys("\\e[A");
        assert_eq!(h.text(), "pwd");
        h.keys("\\e[A");
        assert_eq!(h.text(), "pwd");
    }

    #[test]
    fn up_then_down_restores_live_line() {
        let mut h = Harness::new(&["pwd", "ls"], vec![]);
        h.keys("ec^B");
        h.keys("\\e[A\\e[B");
        assert_eq!(h.text(), "ec");
        assert_eq!(h.cursor(), 2);
        assert!(!h.session.recall().is_navigating());
    }

    #[test]
    fn down_walks_forward() {
        let mut h = Harness::new(&["a", "b", "c"], vec![]);
        h.keys("\\e[A\\e[A\\e[A\\e[B");
        assert_eq!(h.text(), "b");
    }

    #[test]
    fn down_without_navigation_is_ignored() {
        let mut h = Harness::new(&["a"], vec![]);
        h.keys("x\\e[B");
        assert_eq!(h.text(), "x");
    }

    #[test]
    fn up_with_empty_history_is_ignored() {
        let mut h = Harness::new(&[], vec![]);
        h.keys("x\\e[A");
        assert_eq!(h.text(), "x");
    }

    // ── LineReader ────────────────────────────────────────────────────────────

    #[test]
    fn read_line_from_bytes() {
        let mut reader = LineReader::new(Fixed(vec![]), Renderer::new(Vec::new(), "$ "));
        let history = HistoryStore::default();
        let mut input: &[u8] = b"ls -l\rpwd\r";
        assert_eq!(
            reader.read_line(&mut input, &history).unwrap(),
            ReadOutcome::Line("ls -l".into())
        );
        assert_eq!(
            reader.read_line(&mut input, &history).unwrap(),
            ReadOutcome::Line("pwd".into())
        );
        assert_eq!(reader.read_line(&mut input, &history).unwrap(), ReadOutcome::EndOfInput);
    }
}
