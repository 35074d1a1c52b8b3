//! Line buffer: the text being edited and the cursor within it.
//!
//! ## Design
//!
//! The buffer is a `Vec<char>` so that cursor movement and editing work in
//! Unicode characters rather than bytes.  [`LineBuffer::cursor`] is always a
//! valid char index (`0..=buffer.len()`); every mutating operation keeps it
//! there, which is why the cursor is not a public field.

// ── LineBuffer ────────────────────────────────────────────────────────────────

/// The in-progress command line and its cursor.
///
/// All positions are in Unicode scalar values (chars), not bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineBuffer {
    buffer: Vec<char>,
    /// Cursor position (0 = before first char, `buffer.len()` = after last).
    pos: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Buffer access ─────────────────────────────────────────────────────────

    /// Current content as an owned `String`.
    pub fn text(&self) -> String {
        self.buffer.iter().collect()
    }

    /// The buffer contents as a char slice.
    pub fn chars(&self) -> &[char] {
        &self.buffer
    }

    /// Number of characters in the buffer.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.pos
    }

    /// Consume and return the buffer contents, resetting to empty.
    pub fn take_line(&mut self) -> String {
        let line = self.text();
        self.buffer.clear();
        self.pos = 0;
        line
    }

    /// Replace the entire buffer with `text`, placing the cursor at the end.
    pub fn set_text(&mut self, text: &str) {
        self.buffer = text.chars().collect();
        self.pos = self.buffer.len();
    }

    // ── Insertion ─────────────────────────────────────────────────────────────

    /// Insert `ch` at the cursor, advancing the cursor.
    pub fn insert(&mut self, ch: char) {
        self.buffer.insert(self.pos, ch);
        self.pos += 1;
    }

    /// Insert `s` at the cursor, advancing the cursor by `s.chars().count()`.
    pub fn insert_str(&mut self, s: &str) {
        for ch in s.chars() {
            self.insert(ch);
        }
    }

    /// Truncate the buffer at `pos` and append `text`; the cursor moves to
    /// the new end.  `pos` past the end is clamped.
    pub fn replace_from(&mut self, pos: usize, text: &str) {
        let pos = pos.min(self.buffer.len());
        self.buffer.truncate(pos);
        self.buffer.extend(text.chars());
        self.pos = self.buffer.len();
    }

    // ── Deletion ──────────────────────────────────────────────────────────────

    /// Delete the character immediately before the cursor (backspace).
    /// Returns `true` if a character was deleted.
    pub fn delete_before(&mut self) -> bool {
        if self.pos == 0 {
            return false;
        }
        self.pos -= 1;
        self.buffer.remove(self.pos);
        true
    }

    /// Delete the character under the cursor (forward delete).
    /// Returns `true` if a character was deleted.
    pub fn delete_at(&mut self) -> bool {
        if self.pos >= self.buffer.len() {
            return false;
        }
        self.buffer.remove(self.pos);
        true
    }

    // ── Cursor movement ───────────────────────────────────────────────────────

    /// Move the cursor one character left.  Returns `false` at the start.
    pub fn move_left(&mut self) -> bool {
        if self.pos == 0 {
            return false;
        }
        self.pos -= 1;
        true
    }

    /// Move the cursor one character right.  Returns `false` at the end.
    pub fn move_right(&mut self) -> bool {
        if self.pos >= self.buffer.len() {
            return false;
        }
        self.pos += 1;
        true
    }

    pub fn move_home(&mut self) {
        self.pos = 0;
    }

    pub fn move_end(&mut self) {
        self.pos = self.buffer.len();
    }

    /// Move the cursor to an absolute position, clamped to `[0, len]`.
    pub fn set_cursor(&mut self, pos: usize) {
        self.pos = pos.min(self.buffer.len());
    }

    // ── Words ─────────────────────────────────────────────────────────────────

    /// Index of the first char after the last whitespace in the buffer, or 0
    /// when the buffer has no whitespace.
    pub fn last_word_start(&self) -> usize {
        self.buffer
            .iter()
            .rposition(|c| c.is_whitespace())
            .map_or(0, |i| i + 1)
    }

    /// The word that Tab completes: everything after the last whitespace.
    pub fn last_word(&self) -> String {
        self.buffer[self.last_word_start()..].iter().collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
