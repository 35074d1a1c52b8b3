//! Key decoding: raw terminal bytes → [`Key`] events.
//!
//! ## Key sequence format
//!
//! Keys are stored as raw byte sequences (`Vec<u8>`), exactly as a terminal
//! in raw mode sends them.  Control characters are single bytes (e.g. `\x04`
//! for Ctrl-D); cursor keys are `ESC [ x` (normal mode) or `ESC O x`
//! (application-cursor mode).  The helper [`key_sequence`] converts printable
//! escape notation for tests.

use std::collections::HashMap;

// ── Key ───────────────────────────────────────────────────────────────────────

/// One decoded input event for the line editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Enter: finish the line.
    Submit,
    /// Backspace: delete before the cursor.
    EraseBefore,
    /// Delete: delete under the cursor.
    EraseAt,
    /// Tab.
    Complete,
    /// Up arrow.
    HistoryPrev,
    /// Down arrow.
    HistoryNext,
    CursorLeft,
    CursorRight,
    CursorHome,
    CursorEnd,
    /// Ctrl-D: abandon the session.
    EndOfInput,
    /// A printable character.
    Insert(char),
}

// ── Keymap ────────────────────────────────────────────────────────────────────

/// Maps byte sequences to [`Key`]s.
#[derive(Debug, Default, Clone)]
pub struct Keymap {
    bindings: HashMap<Vec<u8>, Key>,
}

impl Keymap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `sequence` to `key`, replacing any previous binding.
    pub fn bind(&mut self, sequence: Vec<u8>, key: Key) {
        self.bindings.insert(sequence, key);
    }

    pub fn lookup(&self, sequence: &[u8]) -> Option<Key> {
        self.bindings.get(sequence).copied()
    }

    /// `true` if `partial` is a proper prefix of some bound sequence.
    pub fn has_prefix(&self, partial: &[u8]) -> bool {
        self.bindings
            .keys()
            .any(|seq| seq.len() > partial.len() && seq.starts_with(partial))
    }
    /// Populate with the standard bindings for VT100/xterm-style terminals.
    pub fn with_defaults(mut self) -> Self {
        use Key::*;

        let ctrl = |c: char| vec![c as u8 - b'@'];

        self.bind(ctrl('M'), Submit);
        self.bind(ctrl('J'), Submit);
        self.bind(ctrl('I'), Complete);
        self.bind(ctrl('D'), EndOfInput);
        self.bind(ctrl('A'), CursorHome);
        self.bind(ctrl('E'), CursorEnd);
        self.bind(ctrl('B'), CursorLeft);
        self.bind(ctrl('F'), CursorRight);
        self.bind(ctrl('P'), HistoryPrev);
        self.bind(ctrl('N'), HistoryNext);

        // Backspace arrives as DEL on most terminals, C-h on some.
        self.bind(vec![0x7F], EraseBefore);
        self.bind(vec![0x08], EraseBefore);
        self.bind(b"\x1b[3~".to_vec(), EraseAt);

        // Cursor keys: CSI form (normal mode) and SS3 form (application mode).
        for prefix in [b"\x1b[", b"\x1bO"] {
            for (final_byte, key) in [
                (b'A', HistoryPrev),
                (b'B', HistoryNext),
                (b'C', CursorRight),
                (b'D', CursorLeft),
                (b'H', CursorHome),
                (b'F', CursorEnd),
            ] {
                let mut seq = prefix.to_vec();
                seq.push(final_byte);
                self.bind(seq, key);
            }
        }
        self.bind(b"\x1b[1~".to_vec(), CursorHome);
        self.bind(b"\x1b[4~".to_vec(), CursorEnd);
        self.bind(b"\x1b[7~".to_vec(), CursorHome);
        self.bind(b"\x1b[8~".to_vec(), CursorEnd);

        self
    }
}

// ── KeyDecoder ────────────────────────────────────────────────────────────────

/// Accumulates raw bytes and translates them into [`Key`]s by matching
/// against a [`Keymap`].
///
/// Multi-byte escape sequences (e.g. `ESC [ A` for Up Arrow) and UTF-8
/// encoded characters are buffered until complete.  Bytes that can never
/// complete a known sequence are dropped; an unbound CSI or SS3 sequence is
/// dropped whole, up to and including its final byte.
#[derive(Debug, Clone)]
pub struct KeyDecoder {
    buf: Vec<u8>,
    keymap: Keymap,
}

impl KeyDecoder {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            keymap: Keymap::new().with_defaults(),
        }
    }

    /// Push one byte, returning a [`Key`] if a complete sequence was
    /// recognised, or `None` if more bytes are expected or the input was
    /// dropped.
    pub fn push(&mut self, b: u8) -> Option<Key> {
        self.buf.push(b);

        if let Some(key) = self.keymap.lookup(&self.buf) {
            self.buf.clear();
            return Some(key);
        }

        let lead = self.buf[0];
        if self.buf.len() == 1 && (0x20..0x7F).contains(&lead) {
            self.buf.clear();
            return Some(Key::Insert(lead as char));
        }

        if let Some(width) = utf8_width(lead) {
            return self.push_utf8(width);
        }

        if !self.keymap.has_prefix(&self.buf) && !escape_pending(&self.buf) {
            tracing::trace!(bytes = ?self.buf, "dropping unbound key sequence");
            self.buf.clear();
        }
        None
    }

    /// Decode every byte of `bytes`, collecting complete keys.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Key> {
        bytes.iter().filter_map(|&b| self.push(b)).collect()
    }

    /// `true` while part of a sequence is buffered.
    pub fn is_pending(&self) -> bool {
        !self.buf.is_empty()
    }

    fn push_utf8(&mut self, width: usize) -> Option<Key> {
        let last = *self.buf.last()?;
        if self.buf.len() > 1 && last & 0xC0 != 0x80 {
            // Not a continuation byte: drop the broken prefix.
            self.buf.clear();
            return None;
        }
        if self.buf.len() < width {
            return None;
        }
        let decoded = std::str::from_utf8(&self.buf)
            .ok()
            .and_then(|s| s.chars().next())
            .filter(|ch| !ch.is_control());
        self.buf.clear();
        decoded.map(Key::Insert)
    }
}

impl Default for KeyDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Encoded length of a UTF-8 sequence starting with `lead`, for multi-byte
/// leads only.
fn utf8_width(lead: u8) -> Option<usize> {
    match lead {
        0xC2..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF4 => Some(4),
        _ => None,
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Longest unbound escape sequence buffered before it is given up on.
const MAX_ESCAPE_LEN: usize = 16;

/// `true` while `seq` is the unfinished start of an escape sequence, so the
/// rest of it must be swallowed rather than typed.
///
/// CSI (`ESC [`) runs through parameter and intermediate bytes (0x20-0x3F)
/// to a final byte (0x40-0x7E); SS3 (`ESC O`) is always three bytes.
fn escape_pending(seq: &[u8]) -> bool {
    if seq.len() >= MAX_ESCAPE_LEN {
        return false;
    }
    match seq {
        [0x1b] | [0x1b, b'[' | b'O'] => true,
        [0x1b, b'[', .., last] => (0x20..=0x3F).contains(last),
        _ => false,
    }
}

/// Parse a key sequence from a human-readable string.
///
/// Supports `^X` for control characters and `\e` for escape.  Used
/// primarily in tests.
pub fn key_sequence(s: &str) -> Vec<u8> {
    let mut out = Vec::new();
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '^' => {
                if let Some(&next) = chars.peek() {
                    chars.next();
                    if next == '?' {
                        out.push(0x7F);
                    } else {
                        out.push(next.to_ascii_uppercase() as u8 - b'@');
                    }
                }
            }
            '\\' => match chars.next() {
                Some('e' | 'E') => out.push(0x1b),
                Some('n') => out.push(b'\n'),
                Some('r') => out.push(b'\r'),
                Some('t') => out.push(b'\t'),
                Some(c) => {
                    let mut tmp = [0u8; 4];
                    out.extend_from_slice(c.encode_utf8(&mut tmp).as_bytes());
                }
                None => {}
            },
            _ => {
                let mut tmp = [0u8; 4];
                out.extend_from_slice(ch.encode_utf8(&mut tmp).as_bytes());
            }
        }
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(s: &str) -> Vec<Key> {
        KeyDecoder::new().feed(&key_sequence(s))
    }

    // ── Keymap ────────────────────────────────────────────────────────────────

    #[test]
    fn bind_and_lookup() {
        let mut km = Keymap::new();
        km.bind(vec![0x01], Key::CursorHome);
        assert_eq!(km.lookup(&[0x01]), Some(Key::CursorHome));
    }

    #[test]
    fn has_prefix_is_proper_prefix_only() {
        let km = Keymap::new().with_defaults();
        assert!(km.has_prefix(b"\x1b"));
        assert!(km.has_prefix(b"\x1b["));
        assert!(!km.has_prefix(b"\x1b[A"));
    }

    #[test]
    fn default_bindings_have_enter() {
        let km = Keymap::new().with_defaults();
        assert_eq!(km.lookup(b"\r"), Some(Key::Submit));
        assert_eq!(km.lookup(b"\n"), Some(Key::Submit));
    }

    // ── KeyDecoder ────────────────────────────────────────────────────────────

    #[test]
    fn printable_ascii() {
        assert_eq!(decode("aZ ~"), [
            Key::Insert('a'),
            Key::Insert('Z'),
            Key::Insert(' '),
            Key::Insert('~'),
        ]);
    }

    #[test]
    fn control_keys() {
        assert_eq!(decode("\\t^?^H^D"), [
            Key::Complete,
            Key::EraseBefore,
            Key::EraseBefore,
            Key::EndOfInput,
        ]);
    }

    #[test]
    fn up_arrow_three_bytes() {
        let mut kd = KeyDecoder::new();
        assert_eq!(kd.push(0x1B), None);
        assert_eq!(kd.push(b'['), None);
        assert!(kd.is_pending());
        assert_eq!(kd.push(b'A'), Some(Key::HistoryPrev));
        assert!(!kd.is_pending());
    }

    #[test]
    fn arrows_in_both_cursor_modes() {
        assert_eq!(decode("\\e[B\\e[C\\e[D"), [
            Key::HistoryNext,
            Key::CursorRight,
            Key::CursorLeft,
        ]);
        assert_eq!(decode("\\eOA\\eOD"), [Key::HistoryPrev, Key::CursorLeft]);
    }

    #[test]
    fn delete_key_four_bytes() {
        assert_eq!(decode("\\e[3~"), [Key::EraseAt]);
    }

    #[test]
    fn unknown_escape_sequence_is_dropped() {
        assert_eq!(decode("\\e[Zx"), [Key::Insert('x')]);
    }

    #[test]
    fn unbound_csi_sequences_are_swallowed_whole() {
        assert_eq!(decode("\\e[5~"), Vec::<Key>::new());
        assert_eq!(decode("\\e[2~"), Vec::<Key>::new());
        assert_eq!(decode("\\e[15~"), Vec::<Key>::new());
        assert_eq!(decode("\\e[1;5C"), Vec::<Key>::new());
    }

    #[test]
    fn input_after_unbound_sequence_is_kept() {
        assert_eq!(decode("a\\e[1;5Cb\\e[6~c"), [
            Key::Insert('a'),
            Key::Insert('b'),
            Key::Insert('c'),
        ]);
    }

    #[test]
    fn unbound_ss3_sequence_is_three_bytes() {
        assert_eq!(decode("\\eOPx"), [Key::Insert('x')]);
    }

    #[test]
    fn runaway_csi_is_abandoned() {
        let mut kd = KeyDecoder::new();
        kd.feed(b"\x1b[");
        kd.feed(&[b'1'; 32]);
        assert!(kd.buf.len() < MAX_ESCAPE_LEN);
    }

    #[test]
    fn unbound_control_byte_is_ignored() {
        assert_eq!(decode("^Gq"), [Key::Insert('q')]);
    }

    #[test]
    fn utf8_character_is_inserted() {
        assert_eq!(decode("é→"), [Key::Insert('é'), Key::Insert('→')]);
    }

    #[test]
    fn broken_utf8_is_dropped() {
        let mut kd = KeyDecoder::new();
        assert_eq!(kd.feed(&[0xC3, b'a']), Vec::<Key>::new());
        assert_eq!(kd.feed(b"b"), [Key::Insert('b')]);
    }

    // ── key_sequence helper ───────────────────────────────────────────────────

    #[test]
    fn key_sequence_ctrl() {
        assert_eq!(key_sequence("^A"), vec![0x01]);
        assert_eq!(key_sequence("^M"), vec![0x0D]);
        assert_eq!(key_sequence("^?"), vec![0x7F]);
    }

    #[test]
    fn key_sequence_escape() {
        assert_eq!(key_sequence("\\e[A"), b"\x1b[A".to_vec());
    }
}
