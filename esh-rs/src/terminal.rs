//! Terminal rendering for the input line.
//!
//! ## Architecture
//!
//! [`Renderer`] remembers what it last put on the screen after the prompt
//! (the text and the column the terminal cursor sits in).  Each
//! [`Renderer::render`] call diffs that against the [`LineBuffer`] and emits
//! one short crossterm command sequence:
//!
//! * unchanged text: a relative cursor move only;
//! * changed text: move to the first differing character, print the new
//!   tail, erase to end of line if the new text is narrower, then move back
//!   to the logical cursor.
//!
//! All movement is relative to the current column, so the line can start
//! anywhere on the row (after whatever the prompt printed).  Column math uses
//! display width, so wide characters take two cells.
//!
//! The renderer writes to any [`Write`]; tests pass a `Vec<u8>` and inspect
//! the bytes.

use std::io::{self, Write};

use crossterm::{
    cursor, queue,
    style::Print,
    terminal::{self, ClearType},
};
use unicode_width::UnicodeWidthChar;

use crate::input::LineBuffer;

// ── Renderer ──────────────────────────────────────────────────────────────────

pub struct Renderer<W: Write> {
    out: W,
    prompt: String,
    /// Ring the bell on [`Renderer::alert`].
    pub bell: bool,
    /// Text currently displayed after the prompt.
    shown: Vec<char>,
    /// Terminal cursor position, as a char index into `shown`.
    col: usize,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W, prompt: impl Into<String>) -> Self {
        Self {
            out,
            prompt: prompt.into(),
            bell: true,
            shown: Vec::new(),
            col: 0,
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.out
    }

    /// The text the renderer believes is on screen after the prompt.
    pub fn shown(&self) -> &[char] {
        &self.shown
    }

    // ── Line lifecycle ────────────────────────────────────────────────────────

    /// Print the prompt for a new, empty line.
    pub fn start_line(&mut self) -> io::Result<()> {
        self.shown.clear();
        self.col = 0;
        queue!(self.out, Print(&self.prompt))?;
        self.out.flush()
    }

    /// Leave the cursor at the start of the next row after a submitted line.
    pub fn finish_line(&mut self) -> io::Result<()> {
        self.move_cursor(self.shown.len())?;
        queue!(self.out, Print("\r\n"))?;
        self.shown.clear();
        self.col = 0;
        self.out.flush()
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    /// Bring the screen in line with `buf` using the smallest diff.
    pub fn render(&mut self, buf: &LineBuffer) -> io::Result<()> {
        let new = buf.chars();
        if new != self.shown.as_slice() {
            let common = self
                .shown
                .iter()
                .zip(new)
                .take_while(|(a, b)| a == b)
                .count();
            self.move_cursor(common)?;

            let tail: String = new[common..].iter().collect();
            if !tail.is_empty() {
                queue!(self.out, Print(&tail))?;
            }
            if display_width(new) < display_width(&self.shown) {
                queue!(self.out, terminal::Clear(ClearType::UntilNewLine))?;
            }
            self.shown = new.to_vec();
            self.col = self.shown.len();
        }
        self.move_cursor(buf.cursor())?;
        self.out.flush()
    }

    /// Print `candidates` on their own row below the line, then draw the
    /// prompt and `buf` again on a fresh row with the cursor restored.
    pub fn show_candidates(&mut self, candidates: &[String], buf: &LineBuffer) -> io::Result<()> {
        self.move_cursor(self.shown.len())?;
        queue!(
            self.out,
            Print("\r\n"),
            Print(candidates.join("  ")),
            Print("\r\n")
        )?;
        self.shown.clear();
        self.col = 0;
        queue!(self.out, Print(&self.prompt))?;
        self.render(buf)
    }

    /// Signal a failed action (no completion) with the terminal bell.
    pub fn alert(&mut self) -> io::Result<()> {
        if self.bell {
            queue!(self.out, Print('\x07'))?;
        }
        self.out.flush()
    }

    // ── Internal ──────────────────────────────────────────────────────────────

    /// Move the terminal cursor from `self.col` to char index `to` of the
    /// displayed text.
    fn move_cursor(&mut self, to: usize) -> io::Result<()> {
        let to = to.min(self.shown.len());
        if to < self.col {
            let cols = display_width(&self.shown[to..self.col]);
            if cols > 0 {
                queue!(self.out, cursor::MoveLeft(clamp_u16(cols)))?;
            }
        } else if to > self.col {
            let cols = display_width(&self.shown[self.col..to]);
            if cols > 0 {
                queue!(self.out, cursor::MoveRight(clamp_u16(cols)))?;
            }
        }
        self.col = to;
        Ok(())
    }
}

// ── RawModeGuard ──────────────────────────────────────────────────────────────

/// RAII guard: disables raw mode when dropped.
#[derive(Debug)]
pub struct RawModeGuard(());

impl RawModeGuard {
    /// Enable raw mode.  The returned guard disables it on drop.
    pub fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(RawModeGuard(()))
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// `true` when both stdin and stdout are terminals.
pub fn is_interactive() -> bool {
    // SAFETY: isatty only inspects the descriptor.
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 && libc::isatty(libc::STDOUT_FILENO) != 0 }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Terminal columns occupied by `chars`.
pub fn display_width(chars: &[char]) -> usize {
    chars.iter().map(|&c| c.width().unwrap_or(0)).sum()
}

fn clamp_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
