#![allow(dead_code)]

use esh::completion::Completer;

/// Interprets the subset of terminal output the renderer emits (printable
/// text, `\r`, `\n`, BEL, `ESC [ n C`, `ESC [ n D`, `ESC [ K`) into a grid
/// of rows.  Every character is one cell.
#[derive(Debug, Default)]
pub struct VirtualTerminal {
    rows: Vec<Vec<char>>,
    row: usize,
    col: usize,
}

impl VirtualTerminal {
    pub fn new() -> Self {
        Self {
            rows: vec![Vec::new()],
            row: 0,
            col: 0,
        }
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        let text = String::from_utf8_lossy(bytes);
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\r' => self.col = 0,
                '\n' => {
                    self.row += 1;
                    if self.rows.len() <= self.row {
                        self.rows.push(Vec::new());
                    }
                }
                '\x07' => {}
                '\x1b' => {
                    assert_eq!(chars.next(), Some('['), "only CSI sequences are expected");
                    let mut digits = String::new();
                    while let Some(d) = chars.next_if(|c| c.is_ascii_digit()) {
                        digits.push(d);
                    }
                    let n: usize = if digits.is_empty() { 1 } else { digits.parse().unwrap() };
                    match chars.next() {
                        Some('C') => self.col += n,
                        Some('D') => {
                            assert!(n <= self.col, "cursor moved left past column 0");
                            self.col -= n;
                        }
                        Some('K') => self.rows[self.row].truncate(self.col),
                        other => panic!("unexpected CSI final {other:?}"),
                    }
                }
                c => self.put(c),
            }
        }
    }

    fn put(&mut self, c: char) {
        let line = &mut self.rows[self.row];
        while line.len() < self.col {
            line.push(' ');
        }
        if self.col < line.len() {
            line[self.col] = c;
        } else {
            line.push(c);
        }
        self.col += 1;
    }

    /// Text of the row holding the cursor.
    pub fn current_line(&self) -> String {
        self.rows[self.row].iter().collect()
    }

    pub fn cursor_col(&self) -> usize {
        self.col
    }

    pub fn lines(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.iter().collect()).collect()
    }
}

/// Completer that returns a fixed list filtered by prefix.
pub struct Fixed(pub Vec<&'static str>);

impl Completer for Fixed {
    fn complete(&self, prefix: &str) -> Vec<String> {
        self.0
            .iter()
            .filter(|c| c.starts_with(prefix))
            .map(|c| (*c).to_owned())
            .collect()
    }
}
