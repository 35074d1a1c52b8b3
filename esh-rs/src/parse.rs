//! Submitted-line parsing: quoting and output redirection.
//!
//! A line is split into words on unquoted whitespace:
//!
//! * `'…'` keeps everything literally;
//! * `"…"` keeps everything except `\"` and `\\`, which lose the backslash;
//! * an unquoted `\x` is a literal `x`.
//!
//! The unquoted operators `>`, `1>` (overwrite) and `>>`, `1>>` (append)
//! redirect standard output.  The operator may stand alone or be glued to
//! its target (`>out.txt`), and must be the last thing on the line apart
//! from the target.

use std::iter::Peekable;
use std::path::PathBuf;
use std::str::Chars;

// ── Types ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectMode {
    Overwrite,
    Append,
}

/// Where standard output goes: `(target, mode)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectionDirective {
    pub target: PathBuf,
    pub mode: RedirectMode,
}

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub name: String,
    pub args: Vec<String>,
    pub redirect: Option<RedirectionDirective>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected EOF while looking for matching `{0}'")]
    UnterminatedQuote(char),
    #[error("syntax error near unexpected token `newline'")]
    MissingTarget,
    #[error("syntax error near unexpected token `{0}'")]
    TrailingTokens(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Redirect(RedirectMode),
}

// ── Tokenizer ─────────────────────────────────────────────────────────────────

/// Split `line` into words and redirection operators.
fn tokenize(line: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut cur = String::new();
    // A word may be empty but present (`''`), so track it separately.
    let mut in_word = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => cur.push(c),
                        None => return Err(ParseError::UnterminatedQuote('\'')),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') if matches!(chars.peek(), Some('"' | '\\')) => {
                            if let Some(c) = chars.next() {
                                cur.push(c);
                            }
                        }
                        Some(c) => cur.push(c),
                        None => return Err(ParseError::UnterminatedQuote('"')),
                    }
                }
            }
            '\\' => {
                in_word = true;
                if let Some(c) = chars.next() {
                    cur.push(c);
                }
            }
            c if c.is_whitespace() => {
                if in_word {
                    tokens.push(Token::Word(std::mem::take(&mut cur)));
                    in_word = false;
                }
            }
            '>' => {
                if in_word {
                    tokens.push(Token::Word(std::mem::take(&mut cur)));
                    in_word = false;
                }
                tokens.push(Token::Redirect(redirect_mode(&mut chars)));
            }
            '1' if !in_word && chars.peek() == Some(&'>') => {
                chars.next();
                tokens.push(Token::Redirect(redirect_mode(&mut chars)));
            }
            c => {
                in_word = true;
                cur.push(c);
            }
        }
    }
    if in_word {
        tokens.push(Token::Word(cur));
    }
    Ok(tokens)
}

/// Called just after a `>`: a second `>` makes it an append.
fn redirect_mode(chars: &mut Peekable<Chars<'_>>) -> RedirectMode {
    if chars.next_if_eq(&'>').is_some() {
        RedirectMode::Append
    } else {
        RedirectMode::Overwrite
    }
}

// ── Parser ────────────────────────────────────────────────────────────────────

/// Parse a submitted line.  Returns `Ok(None)` when it holds no words.
pub fn parse(line: &str) -> Result<Option<CommandLine>, ParseError> {
    let mut words: Vec<String> = Vec::new();
    let mut redirect: Option<RedirectionDirective> = None;
    let mut tokens = tokenize(line)?.into_iter();

    while let Some(token) = tokens.next() {
        match token {
            Token::Word(w) => {
                if redirect.is_some() {
                    return Err(ParseError::TrailingTokens(w));
                }
                words.push(w);
            }
            Token::Redirect(mode) => {
                if redirect.is_some() {
                    return Err(ParseError::TrailingTokens(operator(mode).to_owned()));
                }
                match tokens.next() {
                    Some(Token::Word(target)) => {
                        redirect = Some(RedirectionDirective {
                            target: PathBuf::from(target),
                            mode,
                        });
                    }
                    Some(Token::Redirect(next)) => {
                        return Err(ParseError::TrailingTokens(operator(next).to_owned()))
                    }
                    None => return Err(ParseError::MissingTarget),
                }
            }
        }
    }

    let mut words = words.into_iter();
    let Some(name) = words.next() else {
        return match redirect {
            // `> file` with no command.
            Some(_) => Err(ParseError::MissingTarget),
            None => Ok(None),
        };
    };
    Ok(Some(CommandLine {
        name,
        args: words.collect(),
        redirect,
    }))
}

fn operator(mode: RedirectMode) -> &'static str {
    match mode {
        RedirectMode::Overwrite => ">",
        RedirectMode::Append => ">>",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
