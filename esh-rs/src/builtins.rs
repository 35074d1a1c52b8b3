//! Built-in commands: `echo`, `type`, `pwd`, `cd`, `ls`, `cat`, `history`,
//! `exit`.
//!
//! Each builtin writes its normal output to [`Context::out`] (the terminal
//! or a redirection target) and diagnostics to [`Context::err`], which is
//! never redirected.  Failures are reported and the shell carries on; only
//! an I/O error on the streams themselves is returned.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::completion::list_dir;
use crate::history::HistoryStore;
use crate::parse::CommandLine;

// ── Builtin ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    History,
    Cat,
    Ls,
    Echo,
    Type,
    Exit,
    Pwd,
    Cd,
}

impl Builtin {
    /// All builtins, in the order completion offers them.
    pub const ALL: &'static [Builtin] = &[
        Builtin::History,
        Builtin::Cat,
        Builtin::Ls,
        Builtin::Echo,
        Builtin::Type,
        Builtin::Exit,
        Builtin::Pwd,
        Builtin::Cd,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::History => "history",
            Builtin::Cat => "cat",
            Builtin::Ls => "ls",
            Builtin::Echo => "echo",
            Builtin::Type => "type",
            Builtin::Exit => "exit",
            Builtin::Pwd => "pwd",
            Builtin::Cd => "cd",
        }
    }

    /// Exact, case-sensitive lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|b| b.name() == name)
    }

    /// Every builtin name, for completion.
    pub fn names() -> impl Iterator<Item = &'static str> {
        Self::ALL.iter().map(|b| b.name())
    }
}

// ── Flow ──────────────────────────────────────────────────────────────────────

/// What the shell does after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit(i32),
}

// ── Context ───────────────────────────────────────────────────────────────────

/// Everything a builtin may touch.
pub struct Context<'a> {
    pub history: &'a HistoryStore,
    pub out: &'a mut dyn Write,
    pub err: &'a mut dyn Write,
    /// Target of a bare `cd` and of `~`.
    pub home: Option<PathBuf>,
}

// ── Dispatch ──────────────────────────────────────────────────────────────────

/// Run `cmd`.  Unknown names print `<name>: command not found`.
pub fn run(cmd: &CommandLine, ctx: &mut Context<'_>) -> io::Result<Flow> {
    let Some(builtin) = Builtin::from_name(&cmd.name) else {
        writeln!(ctx.err, "{}: command not found", cmd.name)?;
        return Ok(Flow::Continue);
    };
    tracing::debug!(command = builtin.name(), args = ?cmd.args, "builtin");
    let args = &cmd.args;
    match builtin {
        Builtin::Echo => writeln!(ctx.out, "{}", args.join(" "))?,
        Builtin::Type => type_of(args, ctx)?,
        Builtin::Pwd => pwd(ctx)?,
        Builtin::Cd => cd(args, ctx)?,
        Builtin::Ls => ls(args, ctx)?,
        Builtin::Cat => cat(args, ctx)?,
        Builtin::History => history(args, ctx)?,
        Builtin::Exit => return exit(args, ctx),
    }
    Ok(Flow::Continue)
}

fn type_of(args: &[String], ctx: &mut Context<'_>) -> io::Result<()> {
    for name in args {
        if Builtin::from_name(name).is_some() {
            writeln!(ctx.out, "{name} is a shell builtin")?;
        } else {
            writeln!(ctx.out, "{name}: not found")?;
        }
    }
    Ok(())
}

fn pwd(ctx: &mut Context<'_>) -> io::Result<()> {
    match std::env::current_dir() {
        Ok(dir) => writeln!(ctx.out, "{}", dir.display()),
        Err(e) => writeln!(ctx.err, "pwd: {}", describe(&e)),
    }
}

fn cd(args: &[String], ctx: &mut Context<'_>) -> io::Result<()> {
    if args.len() > 1 {
        return writeln!(ctx.err, "cd: too many arguments");
    }
    let target = match cd_target(args.first().map(String::as_str), ctx.home.as_deref()) {
        Ok(t) => t,
        Err(msg) => return writeln!(ctx.err, "cd: {msg}"),
    };
    if let Err(e) = std::env::set_current_dir(&target) {
        writeln!(ctx.err, "cd: {}: {}", target.display(), describe(&e))?;
    }
    Ok(())
}

/// Resolve the argument of `cd`: none or `~` is home, `~/x` is under home.
fn cd_target(arg: Option<&str>, home: Option<&Path>) -> Result<PathBuf, String> {
    let home_dir = || home.map(Path::to_path_buf).ok_or_else(|| "HOME not set".to_owned());
    match arg {
        None | Some("~") => home_dir(),
        Some(p) => match p.strip_prefix("~/") {
            Some(rest) => Ok(home_dir()?.join(rest)),
            None => Ok(PathBuf::from(p)),
        },
    }
}

fn ls(args: &[String], ctx: &mut Context<'_>) -> io::Result<()> {
    let dirs: Vec<&str> = if args.is_empty() {
        vec!["."]
    } else {
        args.iter().map(String::as_str).collect()
    };
    let headed = dirs.len() > 1;
    for (i, dir) in dirs.iter().enumerate() {
        match list_dir(Path::new(dir)) {
            Ok(names) => {
                if headed {
                    if i > 0 {
                        writeln!(ctx.out)?;
                    }
                    writeln!(ctx.out, "{dir}:")?;
                }
                for name in names {
                    writeln!(ctx.out, "{name}")?;
                }
            }
            Err(e) => writeln!(ctx.err, "ls: {dir}: {}", describe(&e))?,
        }
    }
    Ok(())
}

fn cat(args: &[String], ctx: &mut Context<'_>) -> io::Result<()> {
    if args.is_empty() {
        return writeln!(ctx.err, "cat: missing file operand");
    }
    for file in args {
        match std::fs::read(file) {
            Ok(bytes) => ctx.out.write_all(&bytes)?,
            Err(e) => writeln!(ctx.err, "cat: {file}: {}", describe(&e))?,
        }
    }
    Ok(())
}

fn history(args: &[String], ctx: &mut Context<'_>) -> io::Result<()> {
    if args.len() > 1 {
        return writeln!(ctx.err, "history: too many arguments");
    }
    match ctx.history.slice_arg(args.first().map(String::as_str)) {
        Ok(entries) => {
            for entry in entries {
                writeln!(ctx.out, "{entry}")?;
            }
            Ok(())
        }
        Err(e) => writeln!(ctx.err, "{e}"),
    }
}

fn exit(args: &[String], ctx: &mut Context<'_>) -> io::Result<Flow> {
    let Some(arg) = args.first() else {
        return Ok(Flow::Exit(0));
    };
    match arg.parse::<i32>() {
        Ok(code) => Ok(Flow::Exit(code)),
        Err(_) => {
            writeln!(ctx.err, "exit: {arg}: numeric argument required")?;
            Ok(Flow::Continue)
        }
    }
}

/// The message a user expects for common I/O failures.
pub fn describe(e: &io::Error) -> String {
    match e.kind() {
        io::ErrorKind::NotFound => "No such file or directory".to_owned(),
        io::ErrorKind::PermissionDenied => "Permission denied".to_owned(),
        _ => e.to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
