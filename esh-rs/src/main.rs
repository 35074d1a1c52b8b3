use std::io::{self, Write};
use std::path::Path;

use esh::cli::{self, RcFile};
use esh::completion::CompletionProvider;
use esh::config::{self, Config, Settings};
use esh::editor::LineReader;
use esh::history::HistoryStore;
use esh::logging;
use esh::shell::Shell;
use esh::terminal::{self, Renderer};

fn main() {
    let args = cli::parse_args();

    logging::init(config::log_dir().as_deref());

    // ── Load rc file ──────────────────────────────────────────────────────────
    let rc = match args.rc_file() {
        None | Some(RcFile::Skip) => Config::default(),
        Some(RcFile::Default(path)) => load_rc(&path, false),
        Some(RcFile::Explicit(path)) => load_rc(&path, true),
    };
    let settings = Settings::resolve(&args, &rc);

    // ── Load history ──────────────────────────────────────────────────────────
    let mut history = HistoryStore::with_file(settings.history_file.clone());
    if let Err(e) = history.create_parent_dir() {
        tracing::warn!(error = %e, "history directory not created");
    }
    match history.load() {
        Ok(n) => tracing::debug!(entries = n, path = %settings.history_file.display(), "history loaded"),
        Err(e) => {
            tracing::warn!(error = %e, "history load failed");
            eprintln!("esh: {e}");
        }
    }

    // ── Run ───────────────────────────────────────────────────────────────────
    let interactive = terminal::is_interactive();
    let mut shell = Shell::new(history).with_raw_mode(interactive);
    let result = if interactive {
        let mut renderer = Renderer::new(io::stdout(), settings.prompt.clone());
        renderer.bell = settings.bell;
        let mut reader = LineReader::new(CompletionProvider::default(), renderer);
        shell.run_editor(&mut reader, &mut io::stdin().lock(), &mut io::stdout(), &mut io::stderr())
    } else {
        shell.run_script(io::stdin().lock(), &mut io::stdout(), &mut io::stderr())
    };

    let _ = io::stdout().flush();
    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("esh: {e}");
            std::process::exit(1);
        }
    }
}

/// Read an rc file, reporting problems on stderr.  A missing file is only
/// reported when it was named explicitly.
fn load_rc(path: &Path, required: bool) -> Config {
    match Config::load_file(path) {
        Ok((config, errors)) => {
            for e in errors {
                tracing::warn!(path = %path.display(), error = %e, "config error");
                eprintln!("esh: {}: {e}", path.display());
            }
            config
        }
        Err(e) if !required && e.kind() == io::ErrorKind::NotFound => Config::default(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "rc file unreadable");
            eprintln!("esh: {}: {e}", path.display());
            Config::default()
        }
    }
}
