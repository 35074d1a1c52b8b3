//! Diagnostic logging.
//!
//! The interactive line owns the terminal, so diagnostics never go to the
//! console: they are written to `<data dir>/logs/esh.log` with daily
//! rotation.  The filter comes from `ESH_LOG` (e.g. `ESH_LOG=esh=debug`,
//! `ESH_LOG=esh::completion=trace`) and defaults to `warn`.

use std::path::Path;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const ENV_VAR: &str = "ESH_LOG";
pub const LOG_FILE_NAME: &str = "esh.log";

/// Install the global subscriber writing into `dir`.
///
/// Does nothing when `dir` is `None` or cannot be created; the shell works
/// the same without logs.
pub fn init(dir: Option<&Path>) {
    let Some(dir) = dir else { return };
    if std::fs::create_dir_all(dir).is_err() {
        return;
    }

    let filter = EnvFilter::try_from_env(ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .with_filter(filter);

    // A subscriber may already be set (tests); keep it.
    let _ = tracing_subscriber::registry().with(file_layer).try_init();
}
