use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Directory and file name the file layer appends to. An empty path means
/// no file log.
fn file_target(log_file: &Path) -> Option<(PathBuf, OsString)> {
    let file_name = log_file.file_name()?.to_os_string();
    let directory = log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Some((directory.to_path_buf(), file_name))
}

/// Log to stderr and, when `log_file` is set, append to it. Keep the guard
/// alive for the whole process or buffered file lines are lost.
pub fn init_logging(log_file: Option<&Path>, verbose: bool) -> Option<WorkerGuard> {
    let (file_layer, guard) = match log_file.and_then(file_target) {
        Some((directory, file_name)) => {
            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(directory, file_name));
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug,hyper=info,reqwest=info,sqlx=warn")
        } else {
            EnvFilter::new("info,sqlx=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    guard
}
