use std::path::{Path, PathBuf};

use agenda_core::config::AgendaConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::cli::Command;

const DEFAULT_FILTER: &str = "agenda_cli=info,agenda_alerts=info,agenda_store=warn";
const LOG_FILE: &str = "agenda.log";

/// Where log lines are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Plain commands log to stderr so `get --json` keeps stdout clean.
    Stderr,
    /// Commands that take over the terminal log to a file beside the database.
    File(PathBuf),
}

impl LogTarget {
    pub fn for_command(command: &Command, config: &AgendaConfig) -> Self {
        match command {
            Command::Serve | Command::Alert { .. } => LogTarget::File(log_file_path(config)),
            _ => LogTarget::Stderr,
        }
    }
}

/// `agenda.log` in the directory holding the SQLite database.
pub fn log_file_path(config: &AgendaConfig) -> PathBuf {
    Path::new(&config.database.path)
        .parent()
        .map(|dir| dir.join(LOG_FILE))
        .unwrap_or_else(|| PathBuf::from(LOG_FILE))
}

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
///
/// The returned guard flushes the file writer on drop and must live until
/// the process exits.
pub fn init(target: &LogTarget) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    match target {
        LogTarget::Stderr => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init();
            None
        }
        LogTarget::File(path) => {
            let dir = path
                .parent()
                .filter(|d| !d.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let _ = std::fs::create_dir_all(dir);
            let file_name = path.file_name().unwrap_or(LOG_FILE.as_ref());
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(writer)
                .try_init();
            Some(guard)
        }
    }
}
