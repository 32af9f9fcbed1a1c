//! Tracing setup for qpanel.
//!
//! The interactive panel owns the terminal, so its log lines go to a file.
//! Headless runs print to stderr where scripts and test harnesses capture them.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Read before `RUST_LOG` so qpanel can be tuned without touching other tools.
pub const LOG_ENV: &str = "QPANEL_LOG";

/// Used when no filter variable is set. The HTTP stack is chatty at info.
pub const DEFAULT_DIRECTIVES: &str = "info,hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn";

const LOG_FILE_NAME: &str = "qpanel.log";

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    File(PathBuf),
    Stderr,
}

impl LogTarget {
    /// Stderr for headless runs, the log file while the terminal is in use.
    pub fn for_mode(headless: bool) -> Self {
        if headless {
            Self::Stderr
        } else {
            Self::File(log_file_path())
        }
    }
}

/// Installs the global subscriber.
///
/// Returns the log file in use, or `None` for stderr. When the file cannot be
/// opened a warning is printed and logging stays off.
pub fn init(target: &LogTarget) -> Option<PathBuf> {
    let filter = build_filter();

    match target {
        LogTarget::Stderr => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
            None
        }
        LogTarget::File(path) => match open_log_file(path) {
            Ok(file) => {
                tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_writer(file)
                    .with_ansi(false)
                    .init();
                Some(path.clone())
            }
            Err(e) => {
                eprintln!("Warning: Could not open log file {}: {e}", path.display());
                None
            }
        },
    }
}

/// Filter directives from `QPANEL_LOG`, then `RUST_LOG`, then the defaults.
/// Blank values are skipped.
pub fn filter_directives(qpanel_log: Option<String>, rust_log: Option<String>) -> String {
    [qpanel_log, rust_log]
        .into_iter()
        .flatten()
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_DIRECTIVES.to_string())
}

fn build_filter() -> EnvFilter {
    let directives = filter_directives(
        std::env::var(LOG_ENV).ok(),
        std::env::var("RUST_LOG").ok(),
    );
    EnvFilter::try_new(&directives).unwrap_or_else(|e| {
        eprintln!("Warning: Ignoring invalid log filter '{directives}': {e}");
        EnvFilter::new(DEFAULT_DIRECTIVES)
    })
}

/// `<state_dir>/qpanel/qpanel.log`, falling back to the config dir and then
/// the temp dir.
pub fn log_file_path() -> PathBuf {
    [dirs::state_dir(), dirs::config_dir()]
        .into_iter()
        .flatten()
        .next()
        .map(|dir| dir.join("qpanel").join(LOG_FILE_NAME))
        .unwrap_or_else(|| std::env::temp_dir().join(LOG_FILE_NAME))
}

/// Creates the parent directory and truncates the file.
fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    File::create(path)
}
