//! Logging setup for the tabview binary
//!
//! Console output goes to stderr so stdout stays clean for table and JSON
//! output. `RUST_LOG` overrides both filters.

use std::path::PathBuf;

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

const QUIET_FILTER: &str = "warn";
const VERBOSE_FILTER: &str = "info,tabview_cli=debug,tabview_engine=debug,tabview_storage=debug";
const FILE_FILTER: &str = "info,tabview_engine=debug";

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Filter for stderr when `RUST_LOG` is unset
    pub console_filter: String,

    /// Print span lifecycles and source locations on stderr
    pub console_detail: bool,

    /// Directory for daily JSON log files; `None` disables them
    pub log_dir: Option<PathBuf>,
}

impl LoggingConfig {
    /// `--verbose` turns the console up; JSON files are written either way
    /// when a data directory exists.
    pub fn for_cli(verbose: bool) -> Self {
        Self {
            console_filter: if verbose { VERBOSE_FILTER } else { QUIET_FILTER }.to_string(),
            console_detail: verbose,
            log_dir: log_directory(),
        }
    }
}

fn filter_or(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the global subscriber. File logging is skipped when the log
/// directory cannot be created.
pub fn init(config: &LoggingConfig) {
    let span_events = if config.console_detail {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let mut layers = vec![fmt::layer()
        .with_target(config.console_detail)
        .with_file(config.console_detail)
        .with_line_number(config.console_detail)
        .with_span_events(span_events)
        .with_writer(std::io::stderr)
        .compact()
        .with_filter(filter_or(&config.console_filter))
        .boxed()];

    let log_dir = config
        .log_dir
        .as_ref()
        .filter(|dir| std::fs::create_dir_all(dir).is_ok());
    if let Some(log_dir) = log_dir {
        let (writer, guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::daily(log_dir, "tabview.log"));
        // Flushes on drop; must live until exit
        std::mem::forget(guard);

        layers.push(
            fmt::layer()
                .with_ansi(false)
                .with_thread_ids(true)
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(writer)
                .with_filter(filter_or(FILE_FILTER))
                .boxed(),
        );
    }

    tracing_subscriber::registry().with(layers).init();
    tracing::debug!(log_dir = ?log_dir, "Logging initialized");
}

fn log_directory() -> Option<PathBuf> {
    tabview_engine::data_dir().ok().map(|dir| dir.join("logs"))
}

/// Logs the elapsed time of an operation when dropped
pub struct TimingGuard {
    name: &'static str,
    start: std::time::Instant,
}

impl TimingGuard {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        tracing::debug!(
            operation = self.name,
            duration_ms = self.start.elapsed().as_millis() as u64,
            "Operation completed"
        );
    }
}
