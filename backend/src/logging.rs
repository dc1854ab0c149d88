//! Tracing setup for the edge binary.
//!
//! The auth and proxy crates log through `log`; those records are bridged
//! into `tracing` so they nest under the `edge.permission` and `edge.proxy`
//! request spans.

use anyhow::Context;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::path::Path;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Encoding of the edge log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One human-readable line per event.
    Compact,
    /// JSON Lines, one object per event with its span list.
    Json,
}

impl LogFormat {
    /// Unknown names fall back to [`LogFormat::Compact`].
    pub fn parse(name: &str) -> Self {
        if name.eq_ignore_ascii_case("json") || name.eq_ignore_ascii_case("jsonl") {
            LogFormat::Json
        } else {
            LogFormat::Compact
        }
    }
}

/// Dependencies held at `warn` unless a target override says otherwise.
const QUIET_TARGETS: &[&str] = &[
    "actix_http",
    "actix_server",
    "actix_web",
    "h2",
    "hyper",
    "hyper_util",
    "reqwest",
    "rustls",
    "sqlparser",
];

/// Filter for one output: the base level, quiet dependencies, then the
/// `[logging.targets]` overrides (later directives win).
pub(crate) fn build_env_filter(
    level: &str,
    target_levels: Option<&HashMap<String, String>>,
) -> anyhow::Result<EnvFilter> {
    let directives: Vec<String> = std::iter::once(level.to_string())
        .chain(QUIET_TARGETS.iter().map(|target| format!("{}=warn", target)))
        .chain(
            target_levels
                .into_iter()
                .flatten()
                .map(|(target, lvl)| format!("{}={}", target, lvl)),
        )
        .collect();

    let filter = directives.join(",");
    EnvFilter::try_new(&filter).with_context(|| format!("Invalid log filter '{}'", filter))
}

fn open_log_file(path: &Path) -> anyhow::Result<File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create log directory {}", dir.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Cannot open log file {}", path.display()))
}

/// Install the global subscriber: an optional ANSI console output plus the
/// edge log file in `format`. Span close events carry their elapsed time.
pub fn init_logging(
    level: &str,
    file_path: &str,
    log_to_console: bool,
    target_levels: Option<&HashMap<String, String>>,
    format: &str,
) -> anyhow::Result<()> {
    let file = open_log_file(Path::new(file_path))?;

    let console = if log_to_console {
        Some(
            fmt::layer()
                .with_ansi(true)
                .with_target(true)
                .with_span_events(FmtSpan::CLOSE)
                .with_filter(build_env_filter(level, target_levels)?),
        )
    } else {
        None
    };

    let file_filter = build_env_filter(level, target_levels)?;
    let file_output = match LogFormat::parse(format) {
        LogFormat::Json => fmt::layer()
            .json()
            .with_span_list(true)
            .with_writer(file)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(file_filter)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .with_ansi(false)
            .with_thread_names(true)
            .with_writer(file)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(file_filter)
            .boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(console).with(file_output);
    tracing::subscriber::set_global_default(subscriber)
        .context("A global tracing subscriber is already installed")?;
    tracing_log::LogTracer::init().context("The log bridge is already installed")?;

    log::debug!("Logging to {} at level {} (console: {})", file_path, level, log_to_console);
    Ok(())
}
