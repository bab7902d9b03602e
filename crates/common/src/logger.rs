use crate::error::CreatorGraphError;
use chrono::Utc;
use std::fs::File;
use std::path::Path;
use tracing::{Level, Span};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Log file name inside the configured log directory
pub const LOG_FILE_NAME: &str = "creatorgraph.log";

/// Initialize logging to console and to an append-only file.
///
/// Every line emitted inside a pipeline run carries the `run` span (run id,
/// input file) and the current `stage` span. The file layer also records
/// each stage's duration when its span closes, so one run can be followed
/// across many appended runs in the same file.
///
/// # Arguments
/// * `log_dir` - Directory where the log file is created
/// * `log_level` - trace, debug, info, warn or error; `RUST_LOG` overrides it
pub fn setup_logging(log_dir: &Path, log_level: &str) -> Result<(), CreatorGraphError> {
    let (log_file, log_file_path) = open_log_file(log_dir)?;

    let console_layer = fmt::layer()
        .with_target(false)
        .with_filter(level_filter(log_level));

    let file_layer = fmt::layer()
        .with_writer(log_file)
        .with_target(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_span_events(FmtSpan::CLOSE)
        .with_filter(level_filter(log_level));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| CreatorGraphError::config(format!("Failed to install logger: {}", e)))?;

    tracing::info!(
        "Logging initialized: level={}, log_file={}",
        log_level,
        log_file_path.display()
    );

    Ok(())
}

/// Console-only logging, used by `check`
pub fn setup_console_logging(log_level: &str) -> Result<(), CreatorGraphError> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(level_filter(log_level))
        .try_init()
        .map_err(|e| CreatorGraphError::config(format!("Failed to install logger: {}", e)))?;

    Ok(())
}

fn open_log_file(log_dir: &Path) -> Result<(File, std::path::PathBuf), CreatorGraphError> {
    std::fs::create_dir_all(log_dir).map_err(|e| {
        CreatorGraphError::config(format!(
            "Failed to create log directory {}: {}",
            log_dir.display(),
            e
        ))
    })?;

    let path = log_dir.join(LOG_FILE_NAME);
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| {
            CreatorGraphError::config(format!(
                "Failed to open log file {}: {}",
                path.display(),
                e
            ))
        })?;

    Ok((file, path))
}

/// `RUST_LOG` when set, otherwise the configured level
fn level_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(parse_log_level(log_level).as_str()))
}

/// Identifier of one pipeline run, e.g. `20261019T074501-2a`
pub fn new_run_id(seed: u64) -> String {
    format!("{}-{:x}", Utc::now().format("%Y%m%dT%H%M%S"), seed)
}

/// Span wrapping a whole pipeline run
pub fn run_span(run_id: &str, input: &Path) -> Span {
    tracing::info_span!("run", id = %run_id, input = %input.display())
}

/// Span wrapping one pipeline stage; its close event logs the stage time
pub fn stage_span(stage: &'static str) -> Span {
    tracing::info_span!("stage", name = stage)
}

/// Parse string to tracing Level
pub fn parse_log_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to INFO", level);
            Level::INFO
        }
    }
}
