/// Structured logging for the sea level crawler
///
/// Provides context-rich logging with pipeline stage and station
/// identifiers, timestamps, and severity levels. Supports both console
/// output and file-based logging.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::model::CrawlError;
use crate::validate::ValidationWarning;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline stages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolve,
    Fetch,
    Parse,
    Validate,
    Persist,
    Analysis,
    System,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Resolve => write!(f, "RESOLVE"),
            Stage::Fetch => write!(f, "FETCH"),
            Stage::Parse => write!(f, "PARSE"),
            Stage::Validate => write!(f, "VALIDATE"),
            Stage::Persist => write!(f, "PERSIST"),
            Stage::Analysis => write!(f, "ANALYSIS"),
            Stage::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - the feed is temporarily unreachable
    Expected,
    /// Unexpected failure - the feed format changed or the output location is broken
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<PathBuf>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    fn log(&self, level: LogLevel, stage: Stage, station: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let entry = format_entry(level, stage, station, message);
        let station_part = station.map(|s| format!(" [{}]", s)).unwrap_or_default();

        if self.console_timestamps {
            match level {
                LogLevel::Error => eprintln!("{}", entry),
                LogLevel::Warning => eprintln!("   {}", entry),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}", message),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", stage, station_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", stage, station_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => {}
            }
        }

        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &entry) {
                eprintln!("Failed to write to log file {}: {}", path.display(), e);
            }
        }
    }

    fn append_to_file(path: &Path, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

/// Formats one log line: `<timestamp> <LEVEL> <STAGE> [station]: message`.
pub fn format_entry(level: LogLevel, stage: Stage, station: Option<&str>, message: &str) -> String {
    let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    let station_part = station.map(|s| format!(" [{}]", s)).unwrap_or_default();
    format!("{} {} {}{}: {}", timestamp, level, stage, station_part, message)
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&Path>, console_timestamps: bool) {
    let logger = Logger {
        min_level,
        log_file: log_file.map(Path::to_path_buf),
        console_timestamps,
    };
    if let Ok(mut slot) = LOGGER.lock() {
        *slot = Some(logger);
    }
}

fn dispatch(level: LogLevel, stage: Stage, station: Option<&str>, message: &str) {
    if let Ok(slot) = LOGGER.lock() {
        if let Some(logger) = slot.as_ref() {
            logger.log(level, stage, station, message);
        }
    }
}

/// Log a general informational message
pub fn info(stage: Stage, station: Option<&str>, message: &str) {
    dispatch(LogLevel::Info, stage, station, message);
}

/// Log a warning message
pub fn warn(stage: Stage, station: Option<&str>, message: &str) {
    dispatch(LogLevel::Warning, stage, station, message);
}

/// Log an error message
pub fn error(stage: Stage, station: Option<&str>, message: &str) {
    dispatch(LogLevel::Error, stage, station, message);
}

/// Log a debug message
pub fn debug(stage: Stage, station: Option<&str>, message: &str) {
    dispatch(LogLevel::Debug, stage, station, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a crawl failure. Network trouble is expected for a public feed;
/// a payload we can no longer read, or an unwritable output, is not.
pub fn classify_failure(err: &CrawlError) -> FailureType {
    match err {
        CrawlError::Transport { .. } => FailureType::Expected,
        CrawlError::Parse(_) | CrawlError::Io { .. } | CrawlError::Config(_) => {
            FailureType::Unexpected
        }
        CrawlError::Resolution { attempts } => {
            if attempts.is_empty() {
                FailureType::Unexpected
            } else if attempts
                .iter()
                .all(|a| matches!(a.error, CrawlError::Transport { .. }))
            {
                FailureType::Expected
            } else if attempts
                .iter()
                .all(|a| matches!(a.error, CrawlError::Parse(_)))
            {
                FailureType::Unexpected
            } else {
                FailureType::Unknown
            }
        }
    }
}

/// Stage a failure belongs to, for the log tag.
pub fn failure_stage(err: &CrawlError) -> Stage {
    match err {
        CrawlError::Resolution { .. } => Stage::Resolve,
        CrawlError::Transport { .. } => Stage::Fetch,
        CrawlError::Parse(_) => Stage::Parse,
        CrawlError::Io { .. } => Stage::Persist,
        CrawlError::Config(_) => Stage::System,
    }
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Log a crawl failure with automatic classification
pub fn log_crawl_failure(station: &str, operation: &str, err: &CrawlError) {
    let failure_type = classify_failure(err);
    let message = format!("{} failed [{}]: {}", operation, failure_type, err);
    let stage = failure_stage(err);

    match failure_type {
        FailureType::Expected => warn(stage, Some(station), &message),
        FailureType::Unexpected => error(stage, Some(station), &message),
        FailureType::Unknown => warn(stage, Some(station), &message),
    }
}

// ---------------------------------------------------------------------------
// Validation Summary Logging
// ---------------------------------------------------------------------------

/// Log the non-fatal outcome of cleaning: discarded rows and replaced years
pub fn log_validation_summary(station: &str, kept: usize, warning: &ValidationWarning) {
    let message = format!(
        "Validation complete: {} records kept, {} discarded, {} duplicate years replaced",
        kept,
        warning.discarded.len(),
        warning.duplicate_years.len()
    );

    if warning.is_clean() {
        info(Stage::Validate, Some(station), &message);
    } else {
        warn(Stage::Validate, Some(station), &message);
        for discard in &warning.discarded {
            debug(Stage::Validate, Some(station), &discard.to_string());
        }
    }
}
