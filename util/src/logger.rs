//! Logger initialisation
//!
//! Log lines go to both stdout and the session's log file. Stdout gets
//! coloured level tags, the file gets plain ones so that it stays greppable.
//! Every line is prefixed with the number of seconds since the session epoch.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use log::{info, warn, Level};
use std::env;
use std::str::FromStr;
use thiserror::Error;

// Internal imports
use crate::session::{self, Session};

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Environment variable which overrides the level given to `logger_init`.
pub const LOG_LEVEL_ENV_VAR: &str = "LANE_LOG_LEVEL";

/// Targets which log once per frame or per edge point at `trace`, and are
/// capped at `debug` unless explicitly requested through the environment.
const PER_FRAME_TARGETS: [&str; 2] = [
    "lane_lib::lane_det",
    "lane_lib::frame_source"
];

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level at least as verbose as `INFO`, found `{0}`")]
    InvalidMinLogLevel(LevelFilter),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// If `LANE_LOG_LEVEL` is set to a valid level it replaces `min_level`.
///
/// # Notes
///
/// - The level must be at least as verbose as `Info`.
/// - This function must only be called once per process.
pub fn logger_init(
    min_level: LevelFilter,
    session: &Session
) -> Result<(), LoggerInitError> {

    let env_level = env::var(LOG_LEVEL_ENV_VAR).ok();
    let level = match env_level.as_deref().map(parse_level) {
        Some(Some(l)) => l,
        _ => min_level
    };

    if level < LevelFilter::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(level))
    }

    // Per-frame trace output is only wanted when asked for by name
    let per_frame_level = if env_level.is_some() {
        level
    }
    else {
        level.min(LevelFilter::Debug)
    };

    let log_file = fern::log_file(&session.log_file_path)
        .map_err(LoggerInitError::LogFileInitError)?;

    let stdout = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}",
                format_line(record, coloured_level(record.level()), message)
            ))
        })
        .chain(std::io::stdout());

    let file = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}",
                format_line(record, plain_level(record.level()), message)
            ))
        })
        .chain(log_file);

    let mut dispatch = fern::Dispatch::new()
        .level(level)
        .level_for("image", LevelFilter::Info);

    for target in PER_FRAME_TARGETS.iter() {
        dispatch = dispatch.level_for(*target, per_frame_level);
    }

    dispatch
        .chain(stdout)
        .chain(file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    if let Some(epoch) = session::get_epoch() {
        info!("    Session epoch: {}", epoch);
    }
    info!("    Log level: {:?}", level);
    info!("    Log file path: {:?}", session.log_file_path);

    if let Some(s) = env_level.as_deref() {
        if parse_level(s).is_none() {
            warn!("Ignoring unrecognised {} value {:?}", LOG_LEVEL_ENV_VAR, s);
        }
    }

    Ok(())
}

/// Parse a level name such as `debug` or `TRACE`, ignoring case.
pub fn parse_level(s: &str) -> Option<LevelFilter> {
    LevelFilter::from_str(s.trim()).ok()
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Format a log line, the target is only included for debug and trace.
fn format_line<T: std::fmt::Display>(
    record: &log::Record,
    level: T,
    message: &std::fmt::Arguments
) -> String {
    if record.level() > Level::Info {
        format!(
            "[{:10.6} {}] {}: {}",
            session::get_elapsed_seconds(),
            level,
            record.target(),
            message
        )
    }
    else {
        format!(
            "[{:10.6} {}] {}",
            session::get_elapsed_seconds(),
            level,
            message
        )
    }
}

fn coloured_level(level: Level) -> ColoredString {
    match level {
        Level::Trace => "TRC".dimmed().italic(),
        Level::Debug => "DBG".dimmed(),
        Level::Info  => "INF".normal(),
        Level::Warn  => "WRN".yellow(),
        Level::Error => "ERR".red().bold()
    }
}

fn plain_level(level: Level) -> &'static str {
    match level {
        Level::Trace => "TRC",
        Level::Debug => "DBG",
        Level::Info  => "INF",
        Level::Warn  => "WRN",
        Level::Error => "ERR"
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), Some(LevelFilter::Debug));
        assert_eq!(parse_level(" TRACE "), Some(LevelFilter::Trace));
        assert_eq!(parse_level("Info"), Some(LevelFilter::Info));
        assert_eq!(parse_level("loud"), None);
    }

    #[test]
    fn test_plain_level_tags() {
        assert_eq!(plain_level(Level::Warn), "WRN");
        assert_eq!(plain_level(Level::Trace), "TRC");
    }
}
