//! Logging setup for provider processes
//!
//! Terraform reads the plugin handshake from stdout, so all log output goes
//! to stderr where Terraform collects it under `TF_LOG_PROVIDER`.

use crate::error::{Result, TfplugError};
use std::str::FromStr;
use tracing::Level;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Level requested through `TF_LOG_PROVIDER` or `TF_LOG`, defaulting to info
    pub fn from_env() -> Self {
        ["TF_LOG_PROVIDER", "TF_LOG"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find_map(|v| v.parse().ok())
            .unwrap_or(LogLevel::Info)
    }
}

impl FromStr for LogLevel {
    type Err = TfplugError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            other => Err(TfplugError::LoggingError(format!(
                "unknown log level {:?}",
                other
            ))),
        }
    }
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

/// Install the global stderr subscriber
///
/// Fails if a global subscriber is already set.
pub fn init(level: LogLevel) -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::from(level))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init()
        .map_err(|e| TfplugError::LoggingError(e.to_string()))
}
