//! Error types for the monitor engine.

use std::path::PathBuf;
use statusbar_scheduler::SchedulerError;
use thiserror::Error;

/// Result type for monitor operations.
pub type Result<T> = std::result::Result<T, MonitorError>;

#[derive(Debug, Error)]
pub enum MonitorError {
    /// Failed to read a configuration file.
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration text is not valid JSON for `MonitorConfig`.
    #[error("invalid config json: {0}")]
    Config(#[from] serde_json::Error),

    /// Configuration parsed but holds an unusable value.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    /// The operation needs a started monitor.
    #[error("status monitor is not running")]
    NotRunning,
}
