//! Core error types for boardlink

use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by a device transport
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The device did not answer in time
    #[error("timeout")]
    Timeout,

    /// No device is connected
    #[error("Not connected")]
    NotConnected,

    /// Any other transport failure, with a human-readable message
    #[error("{0}")]
    Failed(String),
}

impl TransportError {
    /// Whether this is the distinguished timeout value
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout)
    }
}

/// Errors reported by the file sync engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The transfer failed
    #[error("{0}")]
    Failed(String),

    /// The transfer was cancelled before it finished
    #[error("Sync cancelled")]
    Cancelled,
}

/// Errors from enumerating candidate devices
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// The platform enumeration call failed
    #[error("Failed to enumerate ports: {0}")]
    Enumeration(String),

    /// The enumeration task could not be joined
    #[error("Enumeration task failed: {0}")]
    Task(String),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Project config JSON error
    #[error("JSON format error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Connection state store errors
///
/// Reads used by the orchestrator fail open; it only logs write failures.
/// Strict reads surface these to callers that manage the state file directly.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Reading or replacing the state file failed
    #[error("State file I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The state file is not a valid JSON object
    #[error("State file is malformed: {0}")]
    Json(#[from] serde_json::Error),
}
