//! Core domain types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Address of a board: a serial port path or a network host
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    /// Create a new address
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Get the raw address string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Transport kind implied by the address format
    pub fn transport_kind(&self) -> TransportKind {
        TransportKind::for_address(&self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// How a board is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// USB serial port
    Serial,
    /// Telnet/socket over the network
    Network,
}

impl TransportKind {
    /// Classify an address string.
    ///
    /// `/dev/...` paths, `COMn` ports and bare `tty...` names are serial;
    /// anything else is treated as a network host.
    pub fn for_address(address: &str) -> Self {
        let upper = address.to_ascii_uppercase();
        let is_com_port = upper
            .strip_prefix("COM")
            .map(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
            .unwrap_or(false);

        if address.starts_with("/dev/") || address.starts_with("tty") || is_com_port {
            TransportKind::Serial
        } else {
            TransportKind::Network
        }
    }

    /// Whether this is a serial transport
    pub fn is_serial(&self) -> bool {
        matches!(self, TransportKind::Serial)
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Serial => write!(f, "serial"),
            TransportKind::Network => write!(f, "network"),
        }
    }
}

/// One enumerated port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortInfo {
    /// Port name, usable as a board address
    pub name: String,
    /// USB manufacturer string, if the port reports one
    pub manufacturer: Option<String>,
}

impl PortInfo {
    /// Create a port entry
    pub fn new(name: impl Into<String>, manufacturer: Option<String>) -> Self {
        Self {
            name: name.into(),
            manufacturer,
        }
    }

    /// Display text, e.g. `/dev/ttyUSB0 (Pycom)`
    pub fn display_name(&self) -> String {
        format!(
            "{} ({})",
            self.name,
            self.manufacturer.as_deref().unwrap_or("unknown")
        )
    }
}

/// Direction of a file sync session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncDirection {
    /// Push project files to the board
    Upload,
    /// Pull board files into the project
    Download,
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncDirection::Upload => write!(f, "upload"),
            SyncDirection::Download => write!(f, "download"),
        }
    }
}

/// Connection lifecycle state of the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    /// No board connected
    Disconnected,
    /// Handshake in progress
    Connecting,
    /// Board connected and ready
    Connected,
    /// Teardown in progress
    Disconnecting,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "disconnected"),
            ConnectionStatus::Connecting => write!(f, "connecting"),
            ConnectionStatus::Connected => write!(f, "connected"),
            ConnectionStatus::Disconnecting => write!(f, "disconnecting"),
        }
    }
}

/// Toolbar state pushed to the view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonState {
    /// The runner is executing a file
    pub runner_busy: bool,
    /// A sync session is active
    pub synchronizing: bool,
    /// Direction of the active sync session
    pub sync_direction: Option<SyncDirection>,
}

/// Severity of a host notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Warning,
    Error,
}
