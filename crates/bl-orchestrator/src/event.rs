//! Inputs of the orchestrator loop
//!
//! Everything that can change orchestrator state arrives as an [`Event`] on a
//! single queue: user commands, transport outcomes, timer ticks and the
//! completion of background work. Events from abandoned attempts or cancelled
//! timers carry a stale attempt/generation number and are dropped.

use std::path::PathBuf;

use bl_core::error::{SyncError, TransportError};
use bl_core::traits::TransportEvent;
use bl_core::{Address, PortInfo};

/// User and host requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Connect to `address`, or resolve one when `None`
    Connect(Option<Address>),
    /// Disconnect from the board
    Disconnect,
    /// Connect when disconnected, disconnect otherwise
    ToggleConnect,
    /// Start an upload, or stop the running one
    Upload,
    /// Start a download, or stop the running one
    Download,
    /// Run the current file, or stop it
    Run,
    /// Print the board firmware version
    GetVersion,
    /// List the serial ports
    GetSerialPorts,
    /// Print the board's WiFi MAC address
    GetWifiMac,
    /// Print the command help
    Help,
    /// Clear the terminal
    ClearTerminal,
    /// Show or hide the panel
    TogglePanel,
    /// Show the panel
    ShowPanel,
    /// Hide the panel
    HidePanel,
    /// The user clicked the terminal
    TerminalClick,
    /// Keyboard input for the board's REPL
    UserInput(String),
    /// Another project was opened
    ProjectChanged(Option<PathBuf>),
    /// Settings files changed on disk
    ReloadSettings,
    /// The autoconnect setting was toggled
    AutoconnectChanged,
    /// Open the global settings
    OpenGlobalSettings,
}

/// Result of one autoconnect scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    /// Scanner generation that produced the report
    pub generation: u64,
    /// Enumerated boards, best candidate first
    pub boards: Vec<PortInfo>,
}

/// Orchestrator queue entries
#[derive(Debug)]
pub enum Event {
    /// A user or host request
    Command(Command),
    /// Transport outcome for connect attempt `attempt`
    Transport { attempt: u64, event: TransportEvent },
    /// Heartbeat tick of timer generation `generation`
    Heartbeat { generation: u64 },
    /// Autoconnect scan result
    Scan(ScanReport),
    /// A sync session ended
    SyncFinished {
        session: u64,
        result: Result<(), SyncError>,
    },
    /// The runner finished toggling
    RunnerToggled,
    /// Forwarding user input failed
    UserInputFailed(TransportError),
    /// Delayed reconnect of timer generation `generation`
    Reconnect { generation: u64 },
}

impl From<Command> for Event {
    fn from(command: Command) -> Self {
        Event::Command(command)
    }
}
