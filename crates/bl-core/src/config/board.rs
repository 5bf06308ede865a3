//! Global board configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::serde_utils::duration_millis;

/// Global settings, stored in `config.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Default board address (serial port or IP/hostname)
    pub address: String,

    /// Telnet username for network boards
    pub username: String,

    /// Telnet password for network boards
    pub password: String,

    /// Project subfolder to sync (empty = project root)
    pub sync_folder: String,

    /// Comma-separated file extensions to upload
    pub sync_file_types: String,

    /// Upload every file regardless of extension
    pub sync_all_file_types: bool,

    /// Send ctrl-c right after connecting
    pub ctrl_c_on_connect: bool,

    /// Open the panel and connect when the editor starts
    pub open_on_start: bool,

    /// Reboot into safe mode before uploading
    pub safe_boot_on_upload: bool,

    /// Reboot the board after an upload
    pub reboot_after_upload: bool,

    /// Connect to the first board found on USB
    pub auto_connect: bool,

    /// Toolbar buttons to show
    pub statusbar_buttons: Vec<String>,

    /// USB manufacturer names that identify supported boards
    pub autoconnect_manufacturers: Vec<String>,

    /// Scheduling constants
    pub timing: TimingConfig,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            address: "192.168.4.1".to_string(),
            username: "micro".to_string(),
            password: "python".to_string(),
            sync_folder: String::new(),
            sync_file_types: "py,txt,log,json,xml,html,js,css,mpy".to_string(),
            sync_all_file_types: false,
            ctrl_c_on_connect: false,
            open_on_start: true,
            safe_boot_on_upload: false,
            reboot_after_upload: true,
            auto_connect: true,
            statusbar_buttons: default_statusbar_buttons(),
            autoconnect_manufacturers: vec![
                "Pycom".to_string(),
                "Pycom Ltd.".to_string(),
                "FTDI".to_string(),
                "Microchip Technology, Inc.".to_string(),
            ],
            timing: TimingConfig::default(),
        }
    }
}

/// Buttons shown when none are configured
pub(crate) fn default_statusbar_buttons() -> Vec<String> {
    ["connect", "upload", "download", "run"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Timers and windows used by the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// How often a live connection refreshes its shared state record
    #[serde(with = "duration_millis")]
    pub heartbeat_interval: Duration,

    /// Age after which another window's record is considered abandoned
    #[serde(with = "duration_millis")]
    pub staleness_window: Duration,

    /// Period of the USB autoconnect scan
    #[serde(with = "duration_millis")]
    pub autoconnect_interval: Duration,

    /// Delay before reconnecting a network board after a sync
    #[serde(with = "duration_millis")]
    pub reconnect_after_sync_delay: Duration,

    /// Handshake timeout handed to transports
    #[serde(with = "duration_millis")]
    pub connect_timeout: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(10),
            staleness_window: Duration::from_secs(11),
            autoconnect_interval: Duration::from_millis(2500),
            reconnect_after_sync_delay: Duration::from_secs(4),
            connect_timeout: Duration::from_secs(15),
        }
    }
}
