//! Terminal text and board commands

use std::time::Duration;

/// Printed by the help command
pub const HELP_TEXT: &str = "boardlink commands:\r\n\
  - connect / disconnect / toggle-connect\r\n\
  - upload: sync the project to the board (again to stop)\r\n\
  - download: copy the board's files into the project (again to stop)\r\n\
  - run: run the open file on the board (again to stop)\r\n\
  - get-device-version: print the firmware version\r\n\
  - get-wifi-mac: print the board's WiFi AP name\r\n\
  - get-serial-ports: list serial ports, copying the first to the clipboard\r\n\
  - clear-terminal / toggle-panel / help\r\n\
Settings: global config.toml, per-project boardlink.conf\r\n";

/// Printed on the first connect on a machine without settings
pub const START_TEXT: &str = "Welcome to boardlink!\r\n\
Set the address of your board in the global settings, or leave autoconnect \
on to pick up boards plugged in over USB.\r\n\
Type 'help' in the command palette for the list of commands.\r\n";

/// Prints the firmware release
pub const VERSION_COMMAND: &str = "import os; os.uname().release\r\n";

/// Prints the WiFi access point name derived from the MAC address
pub const WIFI_MAC_COMMAND: &str = "from network import WLAN; from binascii import hexlify; \
from os import uname; wlan = WLAN(); mac = hexlify(wlan.mac()).decode('ascii'); \
device = uname().sysname;print('WiFi AP SSID: %(device)s-wlan-%(mac)s' % \
{'device': device, 'mac': mac[len(mac)-4:len(mac)]})";

/// Echo wait for the version query
pub const VERSION_TIMEOUT: Duration = Duration::from_secs(5);

/// Echo wait for the WiFi query
pub const WIFI_MAC_TIMEOUT: Duration = Duration::from_secs(1);

pub const NOT_CONNECTED: &str = "Please connect your device";
pub const ADDRESS_NOT_CONFIGURED: &str =
    "Address not configured. Please go to the settings to configure a valid address or comport";
pub const NO_BOARDS_FOUND: &str = "Autoconnect: No boards found on USB";
pub const BOARD_FOUND: &str = "Autoconnect: Found a board on USB";
pub const BOARD_LOST: &str = "Autoconnect: Previous board is not available anymore";
pub const ATTEMPT_CANCELED: &str = "Connection attempt canceled";
pub const CONNECT_TIMED_OUT: &str = "> Connection timed out. Click here to try again.";
pub const PROJECT_FORMAT_ERROR: &str = "JSON format error in project config file";
pub const PORTS_INTRO: &str =
    "Here are the devices you've connected to the serial port at the moment:";

pub fn connecting(address: &str, autoconnect: bool) -> String {
    let preamble = if autoconnect { "Autoconnect: " } else { "" };
    format!("{}Connecting on {}...", preamble, address)
}

pub fn connect_failed(message: &str) -> String {
    format!("> Failed to connect ({}). Click here to try again.", message)
}

pub fn conflict(project: &str) -> String {
    format!("Already connected in another window (project '{}')", project)
}

pub fn stopping(direction: impl std::fmt::Display) -> String {
    format!("Stopping {}, waiting for last action to finish...", direction)
}

pub fn ports_found(count: usize) -> String {
    format!(
        "Found {} serialport{}",
        count,
        if count == 1 { "" } else { "s" }
    )
}
