//! Ports command implementation

use std::path::PathBuf;

use anyhow::Result;

use super::config::load_board_config;
use crate::output::{format_ports, print_error, print_info};
use bl_core::traits::DeviceDiscovery;
use bl_orchestrator::discovery::filter_boards;
use bl_orchestrator::messages;
use bl_orchestrator::SerialPortDiscovery;

/// List serial ports, optionally only the recognised boards
///
/// With `json`, prints the ports as a JSON array and nothing else.
pub async fn ports_command(
    config_path: Option<&PathBuf>,
    boards_only: bool,
    json: bool,
) -> Result<()> {
    let config = load_board_config(config_path)?;
    let manufacturers = config.autoconnect_manufacturers;
    let discovery = SerialPortDiscovery::new(manufacturers.clone());

    let ports = match discovery.list_ports().await {
        Ok(p) => p,
        Err(e) => {
            print_error(&format!("Failed to list serial ports: {}", e));
            return Err(e.into());
        }
    };

    let ports = if boards_only {
        filter_boards(ports, &manufacturers)
    } else {
        ports
    };

    tracing::debug!("Enumerated {} port(s)", ports.len());
    if json {
        println!("{}", serde_json::to_string_pretty(&ports)?);
        return Ok(());
    }

    print_info(&messages::ports_found(ports.len()));
    println!("{}", format_ports(&ports, &manufacturers));
    Ok(())
}
