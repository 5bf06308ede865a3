//! Watch command implementation
//!
//! Runs the autoconnect scanner without a transport and prints each
//! candidate change, together with any live claim another window holds on
//! the board.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::config::load_board_config;
use super::state::open_store;
use crate::output::{print_info, print_success, print_warning};
use bl_core::time::current_time_millis;
use bl_core::traits::DeviceDiscovery;
use bl_orchestrator::scanner::select_candidate;
use bl_orchestrator::{messages, AutoconnectScanner, Event, ScanTransition, SerialPortDiscovery};

/// Watch for boards until `cancel` fires
pub async fn watch_command(
    config_path: Option<&PathBuf>,
    state_path: Option<&PathBuf>,
    cancel: CancellationToken,
) -> Result<()> {
    let config = load_board_config(config_path)?;
    let timing = config.timing;
    let store = open_store(state_path);

    let discovery: Arc<dyn DeviceDiscovery> =
        Arc::new(SerialPortDiscovery::new(config.autoconnect_manufacturers));
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let mut scanner = AutoconnectScanner::new(discovery, events_tx, timing.autoconnect_interval);

    print_info(&format!(
        "Watching for boards every {:?} (Ctrl+C to stop)",
        timing.autoconnect_interval
    ));
    scanner.start();

    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = events_rx.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        let Event::Scan(report) = event else {
            continue;
        };
        if !scanner.is_current(&report) {
            tracing::debug!("Dropping scan from generation {}", report.generation);
            continue;
        }

        match scanner.record(select_candidate(&report.boards, None)) {
            ScanTransition::NothingFound => print_info(messages::NO_BOARDS_FOUND),
            ScanTransition::Found(address) => {
                print_success(&format!("{}: {}", messages::BOARD_FOUND, address));
                if let Some(record) = store.get(&address) {
                    if record.is_live(current_time_millis(), timing.staleness_window) {
                        print_warning(&messages::conflict(&record.project));
                    }
                }
            }
            ScanTransition::Lost(address) => {
                print_warning(&format!("{}: {}", messages::BOARD_LOST, address));
            }
            ScanTransition::Unchanged => {}
        }
    }

    scanner.stop();
    tracing::info!("Watch stopped");
    Ok(())
}
