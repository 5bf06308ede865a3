//! State command implementations
//!
//! Inspect or reset the connection state shared by every window on this
//! machine.

use std::path::PathBuf;

use anyhow::{Context, Result};

use super::config::load_board_config;
use crate::output::{format_state, print_info, print_success, print_warning};
use bl_core::time::current_time_millis;
use bl_core::Address;
use bl_orchestrator::ConnectionStateStore;

pub(crate) fn open_store(state_path: Option<&PathBuf>) -> ConnectionStateStore {
    match state_path {
        Some(path) => ConnectionStateStore::new(path.clone()),
        None => ConnectionStateStore::open_default(),
    }
}

/// Print every record with its age and whether it is still a live claim
pub fn state_list(
    config_path: Option<&PathBuf>,
    state_path: Option<&PathBuf>,
    json: bool,
) -> Result<()> {
    let store = open_store(state_path);

    let state = store
        .try_load()
        .with_context(|| format!("Failed to read {:?}", store.path()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    let window = load_board_config(config_path)?.timing.staleness_window;
    print_info(&format!("State file: {:?}", store.path()));
    println!("{}", format_state(&state, current_time_millis(), window));
    Ok(())
}

/// Remove one record, or every record when `address` is `None`
pub fn state_clear(state_path: Option<&PathBuf>, address: Option<&str>) -> Result<()> {
    let store = open_store(state_path);

    match address {
        Some(address) => {
            let removed = store
                .release(&Address::new(address))
                .with_context(|| format!("Failed to update {:?}", store.path()))?;
            if removed {
                print_success(&format!("Released {}", address));
            } else {
                print_warning(&format!("No record for {}", address));
            }
        }
        None => {
            store
                .clear()
                .with_context(|| format!("Failed to clear {:?}", store.path()))?;
            print_success("Cleared all connection records");
        }
    }

    Ok(())
}
