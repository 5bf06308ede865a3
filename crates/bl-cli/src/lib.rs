//! boardlink: Command-line host for the board connection orchestrator
//!
//! Provides the `boardlink` CLI for inspecting serial ports, the shared
//! connection state and the configuration files, and for watching
//! autoconnect decisions live.

pub mod commands;
pub mod output;
