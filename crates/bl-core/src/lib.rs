//! bl-core: Core abstractions and configuration for boardlink
//!
//! This crate provides the shared types, error taxonomy, collaborator
//! traits and configuration used by the orchestrator and the CLI.

pub mod config;
pub mod error;
pub mod time;
pub mod traits;
pub mod types;

pub use types::{Address, PortInfo, SyncDirection, TransportKind};
