//! Orchestrator errors

use thiserror::Error;

use bl_core::Address;

use crate::sync::SyncRejection;

/// Refused orchestrator operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorError {
    /// Another window holds a live claim on the address
    #[error("{address} is in use by project '{project}'")]
    Conflict { address: Address, project: String },

    /// The operation needs a connected board
    #[error("Not connected")]
    NotConnected,

    /// A sync session could not start
    #[error("Sync rejected: {0}")]
    SyncRejected(#[from] SyncRejection),

    /// Code cannot run while a sync session is active
    #[error("Run rejected while synchronizing")]
    RunRejected,

    /// No address was given, found or configured
    #[error("Address not configured")]
    AddressNotConfigured,
}

impl OrchestratorError {
    /// Whether this is the cross-window conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, OrchestratorError::Conflict { .. })
    }
}
