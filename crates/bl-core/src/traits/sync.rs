//! File sync and code runner traits

use async_trait::async_trait;

use crate::error::SyncError;

/// Transfers project files to and from the board
#[async_trait]
pub trait SyncEngine: Send + Sync {
    /// Upload the project folder, resolving when the transfer ends
    async fn start(&self) -> Result<(), SyncError>;

    /// Download the board's files into the project, resolving when done
    async fn start_receive(&self) -> Result<(), SyncError>;

    /// Ask the running transfer to stop after its current action
    fn stop(&self);
}

/// Runs the current file on the board
#[async_trait]
pub trait Runner: Send + Sync {
    /// Start running, or stop if already running
    async fn toggle(&self);

    /// Stop any running code
    fn stop(&self);

    /// Code is currently running
    fn is_busy(&self) -> bool;
}
