//! bl-orchestrator: Connection and synchronization scheduling for boards
//!
//! The orchestrator decides when to connect, when to autoconnect to a board
//! plugged in over USB, and when an upload, download or run may proceed. It
//! arbitrates between editor windows addressing the same board through a
//! small shared state file, and drives the transport, sync engine, runner
//! and host UI through the traits in [`bl_core::traits`].

pub mod discovery;
pub mod error;
pub mod event;
pub mod messages;
pub mod orchestrator;
pub mod scanner;
pub mod state;
pub mod store;
pub mod sync;
pub mod timer;

pub use discovery::SerialPortDiscovery;
pub use error::OrchestratorError;
pub use event::{Command, Event, ScanReport};
pub use orchestrator::{ConnectionOrchestrator, OrchestratorHandle};
pub use scanner::{AutoconnectScanner, ScanTransition, Selection};
pub use state::Collaborators;
pub use store::{ConnectionRecord, ConnectionState, ConnectionStateStore};
pub use sync::{SyncRejection, SyncSession, SyncSessionManager};
pub use timer::TimerHandle;
