//! Collaborator traits
//!
//! The orchestrator drives the device, the sync engine, the runner and the
//! host UI only through these interfaces.

mod discovery;
mod host;
mod sync;
mod transport;

pub use discovery::DeviceDiscovery;
pub use host::{HostApi, Terminal, View};
pub use sync::{Runner, SyncEngine};
pub use transport::{DeviceTransport, TransportEvent, TransportSink};
