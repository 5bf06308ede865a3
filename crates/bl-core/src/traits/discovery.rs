//! Device enumeration trait

use async_trait::async_trait;

use crate::error::DiscoveryError;
use crate::types::PortInfo;

/// Enumerates boards that could be connected to
#[async_trait]
pub trait DeviceDiscovery: Send + Sync {
    /// Every visible serial port
    async fn list_ports(&self) -> Result<Vec<PortInfo>, DiscoveryError>;

    /// Ports that look like supported boards, best candidate first.
    ///
    /// Ordering must be stable between calls.
    async fn list_boards(&self) -> Result<Vec<PortInfo>, DiscoveryError>;
}
