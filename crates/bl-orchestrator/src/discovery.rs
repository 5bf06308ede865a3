//! Serial port enumeration

use async_trait::async_trait;
use serialport::SerialPortType;

use bl_core::config::Settings;
use bl_core::error::DiscoveryError;
use bl_core::traits::DeviceDiscovery;
use bl_core::PortInfo;

/// [`DeviceDiscovery`] backed by the platform serial port list.
///
/// Boards are the USB ports whose manufacturer is one of the configured
/// names, sorted by port name so the first candidate is stable.
#[derive(Debug, Clone)]
pub struct SerialPortDiscovery {
    manufacturers: Vec<String>,
}

impl SerialPortDiscovery {
    /// Recognise boards by these USB manufacturer names
    pub fn new(manufacturers: Vec<String>) -> Self {
        Self { manufacturers }
    }

    /// Use the manufacturer list from `settings`
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.config.autoconnect_manufacturers.clone())
    }
}

#[async_trait]
impl DeviceDiscovery for SerialPortDiscovery {
    async fn list_ports(&self) -> Result<Vec<PortInfo>, DiscoveryError> {
        tokio::task::spawn_blocking(enumerate)
            .await
            .map_err(|e| DiscoveryError::Task(e.to_string()))?
    }

    async fn list_boards(&self) -> Result<Vec<PortInfo>, DiscoveryError> {
        let ports = self.list_ports().await?;
        Ok(filter_boards(ports, &self.manufacturers))
    }
}

fn enumerate() -> Result<Vec<PortInfo>, DiscoveryError> {
    let ports =
        serialport::available_ports().map_err(|e| DiscoveryError::Enumeration(e.to_string()))?;

    let mut ports: Vec<PortInfo> = ports
        .into_iter()
        .map(|port| {
            let manufacturer = match port.port_type {
                SerialPortType::UsbPort(info) => info.manufacturer,
                _ => None,
            };
            PortInfo::new(port.port_name, manufacturer)
        })
        .collect();
    ports.sort_by(|a, b| a.name.cmp(&b.name));

    tracing::debug!("Enumerated {} serial port(s)", ports.len());
    Ok(ports)
}

/// Ports whose manufacturer matches one of `manufacturers`, order kept
pub fn filter_boards(ports: Vec<PortInfo>, manufacturers: &[String]) -> Vec<PortInfo> {
    ports
        .into_iter()
        .filter(|port| {
            port.manufacturer
                .as_deref()
                .map_or(false, |m| manufacturers.iter().any(|known| known == m))
        })
        .collect()
}
