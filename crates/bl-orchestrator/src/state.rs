//! Collaborators the orchestrator drives

use std::sync::Arc;

use bl_core::config::SettingsProvider;
use bl_core::time::{Clock, SystemClock};
use bl_core::traits::{DeviceDiscovery, DeviceTransport, HostApi, Runner, SyncEngine, Terminal, View};

/// Everything outside the orchestrator, behind its trait
#[derive(Clone)]
pub struct Collaborators {
    /// Link to the board
    pub transport: Arc<dyn DeviceTransport>,
    /// File transfer engine
    pub sync_engine: Arc<dyn SyncEngine>,
    /// Code runner
    pub runner: Arc<dyn Runner>,
    /// Board enumeration
    pub discovery: Arc<dyn DeviceDiscovery>,
    /// Panel terminal
    pub terminal: Arc<dyn Terminal>,
    /// Panel view
    pub view: Arc<dyn View>,
    /// Editor integration
    pub host: Arc<dyn HostApi>,
    /// Merged settings
    pub settings: Arc<dyn SettingsProvider>,
    /// Wall clock for connection records
    pub clock: Arc<dyn Clock>,
}

impl Collaborators {
    /// Bundle collaborators using the system clock
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        transport: Arc<dyn DeviceTransport>,
        sync_engine: Arc<dyn SyncEngine>,
        runner: Arc<dyn Runner>,
        discovery: Arc<dyn DeviceDiscovery>,
        terminal: Arc<dyn Terminal>,
        view: Arc<dyn View>,
        host: Arc<dyn HostApi>,
        settings: Arc<dyn SettingsProvider>,
    ) -> Self {
        Self {
            transport,
            sync_engine,
            runner,
            discovery,
            terminal,
            view,
            host,
            settings,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}
