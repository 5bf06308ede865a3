//! Mock collaborators for orchestrator tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::Notify;

use bl_core::config::{BoardConfig, FileSettings, SettingsProvider};
use bl_core::error::{DiscoveryError, SyncError, TransportError};
use bl_core::time::ManualClock;
use bl_core::traits::{
    DeviceDiscovery, DeviceTransport, HostApi, Runner, SyncEngine, Terminal, TransportEvent,
    TransportSink, View,
};
use bl_core::types::{ButtonState, ConnectionStatus, NotifyLevel};
use bl_core::{Address, PortInfo, TransportKind};
use bl_orchestrator::{Collaborators, ConnectionOrchestrator, ConnectionStateStore};

pub const START: u64 = 1_700_000_000_000;

#[derive(Default)]
struct TransportState {
    sink: Option<TransportSink>,
    address: Option<Address>,
    connected: bool,
    connecting: bool,
    connects: Vec<Address>,
    disconnects: usize,
    inputs: Vec<String>,
    input_error: Option<TransportError>,
    commands: Vec<String>,
}

/// Transport whose outcomes are driven by the test
#[derive(Default)]
pub struct MockTransport {
    state: Mutex<TransportState>,
}

impl MockTransport {
    /// Report `event` through the sink of the latest connect
    pub fn emit(&self, event: TransportEvent) {
        let sink = {
            let mut state = self.state.lock().unwrap();
            match &event {
                TransportEvent::Connected => {
                    state.connected = true;
                    state.connecting = false;
                }
                TransportEvent::Error(_) | TransportEvent::Timeout => state.connecting = false,
                TransportEvent::Closed => {
                    state.connected = false;
                    state.connecting = false;
                }
                TransportEvent::Message(_) => {}
            }
            state.sink.clone()
        };
        if let Some(sink) = sink {
            sink.send(event);
        }
    }

    pub fn connects(&self) -> usize {
        self.state.lock().unwrap().connects.len()
    }

    pub fn connected_to(&self) -> Vec<Address> {
        self.state.lock().unwrap().connects.clone()
    }

    pub fn disconnects(&self) -> usize {
        self.state.lock().unwrap().disconnects
    }

    pub fn inputs(&self) -> Vec<String> {
        self.state.lock().unwrap().inputs.clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.lock().unwrap().commands.clone()
    }

    pub fn fail_input(&self, error: TransportError) {
        self.state.lock().unwrap().input_error = Some(error);
    }
}

#[async_trait]
impl DeviceTransport for MockTransport {
    fn kind(&self) -> TransportKind {
        self.state
            .lock()
            .unwrap()
            .address
            .as_ref()
            .map_or(TransportKind::Serial, |a| a.transport_kind())
    }

    fn connect(&self, address: &Address, sink: TransportSink) {
        let mut state = self.state.lock().unwrap();
        state.sink = Some(sink);
        state.address = Some(address.clone());
        state.connecting = true;
        state.connected = false;
        state.connects.push(address.clone());
    }

    async fn disconnect(&self) {
        let mut state = self.state.lock().unwrap();
        state.connected = false;
        state.connecting = false;
        state.disconnects += 1;
    }

    fn is_connecting(&self) -> bool {
        self.state.lock().unwrap().connecting
    }

    fn is_connected(&self) -> bool {
        self.state.lock().unwrap().connected
    }

    async fn send_user_input(&self, input: &str) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        state.inputs.push(input.to_string());
        match state.input_error.clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn send_wait_for_blocking(
        &self,
        command: &str,
        _wait_for: &str,
        _timeout: std::time::Duration,
    ) -> Result<(), TransportError> {
        self.state.lock().unwrap().commands.push(command.to_string());
        Ok(())
    }
}

/// Sync engine that finishes at once unless held
#[derive(Default)]
pub struct MockEngine {
    hold: AtomicBool,
    gate: Notify,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl MockEngine {
    /// Keep transfers running until `release`
    pub fn hold(&self) {
        self.hold.store(true, Ordering::SeqCst);
    }

    /// Let one held transfer finish
    pub fn release(&self) {
        self.gate.notify_one();
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    async fn transfer(&self) -> Result<(), SyncError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if self.hold.load(Ordering::SeqCst) {
            self.gate.notified().await;
        }
        Ok(())
    }
}

#[async_trait]
impl SyncEngine for MockEngine {
    async fn start(&self) -> Result<(), SyncError> {
        self.transfer().await
    }

    async fn start_receive(&self) -> Result<(), SyncError> {
        self.transfer().await
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct MockRunner {
    busy: AtomicBool,
    toggles: AtomicUsize,
    stops: AtomicUsize,
}

impl MockRunner {
    pub fn set_busy(&self, busy: bool) {
        self.busy.store(busy, Ordering::SeqCst);
    }

    pub fn toggles(&self) -> usize {
        self.toggles.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Runner for MockRunner {
    async fn toggle(&self) {
        self.toggles.fetch_add(1, Ordering::SeqCst);
        self.busy.fetch_xor(true, Ordering::SeqCst);
    }

    fn stop(&self) {
        self.busy.store(false, Ordering::SeqCst);
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct MockDiscovery {
    ports: Mutex<Vec<PortInfo>>,
    boards: Mutex<Vec<PortInfo>>,
    board_queries: AtomicUsize,
}

impl MockDiscovery {
    pub fn set_boards(&self, names: &[&str]) {
        *self.boards.lock().unwrap() = names
            .iter()
            .map(|name| PortInfo::new(*name, Some("Pycom".to_string())))
            .collect();
    }

    pub fn set_ports(&self, ports: &[(&str, Option<&str>)]) {
        *self.ports.lock().unwrap() = ports
            .iter()
            .map(|(name, manufacturer)| PortInfo::new(*name, manufacturer.map(String::from)))
            .collect();
    }

    pub fn board_queries(&self) -> usize {
        self.board_queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeviceDiscovery for MockDiscovery {
    async fn list_ports(&self) -> Result<Vec<PortInfo>, DiscoveryError> {
        Ok(self.ports.lock().unwrap().clone())
    }

    async fn list_boards(&self) -> Result<Vec<PortInfo>, DiscoveryError> {
        self.board_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.boards.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct MockTerminal {
    lines: Mutex<Vec<String>>,
    raw: Mutex<Vec<String>>,
    prompts: AtomicUsize,
    clears: AtomicUsize,
}

impl MockTerminal {
    pub fn contains(&self, line: &str) -> bool {
        self.count(line) > 0
    }

    pub fn count(&self, line: &str) -> usize {
        self.lines.lock().unwrap().iter().filter(|l| *l == line).count()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn raw(&self) -> Vec<String> {
        self.raw.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }

    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl Terminal for MockTerminal {
    fn write(&self, text: &str) {
        self.raw.lock().unwrap().push(text.to_string());
    }

    fn writeln(&self, text: &str) {
        self.lines.lock().unwrap().push(text.to_string());
    }

    fn write_prompt(&self) {
        self.prompts.fetch_add(1, Ordering::SeqCst);
    }

    fn enter(&self) {}

    fn clear(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct MockView {
    visible: AtomicBool,
    buttons: Mutex<Vec<ButtonState>>,
}

impl MockView {
    pub fn last_buttons(&self) -> Option<ButtonState> {
        self.buttons.lock().unwrap().last().copied()
    }
}

impl View for MockView {
    fn show(&self) {
        self.visible.store(true, Ordering::SeqCst);
    }

    fn hide(&self) {
        self.visible.store(false, Ordering::SeqCst);
    }

    fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    fn set_button_state(&self, state: ButtonState) {
        self.buttons.lock().unwrap().push(state);
    }
}

pub struct MockHost {
    project: String,
    clipboard: Mutex<Option<String>>,
    notifications: Mutex<Vec<(NotifyLevel, String)>>,
    settings_opened: AtomicUsize,
}

impl MockHost {
    pub fn new(project: &str) -> Self {
        Self {
            project: project.to_string(),
            clipboard: Mutex::new(None),
            notifications: Mutex::new(Vec::new()),
            settings_opened: AtomicUsize::new(0),
        }
    }

    pub fn clipboard(&self) -> Option<String> {
        self.clipboard.lock().unwrap().clone()
    }

    pub fn notifications(&self) -> Vec<(NotifyLevel, String)> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn settings_opened(&self) -> usize {
        self.settings_opened.load(Ordering::SeqCst)
    }
}

impl HostApi for MockHost {
    fn project_name(&self) -> String {
        self.project.clone()
    }

    fn write_clipboard(&self, text: &str) {
        *self.clipboard.lock().unwrap() = Some(text.to_string());
    }

    fn open_settings(&self) {
        self.settings_opened.fetch_add(1, Ordering::SeqCst);
    }

    fn notify(&self, level: NotifyLevel, text: &str) {
        self.notifications
            .lock()
            .unwrap()
            .push((level, text.to_string()));
    }
}

pub struct RigOptions {
    pub address: String,
    pub auto_connect: bool,
    pub project: String,
    pub first_run: bool,
}

impl Default for RigOptions {
    fn default() -> Self {
        Self {
            address: "192.168.4.1".to_string(),
            auto_connect: false,
            project: "mine".to_string(),
            first_run: false,
        }
    }
}

/// Mocks wired to one orchestrator, with a private state file
pub struct Rig {
    pub transport: Arc<MockTransport>,
    pub engine: Arc<MockEngine>,
    pub runner: Arc<MockRunner>,
    pub discovery: Arc<MockDiscovery>,
    pub terminal: Arc<MockTerminal>,
    pub view: Arc<MockView>,
    pub host: Arc<MockHost>,
    pub settings: Arc<FileSettings>,
    pub clock: Arc<ManualClock>,
    pub store: ConnectionStateStore,
    _dir: TempDir,
}

impl Rig {
    pub fn new(options: RigOptions) -> Self {
        let dir = TempDir::new().unwrap();

        let settings = if options.first_run {
            let settings = FileSettings::new(dir.path().join("config.toml"), None);
            settings
                .update_global(|config| {
                    config.address = options.address.clone();
                    config.auto_connect = options.auto_connect;
                })
                .unwrap();
            settings
        } else {
            FileSettings::in_memory(BoardConfig {
                address: options.address.clone(),
                auto_connect: options.auto_connect,
                ..Default::default()
            })
        };

        Self {
            transport: Arc::new(MockTransport::default()),
            engine: Arc::new(MockEngine::default()),
            runner: Arc::new(MockRunner::default()),
            discovery: Arc::new(MockDiscovery::default()),
            terminal: Arc::new(MockTerminal::default()),
            view: Arc::new(MockView::default()),
            host: Arc::new(MockHost::new(&options.project)),
            settings: Arc::new(settings),
            clock: Arc::new(ManualClock::new(START)),
            store: ConnectionStateStore::new(dir.path().join("connection_state.json")),
            _dir: dir,
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        let settings: Arc<dyn SettingsProvider> = self.settings.clone();
        Collaborators::new(
            self.transport.clone(),
            self.engine.clone(),
            self.runner.clone(),
            self.discovery.clone(),
            self.terminal.clone(),
            self.view.clone(),
            self.host.clone(),
            settings,
        )
        .with_clock(self.clock.clone())
    }

    pub fn orchestrator(&self) -> ConnectionOrchestrator {
        ConnectionOrchestrator::new(self.collaborators(), self.store.clone())
    }

    /// Make the panel visible without going through the orchestrator
    pub fn view_show(&self) {
        self.view.show();
    }

    /// Connect to `address` and complete the handshake
    pub async fn connect(&self, orch: &mut ConnectionOrchestrator, address: &str) {
        orch.connect(Some(Address::new(address))).await.unwrap();
        self.transport.emit(TransportEvent::Connected);
        orch.process_pending().await;
        assert_eq!(orch.status(), ConnectionStatus::Connected);
    }
}

/// Let spawned tasks run until they block
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

/// Move the paused clock forward, then settle
pub async fn advance(millis: u64) {
    tokio::time::sleep(std::time::Duration::from_millis(millis)).await;
    settle().await;
}
