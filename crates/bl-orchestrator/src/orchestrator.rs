//! Connection orchestrator
//!
//! The orchestrator owns the connection state machine
//!
//! ```text
//! Disconnected -> Connecting -> Connected -> Disconnecting -> Disconnected
//!                     \________________________________________/
//!                          error, timeout or cancel
//! ```
//!
//! and is the single consumer of the event queue. Transport outcomes, timer
//! ticks, scan results and background completions are all events, so state is
//! only ever mutated from [`ConnectionOrchestrator::dispatch`].
//!
//! Cross-window exclusion goes through the [`ConnectionStateStore`]: a
//! connected window refreshes its record on every heartbeat, and a connect is
//! refused while another project holds a record younger than the staleness
//! window.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

use bl_core::config::Settings;
use bl_core::error::{ConfigError, SyncError, TransportError};
use bl_core::traits::{TransportEvent, TransportSink};
use bl_core::types::{ButtonState, ConnectionStatus, NotifyLevel};
use bl_core::{Address, SyncDirection};

use crate::error::OrchestratorError;
use crate::event::{Command, Event, ScanReport};
use crate::messages;
use crate::scanner::{select_candidate, AutoconnectScanner, CurrentConnection, ScanTransition, Selection};
use crate::state::Collaborators;
use crate::store::ConnectionStateStore;
use crate::sync::{SyncRejection, SyncSessionManager};
use crate::timer::TimerHandle;

/// Sends commands to a running orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorHandle {
    events: UnboundedSender<Event>,
}

impl OrchestratorHandle {
    /// Queue a command; `false` once the orchestrator is gone
    pub fn send(&self, command: Command) -> bool {
        self.events.send(Event::Command(command)).is_ok()
    }

    /// Queue a connect
    pub fn connect(&self, address: Option<Address>) -> bool {
        self.send(Command::Connect(address))
    }

    /// Queue a disconnect
    pub fn disconnect(&self) -> bool {
        self.send(Command::Disconnect)
    }
}

/// The connection and synchronization state machine
pub struct ConnectionOrchestrator {
    ctx: Collaborators,
    store: ConnectionStateStore,
    status: ConnectionStatus,
    /// Target of the current or last connect attempt
    address: Option<Address>,
    /// Bumped on every connect and disconnect; stamps transport events
    attempt: u64,
    heartbeat: TimerHandle,
    reconnect: TimerHandle,
    scanner: AutoconnectScanner,
    sync: SyncSessionManager,
    /// Connect normally if the next scan does not find a board
    connect_after_scan: bool,
    first_time_start: bool,
    input: Option<UnboundedSender<String>>,
    events_tx: UnboundedSender<Event>,
    events_rx: UnboundedReceiver<Event>,
}

impl ConnectionOrchestrator {
    /// Create a disconnected orchestrator
    pub fn new(ctx: Collaborators, store: ConnectionStateStore) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let settings = ctx.settings.settings();

        let scanner = AutoconnectScanner::new(
            Arc::clone(&ctx.discovery),
            events_tx.clone(),
            settings.timing().autoconnect_interval,
        );
        let sync = SyncSessionManager::new(Arc::clone(&ctx.sync_engine), events_tx.clone());
        let first_time_start = !ctx.settings.settings_exist();

        Self {
            ctx,
            store,
            status: ConnectionStatus::Disconnected,
            address: None,
            attempt: 0,
            heartbeat: TimerHandle::new(),
            reconnect: TimerHandle::new(),
            scanner,
            sync,
            connect_after_scan: false,
            first_time_start,
            input: None,
            events_tx,
            events_rx,
        }
    }

    /// Handle for queueing commands from other tasks
    pub fn handle(&self) -> OrchestratorHandle {
        OrchestratorHandle {
            events: self.events_tx.clone(),
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Target of the current or last connect attempt
    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    pub fn is_synchronizing(&self) -> bool {
        self.sync.is_active()
    }

    pub fn sync_direction(&self) -> Option<SyncDirection> {
        self.sync.direction()
    }

    /// The autoconnect scanner is polling
    pub fn is_scanning(&self) -> bool {
        self.scanner.is_running()
    }

    /// Cached autoconnect candidate
    pub fn autoconnect_candidate(&self) -> Option<&Address> {
        self.scanner.candidate()
    }

    /// The heartbeat timer is armed
    pub fn heartbeat_armed(&self) -> bool {
        self.heartbeat.is_armed()
    }

    /// A reconnect is scheduled
    pub fn reconnect_pending(&self) -> bool {
        self.reconnect.is_armed()
    }

    /// Consume events until `cancel` fires, then disconnect
    pub async fn run(mut self, cancel: CancellationToken) {
        tracing::info!("Orchestrator started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Orchestrator shutting down");
                    break;
                }
                event = self.events_rx.recv() => match event {
                    Some(event) => self.dispatch(event).await,
                    None => break,
                },
            }
        }

        self.shutdown().await;
    }

    /// Handle every event already queued, returning how many were handled.
    ///
    /// Events queued while handling are handled too.
    pub async fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.dispatch(event).await;
            handled += 1;
        }
        handled
    }

    /// Stop polling and drop the connection
    pub async fn shutdown(&mut self) {
        self.scanner.stop();
        self.connect_after_scan = false;
        self.disconnect().await;
    }

    /// Handle one event
    pub async fn dispatch(&mut self, event: Event) {
        match event {
            Event::Command(command) => self.execute(command).await,
            Event::Transport { attempt, event } => {
                if attempt != self.attempt {
                    tracing::debug!("Dropping {:?} from abandoned attempt {}", event, attempt);
                    return;
                }
                self.on_transport_event(event).await;
            }
            Event::Heartbeat { generation } => self.on_heartbeat(generation),
            Event::Scan(report) => self.on_scan(report).await,
            Event::SyncFinished { session, result } => self.on_sync_finished(session, result),
            Event::RunnerToggled => self.refresh_buttons(),
            Event::UserInputFailed(e) => self.on_user_input_failed(e).await,
            Event::Reconnect { generation } => {
                if !self.reconnect.is_current(generation) {
                    return;
                }
                self.reconnect.cancel();
                tracing::info!("Reconnecting after sync");
                let result = self.connect(None).await;
                log_refusal(result);
            }
        }
    }

    /// Run one user or host command
    pub async fn execute(&mut self, command: Command) {
        tracing::debug!("Command: {:?}", command);
        match command {
            Command::Connect(address) => log_refusal(self.connect(address).await),
            Command::Disconnect => self.disconnect().await,
            Command::ToggleConnect => match self.status {
                ConnectionStatus::Connected | ConnectionStatus::Connecting => {
                    self.disconnect().await
                }
                _ => log_refusal(self.connect(None).await),
            },
            Command::Upload => log_refusal(self.toggle_sync(SyncDirection::Upload)),
            Command::Download => log_refusal(self.toggle_sync(SyncDirection::Download)),
            Command::Run => log_refusal(self.run_code()),
            Command::GetVersion => log_refusal(self.get_version()),
            Command::GetWifiMac => log_refusal(self.get_wifi_mac()),
            Command::GetSerialPorts => self.list_serial_ports().await,
            Command::Help => self.write_help_text(),
            Command::ClearTerminal => self.ctx.terminal.clear(),
            Command::TogglePanel => {
                if self.ctx.view.is_visible() {
                    self.hide_panel().await
                } else {
                    self.show_panel().await
                }
            }
            Command::ShowPanel => self.show_panel().await,
            Command::HidePanel => self.hide_panel().await,
            Command::TerminalClick => {
                if !matches!(
                    self.status,
                    ConnectionStatus::Connected | ConnectionStatus::Connecting
                ) {
                    tracing::debug!("Connecting because of terminal click");
                    log_refusal(self.connect(None).await);
                }
            }
            Command::UserInput(input) => self.send_user_input(input),
            Command::ProjectChanged(root) => self.project_changed(root).await,
            Command::ReloadSettings => self.reload_settings(),
            Command::AutoconnectChanged => self.autoconnect_changed().await,
            Command::OpenGlobalSettings => self.ctx.host.open_settings(),
        }
    }

    /// Connect to `address`, or to the resolved address when `None`.
    ///
    /// Refused with [`OrchestratorError::Conflict`] while another project
    /// holds a live record for the address.
    pub async fn connect(&mut self, address: Option<Address>) -> Result<(), OrchestratorError> {
        tracing::info!("Connecting...");
        let settings = self.ctx.settings.settings();

        if self.first_time_start {
            self.first_time_start = false;
            self.ctx.host.open_settings();
            self.write_get_started_text().await;
        }

        let address = match address {
            Some(address) => Some(address),
            None => self.resolve_address(&settings).await,
        };
        let Some(address) = address else {
            if !settings.auto_connect() {
                self.ctx.terminal.writeln(messages::ADDRESS_NOT_CONFIGURED);
            }
            return Err(OrchestratorError::AddressNotConfigured);
        };

        let project = self.ctx.host.project_name();
        let now = self.ctx.clock.now_millis();
        if let Some(record) = self.store.get(&address) {
            if record.conflicts_with(&project, now, settings.timing().staleness_window) {
                let message = messages::conflict(&record.project);
                tracing::info!(
                    "{} is held by project '{}' (record age {} ms)",
                    address,
                    record.project,
                    record.age(now)
                );
                self.ctx.terminal.writeln(&message);
                self.ctx.host.notify(NotifyLevel::Warning, &message);
                return Err(OrchestratorError::Conflict {
                    address,
                    project: record.project,
                });
            }
        }

        if matches!(
            self.status,
            ConnectionStatus::Connected | ConnectionStatus::Connecting
        ) {
            tracing::info!("Still connected or connecting... disconnecting first");
            self.disconnect().await;
        }

        self.ctx
            .terminal
            .writeln(&messages::connecting(address.as_str(), settings.auto_connect()));

        self.attempt += 1;
        self.status = ConnectionStatus::Connecting;
        self.address = Some(address.clone());
        let sink = self.transport_sink(self.attempt);
        self.ctx.transport.connect(&address, sink);
        self.refresh_buttons();
        Ok(())
    }

    /// Tear the connection down; safe from any state
    pub async fn disconnect(&mut self) {
        tracing::info!("Disconnecting...");
        if self.status == ConnectionStatus::Connecting || self.ctx.transport.is_connecting() {
            self.ctx.terminal.writeln(messages::ATTEMPT_CANCELED);
        }

        self.heartbeat.cancel();
        self.reconnect.cancel();
        self.release_record();

        // Late events of the torn down attempt are dropped
        self.attempt += 1;
        self.status = ConnectionStatus::Disconnecting;

        self.sync.abandon();
        self.ctx.runner.stop();
        self.ctx.transport.disconnect().await;

        self.status = ConnectionStatus::Disconnected;
        self.refresh_buttons();
    }

    /// Start a sync session, or stop the active one
    pub fn toggle_sync(&mut self, direction: SyncDirection) -> Result<(), OrchestratorError> {
        if self.sync.is_active() {
            self.stop_sync();
            return Ok(());
        }
        self.start_sync(direction)
    }

    /// Start a sync session
    pub fn start_sync(&mut self, direction: SyncDirection) -> Result<(), OrchestratorError> {
        match self
            .sync
            .start(direction, self.status, self.ctx.runner.is_busy())
        {
            Ok(_) => {
                self.refresh_buttons();
                Ok(())
            }
            Err(SyncRejection::NotConnected) => {
                self.ctx.terminal.writeln(messages::NOT_CONNECTED);
                Err(SyncRejection::NotConnected.into())
            }
            Err(rejection) => {
                tracing::debug!("Not starting {}: {}", direction, rejection);
                Err(rejection.into())
            }
        }
    }

    /// Ask the active sync session to stop; `false` if none is active
    pub fn stop_sync(&mut self) -> bool {
        match self.sync.stop() {
            Some(direction) => {
                self.ctx.terminal.writeln(&messages::stopping(direction));
                self.refresh_buttons();
                true
            }
            None => false,
        }
    }

    /// Run the current file, or stop it
    pub fn run_code(&mut self) -> Result<(), OrchestratorError> {
        if self.status != ConnectionStatus::Connected {
            self.ctx.terminal.writeln(messages::NOT_CONNECTED);
            return Err(OrchestratorError::NotConnected);
        }
        if self.sync.is_active() {
            tracing::debug!("Not running code while synchronizing");
            return Err(OrchestratorError::RunRejected);
        }

        let runner = Arc::clone(&self.ctx.runner);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            runner.toggle().await;
            let _ = events.send(Event::RunnerToggled);
        });
        Ok(())
    }

    /// Print the firmware version
    pub fn get_version(&self) -> Result<(), OrchestratorError> {
        self.device_command(
            messages::VERSION_COMMAND.to_string(),
            messages::VERSION_COMMAND,
            messages::VERSION_TIMEOUT,
        )
    }

    /// Print the WiFi access point name
    pub fn get_wifi_mac(&self) -> Result<(), OrchestratorError> {
        self.device_command(
            format!("{}\n\r", messages::WIFI_MAC_COMMAND),
            messages::WIFI_MAC_COMMAND,
            messages::WIFI_MAC_TIMEOUT,
        )
    }

    /// List every serial port, copying the first one to the clipboard
    pub async fn list_serial_ports(&self) {
        self.ctx.terminal.enter();
        match self.ctx.discovery.list_ports().await {
            Ok(ports) => {
                self.ctx.terminal.writeln(&messages::ports_found(ports.len()));
                for (i, port) in ports.iter().enumerate() {
                    let mut text = port.display_name();
                    if i == 0 {
                        self.ctx.host.write_clipboard(&port.name);
                        text.push_str(" (copied to clipboard)");
                    }
                    self.ctx.terminal.writeln(&text);
                }
            }
            Err(e) => {
                tracing::warn!("Failed to list serial ports: {}", e);
                self.ctx
                    .terminal
                    .writeln(&format!("Failed to list serial ports: {}", e));
            }
        }
    }

    /// Show the panel and connect, through autoconnect when enabled
    pub async fn show_panel(&mut self) {
        self.ctx.view.show();
        self.refresh_buttons();

        if self.ctx.settings.settings().auto_connect() && self.start_autoconnect(true) {
            return;
        }
        log_refusal(self.connect(None).await);
    }

    /// Hide the panel, stop polling and disconnect
    pub async fn hide_panel(&mut self) {
        self.ctx.view.hide();
        tracing::debug!("Hiding panel and disconnecting");
        self.stop_autoconnect().await;
        self.disconnect().await;
    }

    /// Start polling for boards; only while the panel is visible.
    ///
    /// With `connect_on_miss`, a first scan that finds no new board is
    /// followed by a normal connect. Returns whether the scanner started.
    pub fn start_autoconnect(&mut self, connect_on_miss: bool) -> bool {
        if !self.ctx.view.is_visible() {
            return false;
        }

        tracing::info!("Starting autoconnect interval...");
        let period = self.ctx.settings.settings().timing().autoconnect_interval;
        self.scanner.set_period(period);
        self.scanner.start();
        self.connect_after_scan = connect_on_miss;
        true
    }

    /// Stop polling; drop a connection that came from autoconnect
    pub async fn stop_autoconnect(&mut self) {
        let was_running = self.scanner.is_running();
        let cached = self.scanner.stop();
        self.connect_after_scan = false;

        let previous = if was_running {
            cached
        } else {
            self.address.clone()
        };
        let configured = self.ctx.settings.settings().address();

        if previous != configured
            && matches!(
                self.status,
                ConnectionStatus::Connected | ConnectionStatus::Connecting
            )
        {
            tracing::info!("Disconnecting from previous autoconnect address");
            self.disconnect().await;
        }
    }

    async fn resolve_address(&self, settings: &Settings) -> Option<Address> {
        if settings.auto_connect() {
            if let Some(candidate) = self.scanner.candidate() {
                tracing::info!("Using autoconnect address: {}", candidate);
                return Some(candidate.clone());
            }
            match self.scanner.query(self.current_connection()).await {
                Selection::Report(Some(address)) | Selection::Adopt(address) => {
                    return Some(address)
                }
                Selection::Keep => return self.address.clone(),
                Selection::Report(None) => {}
            }
        }
        settings.address()
    }

    fn current_connection(&self) -> Option<CurrentConnection<'_>> {
        if self.status != ConnectionStatus::Connected {
            return None;
        }
        self.address.as_ref().map(|address| CurrentConnection {
            address,
            kind: self.ctx.transport.kind(),
        })
    }

    fn transport_sink(&self, attempt: u64) -> TransportSink {
        let events = self.events_tx.clone();
        TransportSink::new(move |event| {
            let _ = events.send(Event::Transport { attempt, event });
        })
    }

    async fn on_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected => {
                if self.status != ConnectionStatus::Connecting {
                    tracing::debug!("Ignoring connect outside of an attempt");
                    return;
                }
                let Some(address) = self.address.clone() else {
                    return;
                };

                tracing::info!("Connected to {}", address);
                self.status = ConnectionStatus::Connected;
                self.claim(&address);

                let period = self.ctx.settings.settings().timing().heartbeat_interval;
                self.heartbeat
                    .arm_interval(period, self.events_tx.clone(), |generation| {
                        Event::Heartbeat { generation }
                    });
                self.refresh_buttons();
            }
            TransportEvent::Error(message) => {
                let message = if message.is_empty() {
                    "Unknown error".to_string()
                } else {
                    message
                };
                match self.status {
                    ConnectionStatus::Connected => {
                        tracing::warn!("An error occurred: {}", message);
                        if self.sync.is_active() {
                            self.ctx
                                .terminal
                                .writeln(&format!("An error occurred: {}", message));
                            tracing::warn!("Synchronizing, stopping sync");
                            self.sync.stop();
                        }
                    }
                    ConnectionStatus::Connecting => {
                        tracing::info!("Connect failed: {}", message);
                        self.status = ConnectionStatus::Disconnected;
                        self.ctx.terminal.writeln(&messages::connect_failed(&message));
                        self.refresh_buttons();
                    }
                    _ => tracing::debug!("Ignoring transport error while {}: {}", self.status, message),
                }
            }
            TransportEvent::Timeout => {
                if self.status == ConnectionStatus::Connecting {
                    tracing::info!("Connect timed out");
                    self.status = ConnectionStatus::Disconnected;
                    self.ctx.terminal.writeln(messages::CONNECT_TIMED_OUT);
                    self.refresh_buttons();
                }
            }
            TransportEvent::Message(text) => {
                if !self.sync.is_active() {
                    self.ctx.terminal.write(&text);
                }
            }
            TransportEvent::Closed => {
                if !matches!(
                    self.status,
                    ConnectionStatus::Connected | ConnectionStatus::Connecting
                ) {
                    return;
                }
                tracing::info!("Transport closed the connection");
                self.heartbeat.cancel();
                self.release_record();
                self.sync.abandon();
                self.status = ConnectionStatus::Disconnected;
                self.refresh_buttons();
            }
        }
    }

    fn on_heartbeat(&mut self, generation: u64) {
        if !self.heartbeat.is_current(generation) {
            return;
        }

        if self.status == ConnectionStatus::Connected && self.ctx.transport.is_connected() {
            if let Some(address) = self.address.clone() {
                self.claim(&address);
            }
        } else {
            tracing::debug!("Connection gone, stopping heartbeat");
            self.heartbeat.cancel();
        }
    }

    async fn on_scan(&mut self, report: ScanReport) {
        if !self.scanner.is_current(&report) {
            tracing::debug!("Dropping scan from stale generation {}", report.generation);
            return;
        }
        if !self.ctx.settings.settings().auto_connect() {
            return;
        }

        let selection = select_candidate(&report.boards, self.current_connection());
        let mut emitted = false;

        match self.scanner.record(selection) {
            ScanTransition::NothingFound => {
                self.ctx.terminal.writeln(messages::NO_BOARDS_FOUND);
            }
            ScanTransition::Found(address) => {
                self.ctx.terminal.writeln(messages::BOARD_FOUND);
                emitted = true;
                tracing::info!("Autoconnect found {}, connecting", address);
                log_refusal(self.connect(Some(address)).await);
            }
            ScanTransition::Lost(previous) => {
                let connected_to_previous = self.address.as_ref() == Some(&previous)
                    && matches!(
                        self.status,
                        ConnectionStatus::Connected | ConnectionStatus::Connecting
                    );
                if connected_to_previous {
                    self.disconnect().await;
                }
                self.ctx.terminal.writeln(messages::BOARD_LOST);
            }
            ScanTransition::Unchanged => {
                tracing::trace!("Autoconnect: no change");
            }
        }

        if std::mem::take(&mut self.connect_after_scan) && !emitted {
            tracing::debug!("No address from autoconnect, connecting normally");
            log_refusal(self.connect(None).await);
        }
    }

    fn on_sync_finished(&mut self, session: u64, result: Result<(), SyncError>) {
        let Some(finished) = self.sync.finish(session, &result) else {
            return;
        };
        self.refresh_buttons();

        if !self.ctx.transport.kind().is_serial() {
            let delay = self
                .ctx
                .settings
                .settings()
                .timing()
                .reconnect_after_sync_delay;
            tracing::info!(
                "Reconnecting in {:?} after {} over the network",
                delay,
                finished.direction
            );
            self.reconnect
                .arm_once(delay, self.events_tx.clone(), |generation| {
                    Event::Reconnect { generation }
                });
        }
    }

    async fn on_user_input_failed(&mut self, e: TransportError) {
        if e.is_timeout() {
            tracing::warn!("User input timeout, disconnecting");
            self.disconnect().await;
        } else {
            tracing::debug!("Failed to forward user input: {}", e);
        }
    }

    /// Forward input in order through a dedicated task
    fn send_user_input(&mut self, input: String) {
        let sender = match &self.input {
            Some(sender) if !sender.is_closed() => sender.clone(),
            _ => {
                let sender = spawn_input_forwarder(self.ctx.clone(), self.events_tx.clone());
                self.input = Some(sender.clone());
                sender
            }
        };
        let _ = sender.send(input);
    }

    async fn project_changed(&mut self, root: Option<PathBuf>) {
        let before = self.ctx.settings.settings().address();
        if let Err(e) = self.ctx.settings.set_project_root(root) {
            self.report_settings_error(e);
        }

        if self.ctx.settings.settings().address() != before {
            tracing::info!("Project changed, address changed, connecting again");
            log_refusal(self.connect(None).await);
        }
    }

    fn reload_settings(&mut self) {
        if let Err(e) = self.ctx.settings.reload() {
            self.report_settings_error(e);
        }
        self.scanner
            .set_period(self.ctx.settings.settings().timing().autoconnect_interval);
    }

    async fn autoconnect_changed(&mut self) {
        let enabled = self.ctx.settings.settings().auto_connect();
        tracing::info!("auto_connect setting changed to {}", enabled);

        if enabled && self.ctx.view.is_visible() {
            self.start_autoconnect(false);
        } else {
            self.stop_autoconnect().await;
            log_refusal(self.connect(None).await);
        }
    }

    fn report_settings_error(&self, e: ConfigError) {
        match e {
            ConfigError::Json(e) => {
                tracing::warn!("Project config format error: {}", e);
                self.ctx.terminal.writeln(messages::PROJECT_FORMAT_ERROR);
                if self.status == ConnectionStatus::Connected {
                    self.ctx.terminal.write_prompt();
                }
            }
            e => tracing::warn!("Failed to load settings: {}", e),
        }
    }

    fn device_command(
        &self,
        command: String,
        wait_for: &'static str,
        timeout: Duration,
    ) -> Result<(), OrchestratorError> {
        if self.status != ConnectionStatus::Connected {
            self.ctx.terminal.writeln(messages::NOT_CONNECTED);
            return Err(OrchestratorError::NotConnected);
        }

        let transport = Arc::clone(&self.ctx.transport);
        tokio::spawn(async move {
            if let Err(e) = transport
                .send_wait_for_blocking(&command, wait_for, timeout)
                .await
            {
                tracing::error!("Failed to send command: {} ({})", command.trim_end(), e);
            }
        });
        Ok(())
    }

    fn write_help_text(&self) {
        self.ctx.terminal.enter();
        self.ctx.terminal.write(messages::HELP_TEXT);
        if self.status == ConnectionStatus::Connected {
            self.ctx.terminal.write_prompt();
        }
    }

    async fn write_get_started_text(&self) {
        self.ctx.terminal.enter();
        self.ctx.terminal.write(messages::START_TEXT);

        let has_ports = match self.ctx.discovery.list_ports().await {
            Ok(ports) => !ports.is_empty(),
            Err(e) => {
                tracing::debug!("Port listing failed: {}", e);
                false
            }
        };
        if has_ports {
            self.ctx.terminal.writeln(messages::PORTS_INTRO);
            self.list_serial_ports().await;
        } else if self.status == ConnectionStatus::Connected {
            self.ctx.terminal.enter();
            self.ctx.terminal.write_prompt();
        }
    }

    fn claim(&self, address: &Address) {
        let project = self.ctx.host.project_name();
        let now = self.ctx.clock.now_millis();
        if let Err(e) = self.store.claim(address, &project, now) {
            tracing::warn!("Failed to record connection to {}: {}", address, e);
        }
    }

    fn release_record(&self) {
        let Some(address) = &self.address else {
            return;
        };
        let project = self.ctx.host.project_name();
        if let Err(e) = self.store.release_owned(address, &project) {
            tracing::warn!("Failed to clear connection record for {}: {}", address, e);
        }
    }

    fn refresh_buttons(&self) {
        self.ctx.view.set_button_state(ButtonState {
            runner_busy: self.ctx.runner.is_busy(),
            synchronizing: self.sync.is_active(),
            sync_direction: self.sync.direction(),
        });
    }
}

fn spawn_input_forwarder(ctx: Collaborators, events: UnboundedSender<Event>) -> UnboundedSender<String> {
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    tokio::spawn(async move {
        while let Some(input) = rx.recv().await {
            if let Err(e) = ctx.transport.send_user_input(&input).await {
                if events.send(Event::UserInputFailed(e)).is_err() {
                    break;
                }
            }
        }
    });
    tx
}

fn log_refusal(result: Result<(), OrchestratorError>) {
    if let Err(e) = result {
        tracing::debug!("Request refused: {}", e);
    }
}
