//! Device transport traits

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::TransportError;
use crate::types::{Address, TransportKind};

/// Outcome reported by a transport after `connect` was called
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Handshake finished, the board is ready
    Connected,
    /// An I/O error, before or after the handshake
    Error(String),
    /// The handshake did not finish in time
    Timeout,
    /// Output from the board
    Message(String),
    /// The transport lost the board on its own
    Closed,
}

/// Where a transport reports the events of one connect attempt.
///
/// Each `connect` call gets its own sink; events delivered through the sink of
/// an abandoned attempt are dropped by the receiver.
#[derive(Clone)]
pub struct TransportSink {
    deliver: Arc<dyn Fn(TransportEvent) + Send + Sync>,
}

impl TransportSink {
    /// Wrap a delivery function
    pub fn new(deliver: impl Fn(TransportEvent) + Send + Sync + 'static) -> Self {
        Self {
            deliver: Arc::new(deliver),
        }
    }

    /// Report an arbitrary event
    pub fn send(&self, event: TransportEvent) {
        (self.deliver)(event);
    }

    /// The handshake succeeded
    pub fn connected(&self) {
        self.send(TransportEvent::Connected);
    }

    /// An error occurred
    pub fn error(&self, message: impl Into<String>) {
        self.send(TransportEvent::Error(message.into()));
    }

    /// The handshake timed out
    pub fn timeout(&self) {
        self.send(TransportEvent::Timeout);
    }

    /// The board printed something
    pub fn message(&self, text: impl Into<String>) {
        self.send(TransportEvent::Message(text.into()));
    }

    /// The connection dropped
    pub fn closed(&self) {
        self.send(TransportEvent::Closed);
    }
}

impl fmt::Debug for TransportSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportSink").finish_non_exhaustive()
    }
}

/// A channel to one board (serial REPL or telnet)
#[async_trait]
pub trait DeviceTransport: Send + Sync {
    /// Kind of the current (or last) connection
    fn kind(&self) -> TransportKind;

    /// Start connecting to `address`.
    ///
    /// Returns immediately; progress is reported through `sink`.
    fn connect(&self, address: &Address, sink: TransportSink);

    /// Tear the connection down, resolving once it is closed
    async fn disconnect(&self);

    /// A handshake is in progress
    fn is_connecting(&self) -> bool;

    /// The board is connected
    fn is_connected(&self) -> bool;

    /// Forward keyboard input to the board's REPL
    async fn send_user_input(&self, input: &str) -> Result<(), TransportError>;

    /// Send a command and wait until `wait_for` is echoed back
    async fn send_wait_for_blocking(
        &self,
        command: &str,
        wait_for: &str,
        timeout: Duration,
    ) -> Result<(), TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_sink_delivers_events_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let sink = TransportSink::new(move |event| seen_clone.lock().unwrap().push(event));

        sink.message(">>> ");
        sink.connected();
        sink.error("port busy");
        sink.timeout();
        sink.closed();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                TransportEvent::Message(">>> ".into()),
                TransportEvent::Connected,
                TransportEvent::Error("port busy".into()),
                TransportEvent::Timeout,
                TransportEvent::Closed,
            ]
        );
    }
}
