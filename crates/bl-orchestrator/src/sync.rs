//! File sync sessions
//!
//! At most one upload or download runs at a time. The transfer itself runs
//! in a spawned task driving the [`SyncEngine`]; its completion comes back to
//! the orchestrator as [`Event::SyncFinished`] tagged with the session id, so
//! a completion from an abandoned session is recognised and ignored.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

use bl_core::error::SyncError;
use bl_core::traits::SyncEngine;
use bl_core::types::ConnectionStatus;
use bl_core::SyncDirection;

use crate::event::Event;

/// Why a sync session was not started
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncRejection {
    /// No board is connected
    #[error("not connected")]
    NotConnected,

    /// Another session is running
    #[error("a {0} is already running")]
    AlreadyActive(SyncDirection),

    /// The runner is executing code
    #[error("code is running")]
    RunnerBusy,
}

/// The running session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSession {
    /// Session id, unique per manager
    pub id: u64,
    /// Transfer direction
    pub direction: SyncDirection,
    /// A stop was requested
    pub stopping: bool,
}

/// Starts, stops and tracks sync sessions
pub struct SyncSessionManager {
    engine: Arc<dyn SyncEngine>,
    events: UnboundedSender<Event>,
    active: Option<SyncSession>,
    next_id: u64,
}

impl SyncSessionManager {
    /// Manager posting completions to `events`
    pub fn new(engine: Arc<dyn SyncEngine>, events: UnboundedSender<Event>) -> Self {
        Self {
            engine,
            events,
            active: None,
            next_id: 1,
        }
    }

    /// Start a transfer.
    ///
    /// Requires a connected board, no running session and an idle runner.
    pub fn start(
        &mut self,
        direction: SyncDirection,
        status: ConnectionStatus,
        runner_busy: bool,
    ) -> Result<u64, SyncRejection> {
        if status != ConnectionStatus::Connected {
            return Err(SyncRejection::NotConnected);
        }
        if let Some(session) = &self.active {
            return Err(SyncRejection::AlreadyActive(session.direction));
        }
        if runner_busy {
            return Err(SyncRejection::RunnerBusy);
        }

        let id = self.next_id;
        self.next_id += 1;
        self.active = Some(SyncSession {
            id,
            direction,
            stopping: false,
        });

        let engine = Arc::clone(&self.engine);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = match direction {
                SyncDirection::Upload => engine.start().await,
                SyncDirection::Download => engine.start_receive().await,
            };
            let _ = events.send(Event::SyncFinished {
                session: id,
                result,
            });
        });

        tracing::info!("Started {} session {}", direction, id);
        Ok(id)
    }

    /// Ask the running transfer to stop after its current action.
    ///
    /// The session stays active until the engine reports completion. Returns
    /// the direction of the session, if any.
    pub fn stop(&mut self) -> Option<SyncDirection> {
        let session = self.active.as_mut()?;
        if !session.stopping {
            session.stopping = true;
            self.engine.stop();
            tracing::info!("Stopping {} session {}", session.direction, session.id);
        }
        Some(session.direction)
    }

    /// Record the completion of `session`.
    ///
    /// Returns the finished session when it was the active one.
    pub fn finish(&mut self, session: u64, result: &Result<(), SyncError>) -> Option<SyncSession> {
        match &self.active {
            Some(active) if active.id == session => {}
            _ => {
                tracing::debug!("Ignoring completion of inactive sync session {}", session);
                return None;
            }
        }

        let finished = self.active.take();
        if let Some(finished) = &finished {
            match result {
                Ok(()) => tracing::info!("{} session {} finished", finished.direction, session),
                Err(e) => tracing::warn!("{} session {} failed: {}", finished.direction, session, e),
            }
        }
        finished
    }

    /// Drop the active session without waiting for the engine
    pub fn abandon(&mut self) -> Option<SyncSession> {
        let session = self.active.take()?;
        if !session.stopping {
            self.engine.stop();
        }
        tracing::info!("Abandoned {} session {}", session.direction, session.id);
        Some(session)
    }

    /// A session is running
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Direction of the running session
    pub fn direction(&self) -> Option<SyncDirection> {
        self.active.as_ref().map(|s| s.direction)
    }

    #[cfg(test)]
    fn active(&self) -> Option<&SyncSession> {
        self.active.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::{mpsc, Notify};

    #[derive(Default)]
    struct GatedEngine {
        release: Notify,
        stops: AtomicUsize,
    }

    #[async_trait]
    impl SyncEngine for GatedEngine {
        async fn start(&self) -> Result<(), SyncError> {
            self.release.notified().await;
            Ok(())
        }

        async fn start_receive(&self) -> Result<(), SyncError> {
            self.release.notified().await;
            Err(SyncError::Failed("board busy".into()))
        }

        fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn manager() -> (
        SyncSessionManager,
        Arc<GatedEngine>,
        mpsc::UnboundedReceiver<Event>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let engine = Arc::new(GatedEngine::default());
        (SyncSessionManager::new(engine.clone(), tx), engine, rx)
    }

    #[tokio::test]
    async fn test_start_preconditions() {
        let (mut sync, _engine, _rx) = manager();

        assert_eq!(
            sync.start(SyncDirection::Upload, ConnectionStatus::Connecting, false),
            Err(SyncRejection::NotConnected)
        );
        assert_eq!(
            sync.start(SyncDirection::Upload, ConnectionStatus::Connected, true),
            Err(SyncRejection::RunnerBusy)
        );

        sync.start(SyncDirection::Upload, ConnectionStatus::Connected, false)
            .unwrap();
        assert_eq!(
            sync.start(SyncDirection::Download, ConnectionStatus::Connected, false),
            Err(SyncRejection::AlreadyActive(SyncDirection::Upload))
        );
        assert_eq!(sync.direction(), Some(SyncDirection::Upload));
    }

    #[tokio::test]
    async fn test_completion_is_reported_with_session_id() {
        let (mut sync, engine, mut rx) = manager();
        let id = sync
            .start(SyncDirection::Download, ConnectionStatus::Connected, false)
            .unwrap();
        tokio::task::yield_now().await;
        engine.release.notify_one();

        let Some(Event::SyncFinished { session, result }) = rx.recv().await else {
            panic!("expected completion");
        };
        assert_eq!(session, id);
        assert_eq!(result, Err(SyncError::Failed("board busy".into())));

        let finished = sync.finish(session, &result).unwrap();
        assert_eq!(finished.direction, SyncDirection::Download);
        assert!(!sync.is_active());
    }

    #[tokio::test]
    async fn test_stop_is_cooperative() {
        let (mut sync, engine, _rx) = manager();
        let id = sync
            .start(SyncDirection::Upload, ConnectionStatus::Connected, false)
            .unwrap();

        assert_eq!(sync.stop(), Some(SyncDirection::Upload));
        assert_eq!(sync.stop(), Some(SyncDirection::Upload));
        assert_eq!(engine.stops.load(Ordering::SeqCst), 1);
        assert!(sync.is_active());
        assert!(sync.active().unwrap().stopping);

        assert!(sync.finish(id, &Err(SyncError::Cancelled)).is_some());
        assert_eq!(sync.stop(), None);
    }

    #[tokio::test]
    async fn test_abandoned_session_completion_is_ignored() {
        let (mut sync, engine, _rx) = manager();
        let first = sync
            .start(SyncDirection::Upload, ConnectionStatus::Connected, false)
            .unwrap();

        assert_eq!(sync.abandon().map(|s| s.id), Some(first));
        assert_eq!(engine.stops.load(Ordering::SeqCst), 1);

        let second = sync
            .start(SyncDirection::Upload, ConnectionStatus::Connected, false)
            .unwrap();
        assert_ne!(first, second);
        assert!(sync.finish(first, &Ok(())).is_none());
        assert!(sync.is_active());
    }
}
