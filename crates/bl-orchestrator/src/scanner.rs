//! USB autoconnect scanner
//!
//! While running, the scanner enumerates boards every scan period and posts
//! the result to the orchestrator queue. The orchestrator then selects a
//! candidate with [`select_candidate`] and feeds it back through
//! [`AutoconnectScanner::record`], which reports the transition against the
//! cached candidate: first empty scan, a new board, the board gone, or no
//! change.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;

use bl_core::traits::DeviceDiscovery;
use bl_core::{Address, PortInfo, TransportKind};

use crate::event::{Event, ScanReport};
use crate::timer::TimerHandle;

/// Outcome of candidate selection for one scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Keep the cached candidate; the live connection is acceptable
    Keep,
    /// This is the candidate (`None` = no board available)
    Report(Option<Address>),
    /// The live connection is the candidate; cache it without a transition
    Adopt(Address),
}

/// The live connection, as seen by candidate selection
#[derive(Debug, Clone, Copy)]
pub struct CurrentConnection<'a> {
    pub address: &'a Address,
    pub kind: TransportKind,
}

/// Pick the autoconnect candidate from `boards`.
///
/// The first board wins unless the window is already connected to something
/// it should keep: any network board, or a serial board that is still
/// enumerated. In those cases the cached candidate is kept so the scan never
/// flaps between two boards.
pub fn select_candidate(boards: &[PortInfo], current: Option<CurrentConnection<'_>>) -> Selection {
    let Some(first) = boards.first() else {
        return Selection::Report(None);
    };
    let first = Address::new(first.name.as_str());

    let Some(current) = current else {
        return Selection::Report(Some(first));
    };

    if *current.address == first {
        return Selection::Adopt(first);
    }

    let still_listed = boards.iter().any(|b| b.name == current.address.as_str());
    if !current.kind.is_serial() || still_listed {
        return Selection::Keep;
    }

    Selection::Report(Some(first))
}

/// Change of the cached candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanTransition {
    /// The first scan found nothing
    NothingFound,
    /// A new candidate appeared
    Found(Address),
    /// The previous candidate disappeared
    Lost(Address),
    /// Nothing to act on
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Candidate {
    /// No scan recorded since start
    Unset,
    /// The last scan found no candidate
    Absent,
    /// The last scan selected this board
    Board(Address),
}

/// Periodic board scanner
pub struct AutoconnectScanner {
    discovery: Arc<dyn DeviceDiscovery>,
    events: UnboundedSender<Event>,
    period: Duration,
    timer: TimerHandle,
    candidate: Candidate,
}

impl AutoconnectScanner {
    /// A stopped scanner posting to `events`
    pub fn new(
        discovery: Arc<dyn DeviceDiscovery>,
        events: UnboundedSender<Event>,
        period: Duration,
    ) -> Self {
        Self {
            discovery,
            events,
            period,
            timer: TimerHandle::new(),
            candidate: Candidate::Unset,
        }
    }

    /// Change the scan period; applies on the next start
    pub fn set_period(&mut self, period: Duration) {
        self.period = period;
    }

    /// Start scanning; the first scan runs immediately.
    ///
    /// Restarting cancels the previous schedule and forgets the candidate.
    pub fn start(&mut self) {
        self.candidate = Candidate::Unset;
        let discovery = Arc::clone(&self.discovery);
        let events = self.events.clone();
        let period = self.period;

        let generation = self.timer.spawn_with(move |generation| async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let boards = list_boards(discovery.as_ref()).await;
                if events
                    .send(Event::Scan(ScanReport { generation, boards }))
                    .is_err()
                {
                    break;
                }
            }
        });
        tracing::info!("Autoconnect scanner started (generation {})", generation);
    }

    /// Stop scanning and forget the candidate.
    ///
    /// Returns the candidate cached at the time of the call.
    pub fn stop(&mut self) -> Option<Address> {
        if self.timer.cancel() {
            tracing::info!("Autoconnect scanner stopped");
        }
        match std::mem::replace(&mut self.candidate, Candidate::Unset) {
            Candidate::Board(address) => Some(address),
            _ => None,
        }
    }

    /// The scan schedule is active
    pub fn is_running(&self) -> bool {
        self.timer.is_armed()
    }

    /// Whether `report` came from the current schedule
    pub fn is_current(&self, report: &ScanReport) -> bool {
        self.timer.is_current(report.generation)
    }

    /// Cached candidate from the last recorded scan
    pub fn candidate(&self) -> Option<&Address> {
        match &self.candidate {
            Candidate::Board(address) => Some(address),
            _ => None,
        }
    }

    /// Enumerate boards now and select a candidate, outside the schedule
    pub async fn query(&self, current: Option<CurrentConnection<'_>>) -> Selection {
        let boards = list_boards(self.discovery.as_ref()).await;
        select_candidate(&boards, current)
    }

    /// Record a selection and report how the candidate changed
    pub fn record(&mut self, selection: Selection) -> ScanTransition {
        let selected = match selection {
            Selection::Keep => return ScanTransition::Unchanged,
            Selection::Adopt(address) => {
                self.candidate = Candidate::Board(address);
                return ScanTransition::Unchanged;
            }
            Selection::Report(selected) => selected,
        };

        let previous = std::mem::replace(
            &mut self.candidate,
            match &selected {
                Some(address) => Candidate::Board(address.clone()),
                None => Candidate::Absent,
            },
        );

        match (previous, selected) {
            (Candidate::Unset, None) => ScanTransition::NothingFound,
            (Candidate::Board(prev), Some(new)) if prev == new => ScanTransition::Unchanged,
            (_, Some(new)) => ScanTransition::Found(new),
            (Candidate::Board(prev), None) => ScanTransition::Lost(prev),
            (Candidate::Absent, None) => ScanTransition::Unchanged,
        }
    }
}

/// Board list; enumeration failures count as no boards
async fn list_boards(discovery: &dyn DeviceDiscovery) -> Vec<PortInfo> {
    match discovery.list_boards().await {
        Ok(boards) => boards,
        Err(e) => {
            tracing::warn!("Board enumeration failed: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bl_core::error::DiscoveryError;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    struct FixedDiscovery(Mutex<Vec<PortInfo>>);

    #[async_trait]
    impl DeviceDiscovery for FixedDiscovery {
        async fn list_ports(&self) -> Result<Vec<PortInfo>, DiscoveryError> {
            Ok(self.0.lock().unwrap().clone())
        }

        async fn list_boards(&self) -> Result<Vec<PortInfo>, DiscoveryError> {
            Ok(self.0.lock().unwrap().clone())
        }
    }

    fn board(name: &str) -> PortInfo {
        PortInfo::new(name, Some("Pycom".into()))
    }

    fn scanner(boards: Vec<PortInfo>) -> (AutoconnectScanner, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let discovery = Arc::new(FixedDiscovery(Mutex::new(boards)));
        (
            AutoconnectScanner::new(discovery, tx, Duration::from_millis(2_500)),
            rx,
        )
    }

    #[test]
    fn test_select_without_connection_takes_first() {
        let boards = vec![board("COM3"), board("COM4")];
        assert_eq!(
            select_candidate(&boards, None),
            Selection::Report(Some(Address::new("COM3")))
        );
        assert_eq!(select_candidate(&[], None), Selection::Report(None));
    }

    #[test]
    fn test_select_keeps_listed_serial_connection() {
        let boards = vec![board("COM3"), board("COM4")];
        let address = Address::new("COM4");
        let current = CurrentConnection {
            address: &address,
            kind: TransportKind::Serial,
        };
        assert_eq!(select_candidate(&boards, Some(current)), Selection::Keep);
    }

    #[test]
    fn test_select_adopts_connection_to_first_board() {
        let boards = vec![board("COM3"), board("COM4")];
        let address = Address::new("COM3");
        let current = CurrentConnection {
            address: &address,
            kind: TransportKind::Serial,
        };
        assert_eq!(
            select_candidate(&boards, Some(current)),
            Selection::Adopt(Address::new("COM3"))
        );
    }

    #[test]
    fn test_adopt_caches_without_transition() {
        let (mut scanner, _rx) = scanner(Vec::new());
        let a = Address::new("COM3");

        assert_eq!(scanner.record(Selection::Adopt(a.clone())), ScanTransition::Unchanged);
        assert_eq!(scanner.candidate(), Some(&a));
        assert_eq!(scanner.record(Selection::Report(None)), ScanTransition::Lost(a));
    }

    #[test]
    fn test_select_keeps_network_connection() {
        let boards = vec![board("COM3")];
        let address = Address::new("192.168.4.1");
        let current = CurrentConnection {
            address: &address,
            kind: TransportKind::Network,
        };
        assert_eq!(select_candidate(&boards, Some(current)), Selection::Keep);
    }

    #[test]
    fn test_select_replaces_unplugged_serial_connection() {
        let boards = vec![board("COM3")];
        let address = Address::new("COM9");
        let current = CurrentConnection {
            address: &address,
            kind: TransportKind::Serial,
        };
        assert_eq!(
            select_candidate(&boards, Some(current)),
            Selection::Report(Some(Address::new("COM3")))
        );
    }

    #[test]
    fn test_record_transitions() {
        let (mut scanner, _rx) = scanner(Vec::new());
        let a = Address::new("COM3");
        let b = Address::new("COM4");

        assert_eq!(scanner.record(Selection::Report(None)), ScanTransition::NothingFound);
        assert_eq!(scanner.record(Selection::Report(None)), ScanTransition::Unchanged);
        assert_eq!(
            scanner.record(Selection::Report(Some(a.clone()))),
            ScanTransition::Found(a.clone())
        );
        assert_eq!(
            scanner.record(Selection::Report(Some(a.clone()))),
            ScanTransition::Unchanged
        );
        assert_eq!(scanner.record(Selection::Keep), ScanTransition::Unchanged);
        assert_eq!(scanner.candidate(), Some(&a));
        assert_eq!(
            scanner.record(Selection::Report(Some(b.clone()))),
            ScanTransition::Found(b.clone())
        );
        assert_eq!(scanner.record(Selection::Report(None)), ScanTransition::Lost(b));
        assert_eq!(scanner.candidate(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scans_immediately_then_periodically() {
        let (mut scanner, mut rx) = scanner(vec![board("COM3")]);
        scanner.start();
        assert!(scanner.is_running());

        tokio::time::sleep(Duration::from_millis(10)).await;
        let Ok(Event::Scan(report)) = rx.try_recv() else {
            panic!("expected an immediate scan");
        };
        assert!(scanner.is_current(&report));
        assert_eq!(report.boards, vec![board("COM3")]);

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert!(matches!(rx.try_recv(), Ok(Event::Scan(_))));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_returns_candidate_and_invalidates_reports() {
        let (mut scanner, mut rx) = scanner(vec![board("COM3")]);
        scanner.start();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let Ok(Event::Scan(report)) = rx.try_recv() else {
            panic!("expected a scan");
        };

        scanner.record(Selection::Report(Some(Address::new("COM3"))));
        assert_eq!(scanner.stop(), Some(Address::new("COM3")));
        assert!(!scanner.is_running());
        assert!(!scanner.is_current(&report));
        assert_eq!(scanner.candidate(), None);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_forgets_candidate() {
        let (mut scanner, _rx) = scanner(vec![board("COM3")]);
        scanner.start();
        scanner.record(Selection::Report(Some(Address::new("COM3"))));

        scanner.start();
        assert_eq!(scanner.candidate(), None);
        assert_eq!(scanner.record(Selection::Report(None)), ScanTransition::NothingFound);
    }

    #[tokio::test]
    async fn test_query_selects_from_discovery() {
        let (scanner, _rx) = scanner(vec![board("/dev/ttyACM0")]);
        assert_eq!(
            scanner.query(None).await,
            Selection::Report(Some(Address::new("/dev/ttyACM0")))
        );
    }
}
