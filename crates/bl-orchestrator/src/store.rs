//! Shared connection state
//!
//! Every editor window on the machine shares one small JSON file mapping a
//! board address to the window (project) that last claimed it and when:
//!
//! ```json
//! { "/dev/ttyUSB0": { "timestamp": 1700000000000, "project": "blinky" } }
//! ```
//!
//! A window holding a connection refreshes its record on every heartbeat.
//! Other windows treat a record younger than the staleness window as a live
//! claim. Reads fail open: a missing or corrupt file is an empty map, and a
//! malformed entry is skipped. Writes replace the file atomically so readers
//! never observe a half-written document.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use bl_core::config::default_data_dir;
use bl_core::error::StoreError;
use bl_core::time::elapsed_between;
use bl_core::Address;

/// File name of the shared state, inside the private data directory
pub const STATE_FILE_NAME: &str = "connection_state.json";

/// Who holds a board and since when
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    /// Milliseconds since the UNIX epoch of the last claim or heartbeat
    pub timestamp: u64,
    /// Project name of the claiming window
    #[serde(default)]
    pub project: String,
}

impl ConnectionRecord {
    /// Whether this record blocks `project` from connecting at `now`.
    ///
    /// Records of the same project never conflict. A record is live while
    /// its age is strictly below `window`.
    pub fn conflicts_with(&self, project: &str, now: u64, window: Duration) -> bool {
        self.project != project && self.is_live(now, window)
    }

    /// Whether the record is younger than `window` at `now`
    pub fn is_live(&self, now: u64, window: Duration) -> bool {
        self.age(now) < window.as_millis() as u64
    }

    /// Age of the record at `now`, zero if the timestamp is in the future
    pub fn age(&self, now: u64) -> u64 {
        elapsed_between(self.timestamp, now)
    }
}

/// Address keyed records
pub type ConnectionState = BTreeMap<String, ConnectionRecord>;

/// File-backed store for [`ConnectionState`]
#[derive(Debug, Clone)]
pub struct ConnectionStateStore {
    path: PathBuf,
}

impl ConnectionStateStore {
    /// Store backed by the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location in the private data directory
    pub fn open_default() -> Self {
        Self::new(default_state_path())
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every readable record; never fails
    pub fn load(&self) -> ConnectionState {
        match self.read() {
            Ok(state) => state,
            Err(e) => {
                tracing::debug!("Ignoring unreadable connection state {:?}: {}", self.path, e);
                ConnectionState::new()
            }
        }
    }

    /// Every readable record, reporting I/O and top-level format errors
    pub fn try_load(&self) -> Result<ConnectionState, StoreError> {
        self.read()
    }

    /// Record for `address`, if one exists
    pub fn get(&self, address: &Address) -> Option<ConnectionRecord> {
        self.load().remove(address.as_str())
    }

    /// Claim `address` for `project` at `now`, replacing any previous record
    pub fn claim(&self, address: &Address, project: &str, now: u64) -> Result<(), StoreError> {
        self.update(|state| {
            state.insert(
                address.to_string(),
                ConnectionRecord {
                    timestamp: now,
                    project: project.to_string(),
                },
            );
        })
    }

    /// Remove the record for `address`, returning whether one existed
    pub fn release(&self, address: &Address) -> Result<bool, StoreError> {
        self.update(|state| state.remove(address.as_str()).is_some())
    }

    /// Remove the record for `address` only if `project` holds it
    pub fn release_owned(&self, address: &Address, project: &str) -> Result<bool, StoreError> {
        self.update(|state| match state.get(address.as_str()) {
            Some(record) if record.project == project => {
                state.remove(address.as_str());
                true
            }
            _ => false,
        })
    }

    /// Remove every record
    pub fn clear(&self) -> Result<(), StoreError> {
        self.update(|state| state.clear())
    }

    /// Read-modify-write. Unchanged maps are not written back.
    fn update<R>(&self, change: impl FnOnce(&mut ConnectionState) -> R) -> Result<R, StoreError> {
        let mut state = self.load();
        let before = state.clone();
        let result = change(&mut state);
        if state != before {
            self.write(&state)?;
        }
        Ok(result)
    }

    fn read(&self) -> Result<ConnectionState, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ConnectionState::new())
            }
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(ConnectionState::new());
        }

        let entries: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&content)?;
        let mut state = ConnectionState::new();
        for (address, value) in entries {
            match serde_json::from_value::<ConnectionRecord>(value) {
                Ok(record) => {
                    state.insert(address, record);
                }
                Err(e) => tracing::debug!("Skipping malformed record for {}: {}", address, e),
            }
        }
        Ok(state)
    }

    fn write(&self, state: &ConnectionState) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(state)?;

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)?;

        let mut temp = NamedTempFile::new_in(&parent)?;
        temp.write_all(content.as_bytes())?;
        temp.flush()?;
        temp.persist(&self.path).map_err(|e| e.error)?;

        Ok(())
    }
}

/// Default path of the shared state file
pub fn default_state_path() -> PathBuf {
    default_data_dir().join(STATE_FILE_NAME)
}
