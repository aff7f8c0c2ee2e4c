//! The persistence seam.
//!
//! Cooldowns, host queues, and per-room last-activity timestamps must
//! survive process restarts. The scheduler writes a [`RoomRecord`] through
//! a [`SchedulerStore`] whenever an activity ends; the record is read back
//! when a room actor starts.
//!
//! Two implementations ship: [`MemoryStore`] for tests and
//! [`JsonFileStore`] for a real deployment (one JSON file per room).

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use warden_core::RoomId;

use crate::{CooldownCategory, HostQueueEntry};

/// Everything the scheduler persists for one room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomRecord {
    /// Remaining cooldowns at save time.
    pub cooldowns: Vec<(CooldownCategory, Duration)>,
    /// Pending host requests, in queue order.
    pub queue: Vec<HostQueueEntry>,
    /// Unix timestamp (seconds) of the last activity end, if any.
    pub last_activity_unix: Option<u64>,
    /// Whether an automated game has run since the last hosted game.
    /// Gates hosted-game promotion.
    pub scripted_since_hosted: bool,
}

/// Errors from the persistence backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("corrupt room record: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Read/write access to per-room scheduler records.
pub trait SchedulerStore: Send + Sync {
    fn load(&self, room: &RoomId) -> Result<Option<RoomRecord>, StoreError>;

    fn save(&self, room: &RoomId, record: &RoomRecord) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-memory store. Nothing survives the process; used by tests and by
/// deployments that do not care about restart continuity.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<RoomId, RoomRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SchedulerStore for MemoryStore {
    fn load(&self, room: &RoomId) -> Result<Option<RoomRecord>, StoreError> {
        Ok(self.records.lock().unwrap().get(room).cloned())
    }

    fn save(&self, room: &RoomId, record: &RoomRecord) -> Result<(), StoreError> {
        self.records
            .lock()
            .unwrap()
            .insert(room.clone(), record.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JsonFileStore
// ---------------------------------------------------------------------------

/// One pretty-printed JSON file per room under a base directory.
///
/// Writes go through a temp file and rename so a crash mid-write never
/// leaves a truncated record behind.
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, room: &RoomId) -> PathBuf {
        self.dir.join(format!("{}.json", room.as_str()))
    }
}

impl SchedulerStore for JsonFileStore {
    fn load(&self, room: &RoomId) -> Result<Option<RoomRecord>, StoreError> {
        let path = self.path_for(room);
        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let record = serde_json::from_slice(&data)?;
        Ok(Some(record))
    }

    fn save(&self, room: &RoomId, record: &RoomRecord) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(room);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(record)?)?;
        std::fs::rename(&tmp, &path)?;
        debug!(room_id = %room, path = %path.display(), "room record saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::{FormatId, UserId};

    fn record() -> RoomRecord {
        RoomRecord {
            cooldowns: vec![(CooldownCategory::Scripted, Duration::from_secs(600))],
            queue: vec![HostQueueEntry {
                host: UserId::from_name("Ann"),
                host_name: "Ann".into(),
                format: FormatId::new("scavengerhunt"),
            }],
            last_activity_unix: Some(1_756_000_000),
            scripted_since_hosted: true,
        }
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        let room = RoomId::new("lobby");

        assert!(store.load(&room).unwrap().is_none());
        store.save(&room, &record()).unwrap();
        assert_eq!(store.load(&room).unwrap(), Some(record()));
    }

    #[test]
    fn test_json_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let room = RoomId::new("lobby");

        assert!(store.load(&room).unwrap().is_none());
        store.save(&room, &record()).unwrap();
        assert_eq!(store.load(&room).unwrap(), Some(record()));
    }

    #[test]
    fn test_json_file_store_rejects_corrupt_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let room = RoomId::new("lobby");

        std::fs::create_dir_all(dir.path()).unwrap();
        std::fs::write(dir.path().join("lobby.json"), b"{ not json").unwrap();
        assert!(matches!(store.load(&room), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_save_overwrites_previous_record() {
        let store = MemoryStore::new();
        let room = RoomId::new("lobby");
        store.save(&room, &record()).unwrap();

        let updated = RoomRecord {
            scripted_since_hosted: false,
            ..record()
        };
        store.save(&room, &updated).unwrap();
        assert_eq!(store.load(&room).unwrap(), Some(updated));
    }
}
