//! Per-room FIFO of pending human-hosted game requests.
//!
//! The queue itself is a dumb, bounded FIFO with update-in-place for
//! re-requests. The gates that decide whether the head entry may actually
//! be promoted (scripted-game cooldown, one-automated-game-between-hosted
//! rule) belong to the room actor; a failed gate simply leaves the head
//! where it is.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;

use warden_core::{FormatId, RoomId, UserId};

/// One pending host request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostQueueEntry {
    pub host: UserId,
    /// Display name as it was typed, for announcements.
    pub host_name: String,
    pub format: FormatId,
}

/// Errors from queue mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// The queue is at capacity and the host is not already queued.
    #[error("the host queue is full ({capacity} pending hosts)")]
    Full { capacity: usize },
}

/// Per-room bounded FIFO of [`HostQueueEntry`].
#[derive(Debug)]
pub struct HostQueue {
    queues: HashMap<RoomId, VecDeque<HostQueueEntry>>,
    capacity: usize,
}

impl HostQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            queues: HashMap::new(),
            capacity,
        }
    }

    /// Adds a host request, returning the entry's zero-based position.
    ///
    /// A host already in queue updates their requested format in place and
    /// keeps their position. A full queue rejects hosts not already queued.
    pub fn enqueue(&mut self, room: &RoomId, entry: HostQueueEntry) -> Result<usize, QueueError> {
        let queue = self.queues.entry(room.clone()).or_default();

        if let Some(pos) = queue.iter().position(|e| e.host == entry.host) {
            debug!(room_id = %room, host = %entry.host, format = %entry.format,
                "queued host updated format in place");
            queue[pos] = entry;
            return Ok(pos);
        }

        if queue.len() >= self.capacity {
            return Err(QueueError::Full {
                capacity: self.capacity,
            });
        }

        queue.push_back(entry);
        Ok(queue.len() - 1)
    }

    /// The entry that would be promoted next, without removing it.
    pub fn peek(&self, room: &RoomId) -> Option<&HostQueueEntry> {
        self.queues.get(room).and_then(VecDeque::front)
    }

    /// Removes and returns the head entry. Callers must have checked the
    /// promotion gates first.
    pub fn pop(&mut self, room: &RoomId) -> Option<HostQueueEntry> {
        self.queues.get_mut(room).and_then(VecDeque::pop_front)
    }

    /// Withdraws a host's pending request. Returns `true` if one existed.
    pub fn remove(&mut self, room: &RoomId, host: &UserId) -> bool {
        let Some(queue) = self.queues.get_mut(room) else {
            return false;
        };
        let Some(pos) = queue.iter().position(|e| &e.host == host) else {
            return false;
        };
        queue.remove(pos);
        true
    }

    /// Zero-based queue position of a host, if queued.
    pub fn position(&self, room: &RoomId, host: &UserId) -> Option<usize> {
        self.queues
            .get(room)?
            .iter()
            .position(|e| &e.host == host)
    }

    pub fn len(&self, room: &RoomId) -> usize {
        self.queues.get(room).map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self, room: &RoomId) -> bool {
        self.len(room) == 0
    }

    /// The room's queue contents, for persistence.
    pub fn snapshot(&self, room: &RoomId) -> Vec<HostQueueEntry> {
        self.queues
            .get(room)
            .map(|q| q.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Restores a room's queue from a persisted snapshot, truncating to
    /// capacity if the configuration shrank since the save.
    pub fn restore(&mut self, room: &RoomId, entries: Vec<HostQueueEntry>) {
        let mut queue: VecDeque<_> = entries.into();
        queue.truncate(self.capacity);
        self.queues.insert(room.clone(), queue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, format: &str) -> HostQueueEntry {
        HostQueueEntry {
            host: UserId::from_name(name),
            host_name: name.to_string(),
            format: FormatId::new(format),
        }
    }

    fn room() -> RoomId {
        RoomId::new("gamecorner")
    }

    #[test]
    fn test_fifo_order() {
        let mut q = HostQueue::new(4);
        assert_eq!(q.enqueue(&room(), entry("Ann", "hunt")), Ok(0));
        assert_eq!(q.enqueue(&room(), entry("Bob", "auction")), Ok(1));

        assert_eq!(q.pop(&room()).unwrap().host, UserId::from_name("Ann"));
        assert_eq!(q.pop(&room()).unwrap().host, UserId::from_name("Bob"));
        assert!(q.pop(&room()).is_none());
    }

    #[test]
    fn test_re_request_updates_in_place() {
        let mut q = HostQueue::new(2);
        q.enqueue(&room(), entry("Ann", "hunt")).unwrap();
        q.enqueue(&room(), entry("Bob", "auction")).unwrap();

        // Ann changes her format; she keeps position 0 and no duplicate
        // entry appears.
        assert_eq!(q.enqueue(&room(), entry("Ann", "auction")), Ok(0));
        assert_eq!(q.len(&room()), 2);
        assert_eq!(q.peek(&room()).unwrap().format, FormatId::new("auction"));
    }

    #[test]
    fn test_full_queue_rejects_new_hosts_only() {
        let mut q = HostQueue::new(2);
        q.enqueue(&room(), entry("Ann", "hunt")).unwrap();
        q.enqueue(&room(), entry("Bob", "auction")).unwrap();

        assert_eq!(
            q.enqueue(&room(), entry("Cid", "hunt")),
            Err(QueueError::Full { capacity: 2 })
        );
        // An already-queued host may still update.
        assert_eq!(q.enqueue(&room(), entry("Bob", "hunt")), Ok(1));
    }

    #[test]
    fn test_remove_and_position() {
        let mut q = HostQueue::new(4);
        q.enqueue(&room(), entry("Ann", "hunt")).unwrap();
        q.enqueue(&room(), entry("Bob", "auction")).unwrap();

        assert_eq!(q.position(&room(), &UserId::from_name("Bob")), Some(1));
        assert!(q.remove(&room(), &UserId::from_name("Ann")));
        assert_eq!(q.position(&room(), &UserId::from_name("Bob")), Some(0));
        assert!(!q.remove(&room(), &UserId::from_name("Ann")));
    }

    #[test]
    fn test_rooms_are_independent() {
        let mut q = HostQueue::new(1);
        let other = RoomId::new("arcade");
        q.enqueue(&room(), entry("Ann", "hunt")).unwrap();
        assert_eq!(q.enqueue(&other, entry("Bob", "auction")), Ok(0));
        assert_eq!(q.len(&room()), 1);
        assert_eq!(q.len(&other), 1);
    }

    #[test]
    fn test_snapshot_restore_truncates_to_capacity() {
        let mut q = HostQueue::new(4);
        q.enqueue(&room(), entry("Ann", "hunt")).unwrap();
        q.enqueue(&room(), entry("Bob", "auction")).unwrap();
        q.enqueue(&room(), entry("Cid", "hunt")).unwrap();

        let snap = q.snapshot(&room());
        let mut small = HostQueue::new(2);
        small.restore(&room(), snap);
        assert_eq!(small.len(&room()), 2);
        assert_eq!(small.peek(&room()).unwrap().host, UserId::from_name("Ann"));
    }
}
