//! Chat platform collaborator traits.
//!
//! The scheduler never touches the wire. It consumes exactly two
//! capabilities from the platform: posting a message to a room (or
//! privately to one participant), and reading/adjusting moderation state
//! for temporary privilege grants. Implementations live in the bot's
//! connection layer; tests substitute recording fakes.

use crate::{Rank, RoomId, UserId};

/// Capability to deliver messages to a room or a single participant.
pub trait ChatTransport: Send + Sync {
    /// Posts an announcement visible to the whole room.
    fn announce(&self, room: &RoomId, text: &str);

    /// Addresses a message privately to one participant.
    fn private(&self, room: &RoomId, user: &UserId, text: &str);
}

/// Capability to read and adjust per-room moderation state.
///
/// Used only for activity-scoped elevations: granting a host a temporary
/// rank, loosening modchat for a challenge match. Every change made
/// through this trait is recorded in a [`PrivilegeLedger`] and undone when
/// the activity ends.
pub trait Moderation: Send + Sync {
    fn rank_of(&self, room: &RoomId, user: &UserId) -> Rank;

    fn set_rank(&self, room: &RoomId, user: &UserId, rank: Rank);

    fn modchat(&self, room: &RoomId) -> Rank;

    fn set_modchat(&self, room: &RoomId, level: Rank);
}

// ---------------------------------------------------------------------------
// PrivilegeLedger
// ---------------------------------------------------------------------------

/// Records temporary moderation changes so they can be rolled back.
///
/// Scoped to the lifetime of one activity. Every exit path — normal end,
/// forced end, timeout — calls [`restore`](Self::restore) exactly once;
/// calling it again is a no-op because the ledger drains itself.
#[derive(Default)]
pub struct PrivilegeLedger {
    /// `(user, previous rank)` pairs, restored in reverse grant order.
    grants: Vec<(UserId, Rank)>,
    /// Previous modchat level, if it was changed.
    modchat: Option<Rank>,
}

impl PrivilegeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Elevates `user` to `rank` if they are below it, recording the
    /// previous rank for rollback. Users already at or above `rank` are
    /// left untouched.
    pub fn elevate(&mut self, moderation: &dyn Moderation, room: &RoomId, user: &UserId, rank: Rank) {
        let prev = moderation.rank_of(room, user);
        if prev >= rank {
            return;
        }
        moderation.set_rank(room, user, rank);
        self.grants.push((user.clone(), prev));
    }

    /// Sets the room's modchat level, recording the previous level.
    /// Only the first change is recorded; the rollback target is the level
    /// from before the activity touched it.
    pub fn set_modchat(&mut self, moderation: &dyn Moderation, room: &RoomId, level: Rank) {
        let prev = moderation.modchat(room);
        if self.modchat.is_none() {
            self.modchat = Some(prev);
        }
        moderation.set_modchat(room, level);
    }

    /// Undoes every recorded change. Idempotent: the ledger drains itself.
    pub fn restore(&mut self, moderation: &dyn Moderation, room: &RoomId) {
        while let Some((user, prev)) = self.grants.pop() {
            moderation.set_rank(room, &user, prev);
        }
        if let Some(prev) = self.modchat.take() {
            moderation.set_modchat(room, prev);
        }
    }

    /// Whether any change is still outstanding.
    pub fn is_empty(&self) -> bool {
        self.grants.is_empty() && self.modchat.is_none()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct FakeModeration {
        ranks: Mutex<HashMap<UserId, Rank>>,
        modchat: Mutex<Rank>,
    }

    impl Moderation for FakeModeration {
        fn rank_of(&self, _room: &RoomId, user: &UserId) -> Rank {
            self.ranks.lock().unwrap().get(user).copied().unwrap_or_default()
        }

        fn set_rank(&self, _room: &RoomId, user: &UserId, rank: Rank) {
            self.ranks.lock().unwrap().insert(user.clone(), rank);
        }

        fn modchat(&self, _room: &RoomId) -> Rank {
            *self.modchat.lock().unwrap()
        }

        fn set_modchat(&self, _room: &RoomId, level: Rank) {
            *self.modchat.lock().unwrap() = level;
        }
    }

    #[test]
    fn test_elevate_and_restore_round_trips() {
        let m = FakeModeration::default();
        let room = RoomId::new("lobby");
        let user = UserId::from_name("Ann");
        let mut ledger = PrivilegeLedger::new();

        ledger.elevate(&m, &room, &user, Rank::Voice);
        assert_eq!(m.rank_of(&room, &user), Rank::Voice);

        ledger.restore(&m, &room);
        assert_eq!(m.rank_of(&room, &user), Rank::Regular);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_elevate_skips_already_privileged() {
        let m = FakeModeration::default();
        let room = RoomId::new("lobby");
        let user = UserId::from_name("Mod");
        m.set_rank(&room, &user, Rank::Moderator);

        let mut ledger = PrivilegeLedger::new();
        ledger.elevate(&m, &room, &user, Rank::Voice);
        assert!(ledger.is_empty());
        assert_eq!(m.rank_of(&room, &user), Rank::Moderator);
    }

    #[test]
    fn test_modchat_rollback_targets_original_level() {
        let m = FakeModeration::default();
        let room = RoomId::new("lobby");
        let mut ledger = PrivilegeLedger::new();

        ledger.set_modchat(&m, &room, Rank::Voice);
        ledger.set_modchat(&m, &room, Rank::Driver);
        assert_eq!(m.modchat(&room), Rank::Driver);

        ledger.restore(&m, &room);
        assert_eq!(m.modchat(&room), Rank::Regular);
    }

    #[test]
    fn test_restore_is_idempotent() {
        let m = FakeModeration::default();
        let room = RoomId::new("lobby");
        let user = UserId::from_name("Ann");
        let mut ledger = PrivilegeLedger::new();

        ledger.elevate(&m, &room, &user, Rank::Voice);
        ledger.restore(&m, &room);
        m.set_rank(&room, &user, Rank::Moderator);
        ledger.restore(&m, &room);
        assert_eq!(m.rank_of(&room, &user), Rank::Moderator);
    }
}
