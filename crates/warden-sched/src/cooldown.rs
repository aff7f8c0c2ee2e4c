//! Per-room, per-category cooldown timestamps.
//!
//! Cooldowns are advisory gates consulted by creation commands; nothing
//! inside a running activity ever checks them. Each `(room, category)`
//! pair is an independent key, so rooms never contend with each other.
//!
//! Deadlines live on the tokio clock, which lets tests pause and advance
//! time deterministically.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::debug;

use warden_core::{ActivityCategory, FormatId, RoomId};

// ---------------------------------------------------------------------------
// CooldownCategory
// ---------------------------------------------------------------------------

/// The key space of the registry.
///
/// Coarse activity categories share one cooldown each; user-hosted games
/// additionally get a per-format cooldown so one host running "Scavenger
/// Hunt" does not block a different hosted format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CooldownCategory {
    Scripted,
    Minigame,
    Tournament,
    /// Per-format cooldown for user-hosted games.
    HostedFormat(FormatId),
}

impl From<ActivityCategory> for CooldownCategory {
    fn from(category: ActivityCategory) -> Self {
        match category {
            ActivityCategory::Scripted => Self::Scripted,
            ActivityCategory::Minigame => Self::Minigame,
            ActivityCategory::Tournament => Self::Tournament,
            // Hosted games are marked per format; callers that only have
            // the coarse category gate on the scripted cooldown instead.
            ActivityCategory::Hosted => Self::Scripted,
        }
    }
}

// ---------------------------------------------------------------------------
// CooldownConfig
// ---------------------------------------------------------------------------

/// Cooldown durations per category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CooldownConfig {
    pub scripted: Duration,
    pub minigame: Duration,
    pub tournament: Duration,
    /// Cooldown between two hosted runs of the same format.
    pub hosted_format: Duration,
    /// Remainders under this floor report as zero. Absorbs clock-skew
    /// jitter at round boundaries so a back-to-back restart a few hundred
    /// milliseconds early is not rejected.
    pub jitter_floor: Duration,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            scripted: Duration::from_secs(20 * 60),
            minigame: Duration::from_secs(10 * 60),
            tournament: Duration::from_secs(60 * 60),
            hosted_format: Duration::from_secs(3 * 60 * 60),
            jitter_floor: Duration::from_secs(1),
        }
    }
}

impl CooldownConfig {
    fn duration_for(&self, category: &CooldownCategory) -> Duration {
        match category {
            CooldownCategory::Scripted => self.scripted,
            CooldownCategory::Minigame => self.minigame,
            CooldownCategory::Tournament => self.tournament,
            CooldownCategory::HostedFormat(_) => self.hosted_format,
        }
    }
}

// ---------------------------------------------------------------------------
// CooldownRegistry
// ---------------------------------------------------------------------------

/// Tracks when each `(room, category)` pair last finished an activity and
/// answers "how much wait time remains".
#[derive(Debug)]
pub struct CooldownRegistry {
    config: CooldownConfig,
    /// Deadline after which the category is free again.
    ends_at: HashMap<(RoomId, CooldownCategory), Instant>,
}

impl CooldownRegistry {
    pub fn new(config: CooldownConfig) -> Self {
        Self {
            config,
            ends_at: HashMap::new(),
        }
    }

    /// Remaining wait time before `category` may start again in `room`.
    ///
    /// Zero if there is no record, the record expired, or the remainder is
    /// under the jitter floor. Non-increasing as time advances with no new
    /// [`mark_ended`](Self::mark_ended) call.
    pub fn remaining(&self, room: &RoomId, category: &CooldownCategory) -> Duration {
        let Some(ends_at) = self.ends_at.get(&(room.clone(), category.clone())) else {
            return Duration::ZERO;
        };
        let remaining = ends_at.saturating_duration_since(Instant::now());
        if remaining < self.config.jitter_floor {
            Duration::ZERO
        } else {
            remaining
        }
    }

    /// Records that an activity of `category` just ended in `room`,
    /// arming the full configured cooldown.
    pub fn mark_ended(&mut self, room: &RoomId, category: CooldownCategory) {
        let duration = self.config.duration_for(&category);
        debug!(room_id = %room, ?category, secs = duration.as_secs(), "cooldown armed");
        self.ends_at
            .insert((room.clone(), category), Instant::now() + duration);
    }

    /// Remaining cooldowns for one room, for persistence. Expired entries
    /// are omitted.
    pub fn snapshot(&self, room: &RoomId) -> Vec<(CooldownCategory, Duration)> {
        self.ends_at
            .iter()
            .filter(|((r, _), _)| r == room)
            .filter_map(|((_, category), ends_at)| {
                let remaining = ends_at.saturating_duration_since(Instant::now());
                (remaining > Duration::ZERO).then(|| (category.clone(), remaining))
            })
            .collect()
    }

    /// Restores a room's cooldowns from a persisted snapshot.
    pub fn restore(&mut self, room: &RoomId, entries: Vec<(CooldownCategory, Duration)>) {
        let now = Instant::now();
        for (category, remaining) in entries {
            self.ends_at.insert((room.clone(), category), now + remaining);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(id: &str) -> RoomId {
        RoomId::new(id)
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_record_means_no_cooldown() {
        let reg = CooldownRegistry::new(CooldownConfig::default());
        assert_eq!(
            reg.remaining(&room("lobby"), &CooldownCategory::Scripted),
            Duration::ZERO
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_mark_ended_arms_full_duration() {
        let mut reg = CooldownRegistry::new(CooldownConfig::default());
        reg.mark_ended(&room("lobby"), CooldownCategory::Scripted);
        assert_eq!(
            reg.remaining(&room("lobby"), &CooldownCategory::Scripted),
            Duration::from_secs(20 * 60)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_remaining_is_monotonically_non_increasing() {
        let mut reg = CooldownRegistry::new(CooldownConfig::default());
        reg.mark_ended(&room("lobby"), CooldownCategory::Minigame);

        let mut prev = reg.remaining(&room("lobby"), &CooldownCategory::Minigame);
        for _ in 0..5 {
            tokio::time::advance(Duration::from_secs(90)).await;
            let now = reg.remaining(&room("lobby"), &CooldownCategory::Minigame);
            assert!(now <= prev);
            prev = now;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_expires_to_zero_and_rearms_on_mark() {
        let mut reg = CooldownRegistry::new(CooldownConfig::default());
        reg.mark_ended(&room("lobby"), CooldownCategory::Scripted);

        tokio::time::advance(Duration::from_secs(21 * 60)).await;
        assert_eq!(
            reg.remaining(&room("lobby"), &CooldownCategory::Scripted),
            Duration::ZERO
        );

        reg.mark_ended(&room("lobby"), CooldownCategory::Scripted);
        assert_eq!(
            reg.remaining(&room("lobby"), &CooldownCategory::Scripted),
            Duration::from_secs(20 * 60)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_sub_second_remainder_reports_zero() {
        let mut reg = CooldownRegistry::new(CooldownConfig::default());
        reg.mark_ended(&room("lobby"), CooldownCategory::Scripted);

        // 400ms shy of the deadline — under the jitter floor.
        tokio::time::advance(Duration::from_secs(20 * 60) - Duration::from_millis(400)).await;
        assert_eq!(
            reg.remaining(&room("lobby"), &CooldownCategory::Scripted),
            Duration::ZERO
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rooms_and_categories_are_independent() {
        let mut reg = CooldownRegistry::new(CooldownConfig::default());
        reg.mark_ended(&room("lobby"), CooldownCategory::Scripted);

        assert_eq!(
            reg.remaining(&room("arcade"), &CooldownCategory::Scripted),
            Duration::ZERO
        );
        assert_eq!(
            reg.remaining(&room("lobby"), &CooldownCategory::Minigame),
            Duration::ZERO
        );
        assert!(
            reg.remaining(&room("lobby"), &CooldownCategory::Scripted) > Duration::ZERO
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_hosted_format_cooldowns_are_per_format() {
        let mut reg = CooldownRegistry::new(CooldownConfig::default());
        let hunt = CooldownCategory::HostedFormat(FormatId::new("scavengerhunt"));
        let auction = CooldownCategory::HostedFormat(FormatId::new("auction"));

        reg.mark_ended(&room("lobby"), hunt.clone());
        assert!(reg.remaining(&room("lobby"), &hunt) > Duration::ZERO);
        assert_eq!(reg.remaining(&room("lobby"), &auction), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_restore_round_trip() {
        let mut reg = CooldownRegistry::new(CooldownConfig::default());
        reg.mark_ended(&room("lobby"), CooldownCategory::Scripted);
        tokio::time::advance(Duration::from_secs(5 * 60)).await;

        let snap = reg.snapshot(&room("lobby"));
        assert_eq!(snap.len(), 1);

        let mut fresh = CooldownRegistry::new(CooldownConfig::default());
        fresh.restore(&room("lobby"), snap);
        assert_eq!(
            fresh.remaining(&room("lobby"), &CooldownCategory::Scripted),
            Duration::from_secs(15 * 60)
        );
    }
}
