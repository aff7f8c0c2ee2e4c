//! Game format descriptors.
//!
//! A [`GameFormat`] is created once at process start from the static
//! content tables and never mutated. The scheduler holds formats behind
//! `Arc` and consults them for timing, player limits, and scoring rules.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ActivityCategory, FormatError, FormatId};

// ---------------------------------------------------------------------------
// TargetRange
// ---------------------------------------------------------------------------

/// The allowed range (and default) for a format's point target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRange {
    pub min: u32,
    pub max: u32,
    pub default: u32,
}

impl TargetRange {
    /// Resolves a requested target against this range.
    ///
    /// `None` yields the default; an out-of-range request is a rejection,
    /// not a silent clamp — the requester asked for something specific.
    pub fn resolve(&self, requested: Option<u32>) -> Result<u32, FormatError> {
        match requested {
            None => Ok(self.default),
            Some(t) if t >= self.min && t <= self.max => Ok(t),
            Some(t) => Err(FormatError::TargetOutOfRange {
                requested: t,
                min: self.min,
                max: self.max,
            }),
        }
    }
}

impl Default for TargetRange {
    fn default() -> Self {
        Self {
            min: 3,
            max: 30,
            default: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// GameFormat
// ---------------------------------------------------------------------------

/// Whether a format is advanced automatically or run by a human host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormatKind {
    /// Round loop driven by the engine and its watchdogs.
    Scripted,
    /// Lifecycle driven by a human host under a time budget.
    Hosted,
}

/// Immutable descriptor of a game format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameFormat {
    /// Stable identifier (id form of the display name).
    pub id: FormatId,

    /// Human-readable display name.
    pub name: String,

    pub kind: FormatKind,

    /// Cooldown category this format counts against when it ends.
    pub category: ActivityCategory,

    /// Free-join formats have no fixed roster: anyone may guess in any
    /// round, and players are created lazily on their first guess.
    pub free_join: bool,

    pub min_players: usize,
    pub max_players: usize,

    /// Point target range for scripted formats.
    pub target: TargetRange,

    /// How long one round stays open for guesses.
    pub round_duration: Duration,

    /// Single-attempt formats end after their first round regardless of
    /// whether anyone guessed correctly (minigames).
    pub single_attempt: bool,

    /// Whether the host may remove points. When `false`, every ledger
    /// value is non-negative for the lifetime of the activity.
    pub allow_point_removal: bool,

    /// Reward currency per ledger point at activity end.
    pub bits_per_point: u32,

    /// One-time reward bonus for the declared winner.
    pub winner_bonus_bits: u32,
}

impl GameFormat {
    /// A free-join scripted format with default timing and scoring.
    pub fn scripted(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: FormatId::new(id),
            name: name.into(),
            kind: FormatKind::Scripted,
            category: ActivityCategory::Scripted,
            free_join: true,
            min_players: 1,
            max_players: 0,
            target: TargetRange::default(),
            round_duration: Duration::from_secs(30),
            single_attempt: false,
            allow_point_removal: false,
            bits_per_point: 10,
            winner_bonus_bits: 50,
        }
    }

    /// A single-attempt minigame: one round, first correct guess wins.
    pub fn minigame(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category: ActivityCategory::Minigame,
            single_attempt: true,
            target: TargetRange {
                min: 1,
                max: 1,
                default: 1,
            },
            winner_bonus_bits: 0,
            ..Self::scripted(id, name)
        }
    }

    /// A human-hosted format with a fixed signup roster.
    pub fn hosted(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: FormatKind::Hosted,
            category: ActivityCategory::Hosted,
            free_join: false,
            min_players: 2,
            max_players: 20,
            ..Self::scripted(id, name)
        }
    }

    /// `max_players == 0` means no upper bound.
    pub fn has_room_for(&self, current: usize) -> bool {
        self.max_players == 0 || current < self.max_players
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_resolve_default_and_range() {
        let range = TargetRange {
            min: 3,
            max: 30,
            default: 10,
        };
        assert_eq!(range.resolve(None), Ok(10));
        assert_eq!(range.resolve(Some(5)), Ok(5));
        assert!(matches!(
            range.resolve(Some(31)),
            Err(FormatError::TargetOutOfRange { requested: 31, .. })
        ));
        assert!(range.resolve(Some(2)).is_err());
    }

    #[test]
    fn test_scripted_format_defaults() {
        let f = GameFormat::scripted("trivia", "Trivia");
        assert_eq!(f.kind, FormatKind::Scripted);
        assert!(f.free_join);
        assert!(f.has_room_for(10_000));
        assert!(!f.allow_point_removal);
    }

    #[test]
    fn test_minigame_is_single_attempt() {
        let f = GameFormat::minigame("hangman", "Hangman");
        assert!(f.single_attempt);
        assert_eq!(f.category, ActivityCategory::Minigame);
        assert_eq!(f.target.resolve(None), Ok(1));
    }

    #[test]
    fn test_hosted_format_has_roster_limits() {
        let f = GameFormat::hosted("scavengers", "Scavenger Hunt");
        assert_eq!(f.kind, FormatKind::Hosted);
        assert!(!f.free_join);
        assert!(f.has_room_for(19));
        assert!(!f.has_room_for(20));
    }
}
