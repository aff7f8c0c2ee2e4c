//! Identity newtypes and small shared enums.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A chat room identifier.
///
/// Room ids come from the chat platform already folded (lowercase, no
/// punctuation), so this wrapper stores them as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user identifier: the display name folded down to its id form.
///
/// Two display names that fold to the same id ("Ann Droid" and "anndroid")
/// are the same user as far as the scheduler is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Folds a raw display name into its id form.
    pub fn from_name(name: &str) -> Self {
        Self(crate::normalize::to_id(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unique identifier for one activity instance.
///
/// Allocated from a process-wide counter; never reused. Watchdog events
/// carry this so a timer that outlives its activity can be recognized as
/// stale and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(pub u64);

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A-{}", self.0)
    }
}

/// A game format identifier (the id form of the format's display name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormatId(pub String);

impl FormatId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ActivityCategory
// ---------------------------------------------------------------------------

/// The cooldown category an activity counts against when it ends.
///
/// Categories are coarser than formats: every scripted trivia variant
/// shares the `Scripted` cooldown, while user-hosted games additionally
/// get a per-format cooldown keyed by [`FormatId`] at the registry level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityCategory {
    /// An automated round-based game.
    Scripted,
    /// A short single-attempt game.
    Minigame,
    /// A tournament-adjacent game.
    Tournament,
    /// A game run live by a human host.
    Hosted,
}

impl fmt::Display for ActivityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scripted => write!(f, "scripted game"),
            Self::Minigame => write!(f, "minigame"),
            Self::Tournament => write!(f, "tournament game"),
            Self::Hosted => write!(f, "hosted game"),
        }
    }
}

// ---------------------------------------------------------------------------
// Rank
// ---------------------------------------------------------------------------

/// A chat rank, ordered from least to most privileged.
///
/// The scheduler only cares about ranks for two things: deciding whether a
/// user may force-end an activity, and temporarily elevating participants
/// (hosts, challengers) for the lifetime of one activity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum Rank {
    #[default]
    Regular,
    Voice,
    Driver,
    Moderator,
    Bot,
    RoomOwner,
}

impl Rank {
    /// Whether this rank may force-end activities and manage the host queue.
    pub fn is_staff(&self) -> bool {
        *self >= Rank::Driver
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regular => write!(f, "regular"),
            Self::Voice => write!(f, "voice"),
            Self::Driver => write!(f, "driver"),
            Self::Moderator => write!(f, "moderator"),
            Self::Bot => write!(f, "bot"),
            Self::RoomOwner => write!(f, "room owner"),
        }
    }
}
