//! The activity a room slot holds: one of the three machine shapes.

use std::sync::Arc;

use warden_core::{ActivityId, GameFormat, UserId};

use crate::{ActivityError, ChildGameCoordinator, Effect, HostedGame, RoundEngine, TimerKind};

/// Any running activity. The room actor matches on this to route
/// commands; timer events and forced ends dispatch uniformly.
pub enum Activity {
    Scripted(RoundEngine),
    Hosted(HostedGame),
    Challenge(ChildGameCoordinator),
}

impl Activity {
    pub fn id(&self) -> ActivityId {
        match self {
            Self::Scripted(e) => e.id(),
            Self::Hosted(h) => h.id(),
            Self::Challenge(c) => c.id(),
        }
    }

    pub fn format(&self) -> &Arc<GameFormat> {
        match self {
            Self::Scripted(e) => e.format(),
            Self::Hosted(h) => h.format(),
            Self::Challenge(c) => c.format(),
        }
    }

    pub fn ended(&self) -> bool {
        match self {
            Self::Scripted(e) => e.ended(),
            Self::Hosted(h) => h.ended(),
            Self::Challenge(c) => c.ended(),
        }
    }

    /// Opens the activity: announcements plus the first watchdog.
    pub fn open(&mut self) -> Vec<Effect> {
        match self {
            Self::Scripted(e) => e.open(),
            Self::Hosted(h) => h.open_signups(),
            Self::Challenge(c) => c.open(),
        }
    }

    /// Routes a chat guess. Hosted games have no automated guessing.
    pub fn handle_guess(&mut self, user: &UserId, name: &str, guess: &str) -> Vec<Effect> {
        match self {
            Self::Scripted(e) => e.handle_guess(user, name, guess),
            Self::Hosted(_) => Vec::new(),
            Self::Challenge(c) => c.handle_guess(user, name, guess),
        }
    }

    pub fn on_timer(&mut self, kind: TimerKind, seq: u64) -> Vec<Effect> {
        match self {
            Self::Scripted(e) => e.on_timer(kind, seq),
            Self::Hosted(h) => h.on_timer(kind, seq),
            Self::Challenge(c) => c.on_timer(kind, seq),
        }
    }

    pub fn force_end(&mut self, reason: &str) -> Vec<Effect> {
        match self {
            Self::Scripted(e) => e.force_end(reason),
            Self::Hosted(h) => h.force_end(reason),
            Self::Challenge(c) => c.force_end(reason),
        }
    }

    /// Self-serve join. Challenges have a fixed pair of participants.
    pub fn join(&mut self, user: UserId, name: &str) -> Result<Vec<Effect>, ActivityError> {
        match self {
            Self::Scripted(e) => e.join(user, name),
            Self::Hosted(h) => h.join(user, name),
            Self::Challenge(_) => Err(ActivityError::WrongPhase(
                "challenges do not take signups".into(),
            )),
        }
    }

    /// Returns `true` if the user was a participant.
    pub fn leave(&mut self, user: &UserId) -> bool {
        match self {
            Self::Scripted(e) => e.leave(user),
            Self::Hosted(h) => h.leave(user),
            Self::Challenge(_) => false,
        }
    }
}
