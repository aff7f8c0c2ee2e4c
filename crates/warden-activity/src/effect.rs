//! Effects returned by activity state machines.
//!
//! State machines never touch the transport or the clock directly. Each
//! entry point returns a list of effects; the room actor interprets them
//! on its own task. This keeps every machine synchronous and testable
//! without a runtime.

use std::collections::HashMap;
use std::time::Duration;

use warden_core::UserId;

/// The timer kinds an activity can own.
///
/// Kinds are disjoint across machine shapes (round timers belong to the
/// engine, warning timers to the hosted lifecycle, accept/bot timers to
/// the coordinator), so one watchdog set per room slot is collision-free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Signup window before an automated game starts.
    Signups,
    /// Open-guessing window of the current round.
    Round,
    /// Short pause between rounds.
    NextRound,
    /// Host budget: first warning (5 minutes remaining).
    FirstWarning,
    /// Host budget: final warning (30 seconds remaining).
    FinalWarning,
    /// Host budget: forced end at the deadline.
    Deadline,
    /// Challenge acceptance window.
    AcceptWindow,
    /// Delayed bot guess in a bot challenge.
    BotMove,
}

/// What an ended activity reports back to the room actor.
#[derive(Debug, Clone, PartialEq)]
pub struct EndReport {
    pub winner: Option<UserId>,
    pub winner_name: Option<String>,
    /// Final point ledger, consumed for reward conversion.
    pub ledger: HashMap<UserId, u32>,
    /// Whether this was a forced termination (staff action or timeout).
    pub forced: bool,
}

impl EndReport {
    pub fn no_winner(ledger: HashMap<UserId, u32>, forced: bool) -> Self {
        Self {
            winner: None,
            winner_name: None,
            ledger,
            forced,
        }
    }
}

/// One instruction from a state machine to the room actor.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Post a message to the whole room.
    Announce(String),

    /// Address a message privately to one participant.
    Private(UserId, String),

    /// Arm a watchdog. Scheduling an already-armed kind supersedes it
    /// (cancel-then-schedule). `seq` is echoed back in the timer event;
    /// the machine compares it against its current state and treats a
    /// mismatch as a stale callback.
    StartTimer {
        kind: TimerKind,
        delay: Duration,
        seq: u64,
    },

    /// Cancel a pending watchdog. No-op if none is pending.
    CancelTimer(TimerKind),

    /// A new round opened. Ignored by the actor at top level; a parent
    /// coordinator consumes it to drive a bot participant.
    RoundStarted { round: u64, hint: String },

    /// The activity is over. The actor runs the end-of-activity
    /// bookkeeping exactly once when it sees this.
    Ended(EndReport),
}

impl Effect {
    /// Convenience for the common announce case.
    pub fn say(text: impl Into<String>) -> Self {
        Self::Announce(text.into())
    }
}
