//! The typed rejection enum for scheduler operations.

use std::time::Duration;

use warden_activity::ActivityError;
use warden_core::{FormatError, FormatId, RoomId};
use warden_sched::QueueError;

/// Why a scheduler operation was refused.
///
/// Every variant is a recoverable precondition rejection with a stable,
/// user-facing `Display` message; command handlers relay the message to
/// the requesting user verbatim.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RejectReason {
    /// The room's single activity slot is taken.
    #[error("an activity is already running in this room")]
    SlotOccupied,

    /// The activity's cooldown category has not expired yet.
    #[error("this activity is on cooldown for another {} seconds", remaining.as_secs())]
    CooldownActive { remaining: Duration },

    /// The host queue is at capacity.
    #[error(transparent)]
    QueueFull(#[from] QueueError),

    /// The requested point target is outside the format's range.
    #[error(transparent)]
    Target(#[from] FormatError),

    /// The activity itself refused the operation.
    #[error(transparent)]
    Activity(#[from] ActivityError),

    /// No format is registered under this id.
    #[error("unknown game format '{0}'")]
    UnknownFormat(FormatId),

    /// A hosted format was asked to start as an automated game.
    #[error("{0} is run by a human host; request it through the host queue")]
    NotAutomated(FormatId),

    /// An automated format was submitted as a host request.
    #[error("{0} is an automated format; start it directly")]
    NotHosted(FormatId),

    /// The caller lacks the rank this operation requires.
    #[error("you are not authorized to do that")]
    NotAuthorized,

    /// The slot is empty.
    #[error("no activity is running in this room")]
    NoActivity,

    /// Promotion was requested with an empty queue.
    #[error("no host is waiting in the queue")]
    NoPendingHost,

    /// The withdrawing user has no queued request.
    #[error("you have no pending host request")]
    NotQueued,

    /// The hosted-promotion gate: an automated game has to run between
    /// two hosted games.
    #[error("an automated game must run before the next hosted game")]
    HostedTooSoon,

    /// The room's actor is gone (shutdown or crashed).
    #[error("room {0} is unavailable")]
    RoomUnavailable(RoomId),
}
