//! Error types for the activity layer.

use warden_core::{FormatId, UserId};

/// Errors from activity operations.
///
/// Everything here except [`MissingCapability`](Self::MissingCapability)
/// is a recoverable precondition rejection, surfaced to the requesting
/// user with the message below. `MissingCapability` is a configuration
/// error and aborts activity creation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActivityError {
    /// The format was wired into a mode its content module cannot
    /// support. Fatal at creation time.
    #[error("format {format} is missing the required '{capability}' capability")]
    MissingCapability {
        format: FormatId,
        capability: &'static str,
    },

    /// The operation does not apply in the activity's current phase.
    #[error("{0}")]
    WrongPhase(String),

    /// The user is not part of this activity.
    #[error("{0} is not a participant in this game")]
    NotAParticipant(UserId),

    /// The user already joined.
    #[error("{0} has already joined this game")]
    AlreadyJoined(UserId),

    /// The roster is at the format's player limit.
    #[error("this game is full ({max} players)")]
    RosterFull { max: usize },

    /// Only the host (or sub-host) may do this.
    #[error("only the host may use this command")]
    HostOnly,

    /// The format forbids taking points away.
    #[error("this format does not allow removing points")]
    PointRemovalNotAllowed,

    /// The one-time host extension was already used or is out of range.
    #[error("{0}")]
    ExtensionUnavailable(String),
}
