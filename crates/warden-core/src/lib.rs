//! Core types for Gamewarden.
//!
//! This crate defines the vocabulary the scheduler speaks:
//!
//! - **Identity** ([`RoomId`], [`UserId`], [`ActivityId`], [`FormatId`]) —
//!   newtype wrappers used everywhere above this layer.
//! - **Formats** ([`GameFormat`]) — the immutable descriptor of a game
//!   format, created at process start from static content tables.
//! - **Normalization** ([`to_id`], [`guess_matches`]) — how raw chat text
//!   is folded before it is compared against an answer set.
//! - **Collaborators** ([`ChatTransport`], [`Moderation`]) — the narrow
//!   capabilities the scheduler consumes from the chat platform. The wire
//!   encoding behind them is someone else's problem.

mod error;
mod format;
mod normalize;
mod transport;
mod types;

pub use error::FormatError;
pub use format::{FormatKind, GameFormat, TargetRange};
pub use normalize::{guess_matches, to_id};
pub use transport::{ChatTransport, Moderation, PrivilegeLedger};
pub use types::{ActivityCategory, ActivityId, FormatId, Rank, RoomId, UserId};
