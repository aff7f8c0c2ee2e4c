//! Activity state machines for Gamewarden.
//!
//! Every game running in a room is one of three shapes, all driven the
//! same way: synchronous, effect-returning state machines. A command or a
//! timer event goes in, a list of [`Effect`]s comes out, and the room
//! actor interprets them (post announcements, arm watchdogs, tear the
//! activity down). Nothing in this crate does I/O or waits.
//!
//! - [`RoundEngine`] — automated round loop: hint out, guesses in, points
//!   awarded, winner at the target score.
//! - [`HostedGame`] — a human host under a time budget with an
//!   escalating warning chain.
//! - [`ChildGameCoordinator`] — composes a child [`RoundEngine`] to run
//!   one-vs-one and bot-challenge formats.
//! - [`Activity`] — the enum the room slot actually holds.
//!
//! Content modules plug in through [`GameContent`]; the engine holds the
//! capability set, not a class hierarchy.

mod child;
mod content;
mod effect;
mod engine;
mod error;
mod hosted;
mod instance;
mod roster;

pub use child::{ChallengePhase, ChildGameCoordinator, Opponent};
pub use content::{Capabilities, GameContent, RoundData};
pub use effect::{Effect, EndReport, TimerKind};
pub use engine::{EngineState, EngineTiming, RoundEngine};
pub use error::ActivityError;
pub use hosted::{HostBudget, HostPhase, HostedGame};
pub use instance::Activity;
pub use roster::{Player, Roster, Team};
