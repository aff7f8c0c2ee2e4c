//! Per-room scheduling for Gamewarden.
//!
//! Each room the bot sits in gets one actor task owning that room's
//! activity slot, cooldowns, host queue, and live watchdogs. Commands and
//! timer events share one channel per room, so room state is only ever
//! touched from one task and check-then-set is race-free by construction.
//!
//! # Key types
//!
//! - [`Scheduler`] — the facade command handlers call
//! - [`RoomHandle`] — send commands to a running room actor
//! - [`FormatRegistry`] — every game the scheduler can start
//! - [`SchedulerConfig`] — timing, cooldowns, queue capacity
//! - [`RejectReason`] — why an operation was refused

mod actor;
mod config;
mod error;
mod registry;
mod scheduler;

pub use actor::{ActivityStatus, CreateKind, HostAction, RoomHandle, RoomStatus};
pub use config::SchedulerConfig;
pub use error::RejectReason;
pub use registry::{ContentFactory, FormatRegistry};
pub use scheduler::Scheduler;
