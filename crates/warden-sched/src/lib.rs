//! Scheduling gates and bookkeeping for Gamewarden.
//!
//! Everything here is plain owned state, constructed per room actor and
//! injected into handlers — never a process-wide singleton — so tests can
//! build isolated instances.
//!
//! - [`CooldownRegistry`] — per-room, per-category "how long until this
//!   kind of activity may start again".
//! - [`HostQueue`] — per-room FIFO of pending human-hosted game requests.
//! - [`SchedulerStore`] — the persistence seam; cooldowns, queues, and
//!   last-activity timestamps survive process restarts through it.
//! - [`convert_rewards`] — points-to-bits conversion at activity end.

mod cooldown;
mod queue;
mod rewards;
mod store;

pub use cooldown::{CooldownCategory, CooldownConfig, CooldownRegistry};
pub use queue::{HostQueue, HostQueueEntry, QueueError};
pub use rewards::{RewardPayout, convert_rewards};
pub use store::{JsonFileStore, MemoryStore, RoomRecord, SchedulerStore, StoreError};
