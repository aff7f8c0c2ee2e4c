//! Scheduler configuration.

use std::time::Duration;

use tracing::warn;

use warden_activity::{EngineTiming, HostBudget};
use warden_sched::CooldownConfig;

/// Full configuration for a scheduler and the room actors it spawns.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Per-category cooldown durations.
    pub cooldowns: CooldownConfig,

    /// Host queue capacity per room.
    pub queue_capacity: usize,

    /// Signup window and between-round pause for automated games.
    pub timing: EngineTiming,

    /// Time budget and warning leads for hosted games.
    pub budget: HostBudget,

    /// How long a challenged user has to accept.
    pub accept_window: Duration,

    /// Delay before the defending bot guesses in a bot challenge.
    pub bot_move_delay: Duration,

    /// Upper bound on any single reward payout in bits. 0 = uncapped.
    pub payout_cap: u32,

    /// Whether at least one automated game must run between two hosted
    /// games in the same room.
    pub require_scripted_between_hosted: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            cooldowns: CooldownConfig::default(),
            queue_capacity: 5,
            timing: EngineTiming::default(),
            budget: HostBudget::default(),
            accept_window: Duration::from_secs(60),
            bot_move_delay: Duration::from_secs(5),
            payout_cap: 1_000,
            require_scripted_between_hosted: true,
        }
    }
}

impl SchedulerConfig {
    /// Clamp and fix any out-of-range values so the config is safe to use.
    ///
    /// Called automatically by `Scheduler::new`. Rules:
    /// - `queue_capacity` is at least 1.
    /// - The host budget's warning leads must fit inside the total budget,
    ///   and the final lead inside the first.
    /// - The extension bounds must be ordered.
    pub fn validated(mut self) -> Self {
        if self.queue_capacity == 0 {
            warn!("queue_capacity of 0 would reject every host — clamping to 1");
            self.queue_capacity = 1;
        }
        if self.budget.first_warning_lead >= self.budget.total {
            warn!(
                lead_secs = self.budget.first_warning_lead.as_secs(),
                total_secs = self.budget.total.as_secs(),
                "first warning lead exceeds the host budget — clamping to half"
            );
            self.budget.first_warning_lead = self.budget.total / 2;
        }
        if self.budget.final_warning_lead >= self.budget.first_warning_lead {
            warn!(
                final_secs = self.budget.final_warning_lead.as_secs(),
                first_secs = self.budget.first_warning_lead.as_secs(),
                "final warning lead exceeds the first — clamping to half"
            );
            self.budget.final_warning_lead = self.budget.first_warning_lead / 2;
        }
        if self.budget.extension_min > self.budget.extension_max {
            warn!("extension bounds are inverted — swapping");
            std::mem::swap(
                &mut self.budget.extension_min,
                &mut self.budget.extension_max,
            );
        }
        self
    }
}
