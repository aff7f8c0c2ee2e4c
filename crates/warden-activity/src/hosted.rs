//! Host-driven lifecycle: games run live by a human under a time budget.
//!
//! ```text
//! Created → Signups → Started → Ended
//!                └──────┴────── forced end (staff or timeout)
//! ```
//!
//! The host-conduct limit is an escalating warning chain: a first warning
//! with five minutes left on the budget, a final warning at thirty
//! seconds, and a forced end at the deadline. Each chain step schedules
//! exactly one watchdog; the one-time budget extension cancels and
//! reschedules the pending step from the new deadline.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

use warden_core::{ActivityId, GameFormat, RoomId, UserId};

use crate::{ActivityError, Effect, EndReport, Roster, TimerKind};

// ---------------------------------------------------------------------------
// HostBudget
// ---------------------------------------------------------------------------

/// Time-budget parameters for hosted games.
#[derive(Debug, Clone)]
pub struct HostBudget {
    /// Total budget from signups opening to forced end.
    pub total: Duration,
    /// First warning fires with this much budget remaining.
    pub first_warning_lead: Duration,
    /// Final warning fires with this much budget remaining.
    pub final_warning_lead: Duration,
    /// Bounds of the one-time extension.
    pub extension_min: Duration,
    pub extension_max: Duration,
}

impl Default for HostBudget {
    fn default() -> Self {
        Self {
            total: Duration::from_secs(25 * 60),
            first_warning_lead: Duration::from_secs(5 * 60),
            final_warning_lead: Duration::from_secs(30),
            extension_min: Duration::from_secs(60),
            extension_max: Duration::from_secs(2 * 60),
        }
    }
}

// ---------------------------------------------------------------------------
// HostPhase
// ---------------------------------------------------------------------------

/// Lifecycle phase of a hosted game.
///
/// A queued host request is not a phase of the instance — it lives in the
/// host queue until promotion creates the instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPhase {
    Created,
    Signups,
    Started,
    Ended,
}

// ---------------------------------------------------------------------------
// HostedGame
// ---------------------------------------------------------------------------

/// One human-hosted game instance.
pub struct HostedGame {
    id: ActivityId,
    room: RoomId,
    format: Arc<GameFormat>,
    host: UserId,
    host_name: String,
    sub_host: Option<UserId>,
    budget: HostBudget,
    /// Forced-end deadline; set when signups open.
    deadline: Option<Instant>,
    extended: bool,
    phase: HostPhase,
    roster: Roster,
    ended: bool,
}

impl HostedGame {
    pub fn new(
        id: ActivityId,
        room: RoomId,
        format: Arc<GameFormat>,
        host: UserId,
        host_name: impl Into<String>,
        budget: HostBudget,
    ) -> Self {
        Self {
            id,
            room,
            format,
            host,
            host_name: host_name.into(),
            sub_host: None,
            budget,
            deadline: None,
            extended: false,
            phase: HostPhase::Created,
            roster: Roster::new(),
            ended: false,
        }
    }

    // -- Accessors ----------------------------------------------------------

    pub fn id(&self) -> ActivityId {
        self.id
    }

    pub fn format(&self) -> &Arc<GameFormat> {
        &self.format
    }

    pub fn phase(&self) -> HostPhase {
        self.phase
    }

    pub fn ended(&self) -> bool {
        self.ended
    }

    pub fn host(&self) -> &UserId {
        &self.host
    }

    pub fn sub_host(&self) -> Option<&UserId> {
        self.sub_host.as_ref()
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Budget remaining until the forced-end deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Whether `user` holds host privileges (host or appointed sub-host).
    pub fn is_host(&self, user: &UserId) -> bool {
        &self.host == user || self.sub_host.as_ref() == Some(user)
    }

    fn require_host(&self, caller: &UserId) -> Result<(), ActivityError> {
        if self.is_host(caller) {
            Ok(())
        } else {
            Err(ActivityError::HostOnly)
        }
    }

    // -- Lifecycle ----------------------------------------------------------

    /// Opens signups and starts the host time budget.
    pub fn open_signups(&mut self) -> Vec<Effect> {
        if self.phase != HostPhase::Created {
            return Vec::new();
        }
        self.phase = HostPhase::Signups;
        self.deadline = Some(Instant::now() + self.budget.total);
        info!(
            room_id = %self.room,
            activity = %self.id,
            host = %self.host,
            budget_secs = self.budget.total.as_secs(),
            "hosted game signups opened"
        );
        vec![
            Effect::say(format!(
                "{} is hosting a game of {}! Type ``/join`` to play.",
                self.host_name, self.format.name
            )),
            Effect::StartTimer {
                kind: TimerKind::FirstWarning,
                delay: self.budget.total - self.budget.first_warning_lead,
                seq: 0,
            },
        ]
    }

    /// Host starts the game once enough players signed up.
    pub fn start(&mut self, caller: &UserId) -> Result<Vec<Effect>, ActivityError> {
        self.require_host(caller)?;
        if self.phase != HostPhase::Signups {
            return Err(ActivityError::WrongPhase(
                "the game is not in signups".into(),
            ));
        }
        if self.roster.len() < self.format.min_players {
            return Err(ActivityError::WrongPhase(format!(
                "at least {} players are needed to start",
                self.format.min_players
            )));
        }
        self.phase = HostPhase::Started;
        Ok(vec![Effect::say(format!(
            "The game of {} has started with {} players!",
            self.format.name,
            self.roster.len()
        ))])
    }

    // -- Roster -------------------------------------------------------------

    /// Self-serve join during signups.
    pub fn join(&mut self, user: UserId, name: &str) -> Result<Vec<Effect>, ActivityError> {
        if self.phase != HostPhase::Signups {
            return Err(ActivityError::WrongPhase(
                "signups for this game are closed".into(),
            ));
        }
        self.roster.join(user, name, self.format.max_players)?;
        Ok(Vec::new())
    }

    pub fn leave(&mut self, user: &UserId) -> bool {
        if self.ended {
            return false;
        }
        self.roster.leave(user)
    }

    /// Host adds a player directly, in signups or mid-game.
    pub fn add_player(
        &mut self,
        caller: &UserId,
        user: UserId,
        name: &str,
    ) -> Result<Vec<Effect>, ActivityError> {
        self.require_host(caller)?;
        if self.ended {
            return Err(ActivityError::WrongPhase("the game has ended".into()));
        }
        self.roster.join(user, name, self.format.max_players)?;
        Ok(Vec::new())
    }

    pub fn remove_player(
        &mut self,
        caller: &UserId,
        user: &UserId,
    ) -> Result<Vec<Effect>, ActivityError> {
        self.require_host(caller)?;
        if !self.roster.leave(user) {
            return Err(ActivityError::NotAParticipant(user.clone()));
        }
        Ok(Vec::new())
    }

    // -- Host privileges ----------------------------------------------------

    /// Appoints a sub-host. Only the original host may delegate.
    pub fn set_sub_host(
        &mut self,
        caller: &UserId,
        user: UserId,
        name: &str,
    ) -> Result<Vec<Effect>, ActivityError> {
        if caller != &self.host {
            return Err(ActivityError::HostOnly);
        }
        if self.ended {
            return Err(ActivityError::WrongPhase("the game has ended".into()));
        }
        self.sub_host = Some(user);
        Ok(vec![Effect::say(format!(
            "{name} is now the sub-host of {}.",
            self.format.name
        ))])
    }

    /// One-time budget extension, permitted only while more than the
    /// first-warning lead remains.
    pub fn extend(&mut self, caller: &UserId, extra: Duration) -> Result<Vec<Effect>, ActivityError> {
        self.require_host(caller)?;
        let Some(deadline) = self.deadline else {
            return Err(ActivityError::WrongPhase(
                "the time budget has not started".into(),
            ));
        };
        if self.ended {
            return Err(ActivityError::WrongPhase("the game has ended".into()));
        }
        if self.extended {
            return Err(ActivityError::ExtensionUnavailable(
                "the host time budget was already extended once".into(),
            ));
        }
        if extra < self.budget.extension_min || extra > self.budget.extension_max {
            return Err(ActivityError::ExtensionUnavailable(format!(
                "the budget may be extended by {} to {} minutes",
                self.budget.extension_min.as_secs() / 60,
                self.budget.extension_max.as_secs() / 60
            )));
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining <= self.budget.first_warning_lead {
            return Err(ActivityError::ExtensionUnavailable(
                "too little of the time budget remains to extend it".into(),
            ));
        }

        let new_deadline = deadline + extra;
        self.deadline = Some(new_deadline);
        self.extended = true;
        let to_first_warning = new_deadline
            .saturating_duration_since(Instant::now())
            .saturating_sub(self.budget.first_warning_lead);
        info!(
            room_id = %self.room,
            activity = %self.id,
            extra_secs = extra.as_secs(),
            "host budget extended"
        );
        Ok(vec![
            Effect::CancelTimer(TimerKind::FirstWarning),
            Effect::StartTimer {
                kind: TimerKind::FirstWarning,
                delay: to_first_warning,
                seq: 0,
            },
            Effect::say(format!(
                "The host's time budget was extended by {} minute(s).",
                extra.as_secs() / 60
            )),
        ])
    }

    // -- Points -------------------------------------------------------------

    pub fn award_points(
        &mut self,
        caller: &UserId,
        user: &UserId,
        name: &str,
        points: u32,
    ) -> Result<Vec<Effect>, ActivityError> {
        self.require_host(caller)?;
        if self.phase != HostPhase::Started {
            return Err(ActivityError::WrongPhase(
                "points can only be awarded in a started game".into(),
            ));
        }
        self.roster.touch(user, name);
        let total = self.roster.award(user, points);
        Ok(vec![Effect::say(format!(
            "{name} was awarded {points} point(s) and now has {total}."
        ))])
    }

    pub fn deduct_points(
        &mut self,
        caller: &UserId,
        user: &UserId,
        points: u32,
    ) -> Result<Vec<Effect>, ActivityError> {
        self.require_host(caller)?;
        if !self.format.allow_point_removal {
            return Err(ActivityError::PointRemovalNotAllowed);
        }
        if self.phase != HostPhase::Started {
            return Err(ActivityError::WrongPhase(
                "points can only be removed in a started game".into(),
            ));
        }
        if !self.roster.contains(user) {
            return Err(ActivityError::NotAParticipant(user.clone()));
        }
        self.roster.deduct(user, points);
        Ok(Vec::new())
    }

    // -- Termination --------------------------------------------------------

    /// Host declares the winner and ends the game.
    pub fn declare_winner(
        &mut self,
        caller: &UserId,
        user: &UserId,
    ) -> Result<Vec<Effect>, ActivityError> {
        self.require_host(caller)?;
        if self.phase != HostPhase::Started {
            return Err(ActivityError::WrongPhase(
                "a winner can only be declared in a started game".into(),
            ));
        }
        let Some(player) = self.roster.player(user) else {
            return Err(ActivityError::NotAParticipant(user.clone()));
        };
        let winner = (player.id.clone(), player.name.clone());
        let mut effects = vec![Effect::say(format!(
            "{} has won the game of {}!",
            winner.1, self.format.name
        ))];
        effects.extend(self.finish(Some(winner), false));
        Ok(effects)
    }

    /// Host ends the game without declaring a winner.
    pub fn end(&mut self, caller: &UserId) -> Result<Vec<Effect>, ActivityError> {
        self.require_host(caller)?;
        if self.ended {
            return Err(ActivityError::WrongPhase("the game has ended".into()));
        }
        let mut effects = vec![Effect::say(format!(
            "The game of {} has ended.",
            self.format.name
        ))];
        effects.extend(self.finish(None, false));
        Ok(effects)
    }

    /// Forced termination by staff or by the budget deadline.
    pub fn force_end(&mut self, reason: &str) -> Vec<Effect> {
        if self.ended {
            return Vec::new();
        }
        warn!(
            room_id = %self.room,
            activity = %self.id,
            host = %self.host,
            reason,
            "hosted game force-ended"
        );
        let mut effects = vec![Effect::say(format!(
            "The game of {} was forcibly ended. ({reason})",
            self.format.name
        ))];
        effects.extend(self.finish(None, true));
        effects
    }

    // -- Timer handling -----------------------------------------------------

    /// Advances the warning chain. Delays are recomputed from the live
    /// deadline so an extension granted mid-chain shifts every later step.
    pub fn on_timer(&mut self, kind: TimerKind, _seq: u64) -> Vec<Effect> {
        if self.ended {
            return Vec::new();
        }
        let Some(deadline) = self.deadline else {
            return Vec::new();
        };
        match kind {
            TimerKind::FirstWarning => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                vec![
                    Effect::say(format!(
                        "{} minutes remain in the host's time budget.",
                        remaining.as_secs() / 60
                    )),
                    Effect::StartTimer {
                        kind: TimerKind::FinalWarning,
                        delay: remaining.saturating_sub(self.budget.final_warning_lead),
                        seq: 0,
                    },
                ]
            }
            TimerKind::FinalWarning => {
                vec![
                    Effect::say(format!(
                        "{} seconds remain! Wrap up the game NOW or it will be ended.",
                        self.budget.final_warning_lead.as_secs()
                    )),
                    Effect::StartTimer {
                        kind: TimerKind::Deadline,
                        delay: self.budget.final_warning_lead,
                        seq: 0,
                    },
                ]
            }
            TimerKind::Deadline => self.force_end("the host's time budget ran out"),
            // Not a hosted-game timer.
            _ => Vec::new(),
        }
    }

    // -- Internals ----------------------------------------------------------

    /// The single transition into `Ended`. Sticky.
    fn finish(&mut self, winner: Option<(UserId, String)>, forced: bool) -> Vec<Effect> {
        if self.ended {
            return Vec::new();
        }
        self.ended = true;
        self.phase = HostPhase::Ended;
        let (winner_id, winner_name) = match winner {
            Some((id, name)) => (Some(id), Some(name)),
            None => (None, None),
        };
        info!(
            room_id = %self.room,
            activity = %self.id,
            host = %self.host,
            forced,
            "hosted game ended"
        );
        vec![Effect::Ended(EndReport {
            winner: winner_id,
            winner_name,
            ledger: self.roster.ledger_clone(),
            forced,
        })]
    }
}
