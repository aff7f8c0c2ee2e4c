//! Challenge coordination: one-vs-one and bot-defended formats.
//!
//! The coordinator composes a fresh child [`RoundEngine`] scoped to the
//! two participants. Child effects bubble through the coordinator, which
//! consumes `RoundStarted` events to drive the bot participant and the
//! child's end report to decide the aggregate winner by strictly-greater
//! point comparison — an exact tie declares no winner.
//!
//! Privilege side effects (modchat changes, rank grants for unranked
//! challengers) are the room actor's job, recorded in a
//! `PrivilegeLedger` and rolled back on every exit path.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use warden_core::{ActivityId, GameFormat, RoomId, UserId};

use crate::{
    ActivityError, Effect, EndReport, EngineTiming, GameContent, RoundEngine, TimerKind,
};

/// The challenged party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Opponent {
    User { id: UserId, name: String },
    /// The bot defends; it answers through the content module's
    /// `bot_guess` after a configured delay.
    Bot { name: String },
}

impl Opponent {
    pub fn id(&self) -> UserId {
        match self {
            Self::User { id, .. } => id.clone(),
            Self::Bot { name } => UserId::from_name(name),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::User { name, .. } => name,
            Self::Bot { name } => name,
        }
    }

    pub fn is_bot(&self) -> bool {
        matches!(self, Self::Bot { .. })
    }
}

/// Lifecycle phase of a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengePhase {
    AwaitingAccept,
    Running,
    Ended,
}

/// Coordinates a child game between a challenger and an opponent.
pub struct ChildGameCoordinator {
    id: ActivityId,
    child_id: ActivityId,
    room: RoomId,
    format: Arc<GameFormat>,
    challenger: (UserId, String),
    opponent: Opponent,
    target: u32,
    timing: EngineTiming,
    accept_window: Duration,
    bot_delay: Duration,
    /// Held until acceptance, then moved into the child engine.
    content: Option<Box<dyn GameContent>>,
    child: Option<RoundEngine>,
    phase: ChallengePhase,
    ended: bool,
}

impl std::fmt::Debug for ChildGameCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChildGameCoordinator")
            .field("id", &self.id)
            .field("child_id", &self.child_id)
            .field("room", &self.room)
            .field("challenger", &self.challenger)
            .field("opponent", &self.opponent)
            .field("target", &self.target)
            .field("phase", &self.phase)
            .field("ended", &self.ended)
            .finish_non_exhaustive()
    }
}

impl ChildGameCoordinator {
    /// Builds a coordinator, checking the content module's declared
    /// capabilities up front. A bot-defended challenge against a module
    /// without bot play is a configuration error, fatal at creation.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ActivityId,
        child_id: ActivityId,
        room: RoomId,
        format: Arc<GameFormat>,
        challenger: (UserId, String),
        opponent: Opponent,
        target: u32,
        content: Box<dyn GameContent>,
        timing: EngineTiming,
        accept_window: Duration,
        bot_delay: Duration,
    ) -> Result<Self, ActivityError> {
        if opponent.is_bot() && !content.capabilities().bot_play {
            return Err(ActivityError::MissingCapability {
                format: format.id.clone(),
                capability: "bot_play",
            });
        }
        Ok(Self {
            id,
            child_id,
            room,
            format,
            challenger,
            opponent,
            target,
            timing,
            accept_window,
            bot_delay,
            content: Some(content),
            child: None,
            phase: ChallengePhase::AwaitingAccept,
            ended: false,
        })
    }

    // -- Accessors ----------------------------------------------------------

    pub fn id(&self) -> ActivityId {
        self.id
    }

    pub fn format(&self) -> &Arc<GameFormat> {
        &self.format
    }

    pub fn phase(&self) -> ChallengePhase {
        self.phase
    }

    pub fn ended(&self) -> bool {
        self.ended
    }

    pub fn participants(&self) -> [UserId; 2] {
        [self.challenger.0.clone(), self.opponent.id()]
    }

    // -- Lifecycle ----------------------------------------------------------

    /// Announces the challenge. A bot opponent accepts implicitly and the
    /// child game starts at once; a human opponent gets an acceptance
    /// window bounded by a watchdog.
    pub fn open(&mut self) -> Vec<Effect> {
        if self.ended || self.phase != ChallengePhase::AwaitingAccept {
            return Vec::new();
        }
        match &self.opponent {
            Opponent::Bot { name } => {
                let mut effects = vec![Effect::say(format!(
                    "{} challenges {name} to a game of {}!",
                    self.challenger.1, self.format.name
                ))];
                effects.extend(self.start_child());
                effects
            }
            Opponent::User { name, .. } => vec![
                Effect::say(format!(
                    "{} challenges {name} to a game of {}! {name} has {} seconds to accept.",
                    self.challenger.1,
                    self.format.name,
                    self.accept_window.as_secs()
                )),
                Effect::StartTimer {
                    kind: TimerKind::AcceptWindow,
                    delay: self.accept_window,
                    seq: 0,
                },
            ],
        }
    }

    /// The challenged user accepts.
    pub fn accept(&mut self, user: &UserId) -> Result<Vec<Effect>, ActivityError> {
        if self.phase != ChallengePhase::AwaitingAccept {
            return Err(ActivityError::WrongPhase(
                "there is no pending challenge to accept".into(),
            ));
        }
        match &self.opponent {
            Opponent::User { id, .. } if id == user => {}
            _ => return Err(ActivityError::NotAParticipant(user.clone())),
        }
        let mut effects = vec![Effect::CancelTimer(TimerKind::AcceptWindow)];
        effects.extend(self.start_child());
        Ok(effects)
    }

    /// The challenged user declines; the challenge ends with no winner.
    pub fn decline(&mut self, user: &UserId) -> Result<Vec<Effect>, ActivityError> {
        if self.phase != ChallengePhase::AwaitingAccept {
            return Err(ActivityError::WrongPhase(
                "there is no pending challenge to decline".into(),
            ));
        }
        match &self.opponent {
            Opponent::User { id, name } if id == user => {
                let name = name.clone();
                let mut effects = vec![
                    Effect::CancelTimer(TimerKind::AcceptWindow),
                    Effect::say(format!("{name} declined the challenge.")),
                ];
                effects.extend(self.abort());
                Ok(effects)
            }
            _ => Err(ActivityError::NotAParticipant(user.clone())),
        }
    }

    /// Forwards a participant's guess into the child game.
    pub fn handle_guess(&mut self, user: &UserId, name: &str, guess: &str) -> Vec<Effect> {
        if self.ended {
            return Vec::new();
        }
        let Some(child) = &mut self.child else {
            return Vec::new();
        };
        let effects = child.handle_guess(user, name, guess);
        self.process_child(effects)
    }

    /// Handles both the coordinator's own timers and the child's.
    pub fn on_timer(&mut self, kind: TimerKind, seq: u64) -> Vec<Effect> {
        if self.ended {
            return Vec::new();
        }
        match kind {
            TimerKind::AcceptWindow => {
                if self.phase != ChallengePhase::AwaitingAccept {
                    return Vec::new();
                }
                let mut effects = vec![Effect::say(format!(
                    "{} did not accept the challenge in time.",
                    self.opponent.name()
                ))];
                effects.extend(self.abort());
                effects
            }
            TimerKind::BotMove => {
                let Some(child) = &mut self.child else {
                    return Vec::new();
                };
                // Stale if the round moved on before the bot acted.
                if seq != child.round() {
                    return Vec::new();
                }
                let Some(line) = child.bot_line() else {
                    return Vec::new();
                };
                let bot_id = self.opponent.id();
                let bot_name = self.opponent.name().to_string();
                debug!(room_id = %self.room, activity = %self.child_id, round = seq, "bot move");
                let effects = child.handle_guess(&bot_id, &bot_name, &line);
                self.process_child(effects)
            }
            _ => {
                let Some(child) = &mut self.child else {
                    return Vec::new();
                };
                let effects = child.on_timer(kind, seq);
                self.process_child(effects)
            }
        }
    }

    /// Forced termination; ends the child too and reports its ledger.
    pub fn force_end(&mut self, reason: &str) -> Vec<Effect> {
        if self.ended {
            return Vec::new();
        }
        self.ended = true;
        self.phase = ChallengePhase::Ended;
        let ledger = self
            .child
            .take()
            .map(|c| c.roster().ledger_clone())
            .unwrap_or_default();
        vec![
            Effect::say(format!(
                "The challenge of {} was forcibly ended. ({reason})",
                self.format.name
            )),
            Effect::Ended(EndReport::no_winner(ledger, true)),
        ]
    }

    // -- Internals ----------------------------------------------------------

    fn start_child(&mut self) -> Vec<Effect> {
        let Some(content) = self.content.take() else {
            return Vec::new();
        };
        self.phase = ChallengePhase::Running;
        let mut engine = RoundEngine::new(
            self.child_id,
            self.room.clone(),
            self.format.clone(),
            content,
            self.target,
            self.timing.clone(),
        );
        // The roster is inherited from the coordinator, so the child
        // skips signups entirely. Joins into an empty engine cannot fail.
        let _ = engine.join(self.challenger.0.clone(), &self.challenger.1);
        let _ = engine.join(self.opponent.id(), self.opponent.name());
        let effects = engine.start_now();
        self.child = Some(engine);
        info!(
            room_id = %self.room,
            activity = %self.id,
            child = %self.child_id,
            target = self.target,
            "child game started"
        );
        self.process_child(effects)
    }

    /// Routes child effects outward, intercepting the ones the
    /// coordinator acts on.
    fn process_child(&mut self, effects: Vec<Effect>) -> Vec<Effect> {
        let mut out = Vec::new();
        for effect in effects {
            match effect {
                Effect::RoundStarted { round, .. } => {
                    if self.opponent.is_bot() {
                        out.push(Effect::StartTimer {
                            kind: TimerKind::BotMove,
                            delay: self.bot_delay,
                            seq: round,
                        });
                    }
                }
                Effect::Ended(report) => {
                    out.extend(self.conclude(report));
                }
                other => out.push(other),
            }
        }
        out
    }

    /// Decides the aggregate winner from the child's final ledger.
    /// Strictly-greater comparison: an exact tie declares no winner.
    fn conclude(&mut self, report: EndReport) -> Vec<Effect> {
        if self.ended {
            return Vec::new();
        }
        self.ended = true;
        self.phase = ChallengePhase::Ended;
        self.child = None;

        let left_points = report.ledger.get(&self.challenger.0).copied().unwrap_or(0);
        let right_points = report.ledger.get(&self.opponent.id()).copied().unwrap_or(0);
        let winner = if left_points > right_points {
            Some((self.challenger.0.clone(), self.challenger.1.clone()))
        } else if right_points > left_points {
            Some((self.opponent.id(), self.opponent.name().to_string()))
        } else {
            None
        };

        let announcement = match &winner {
            Some((_, name)) => format!(
                "{name} wins the challenge, {}-{}!",
                left_points.max(right_points),
                left_points.min(right_points)
            ),
            None => format!(
                "The challenge ends in a tie, {left_points}-{right_points}. No winner is declared."
            ),
        };
        let (winner_id, winner_name) = match winner {
            Some((id, name)) => (Some(id), Some(name)),
            None => (None, None),
        };
        vec![
            Effect::say(announcement),
            Effect::Ended(EndReport {
                winner: winner_id,
                winner_name,
                ledger: report.ledger,
                forced: report.forced,
            }),
        ]
    }

    /// Ends a challenge that never started (declined or expired).
    fn abort(&mut self) -> Vec<Effect> {
        if self.ended {
            return Vec::new();
        }
        self.ended = true;
        self.phase = ChallengePhase::Ended;
        vec![Effect::Ended(EndReport::no_winner(HashMap::new(), false))]
    }
}
