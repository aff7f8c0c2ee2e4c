//! The round engine: the generic loop behind every automated game.
//!
//! ```text
//! AwaitingSignups → RoundActive → {won | timed out} → RoundActive … → Ended
//! ```
//!
//! Each transition (re)schedules exactly one watchdog and cancels any it
//! supersedes. Timer events echo the round number they were scheduled
//! for; a mismatch means the round already ended and the event is a
//! stale callback, dropped without effect. The same goes for any guess
//! arriving after `ended` — silently ignored, never an error.

use std::sync::Arc;

use tracing::{debug, info};

use warden_core::{ActivityId, GameFormat, RoomId, UserId};

use crate::{
    ActivityError, Effect, EndReport, GameContent, RoundData, Roster, TimerKind,
};

// ---------------------------------------------------------------------------
// EngineTiming
// ---------------------------------------------------------------------------

/// Engine-level timing not owned by the format.
#[derive(Debug, Clone)]
pub struct EngineTiming {
    /// Signup window for fixed-roster formats.
    pub signup_window: std::time::Duration,
    /// Pause between a round ending and the next hint.
    pub between_rounds: std::time::Duration,
}

impl Default for EngineTiming {
    fn default() -> Self {
        Self {
            signup_window: std::time::Duration::from_secs(60),
            between_rounds: std::time::Duration::from_secs(7),
        }
    }
}

// ---------------------------------------------------------------------------
// EngineState
// ---------------------------------------------------------------------------

/// Lifecycle state of the round loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    AwaitingSignups,
    RoundActive,
    BetweenRounds,
    Ended,
}

// ---------------------------------------------------------------------------
// RoundEngine
// ---------------------------------------------------------------------------

/// One automated game: a content module plus the round loop around it.
pub struct RoundEngine {
    id: ActivityId,
    room: RoomId,
    format: Arc<GameFormat>,
    content: Box<dyn GameContent>,
    timing: EngineTiming,
    /// Points needed to win, resolved from the format's target range.
    target: u32,
    state: EngineState,
    /// Round counter, starts at 1 with the first round.
    round: u64,
    current: Option<RoundData>,
    roster: Roster,
    started: bool,
    ended: bool,
}

impl RoundEngine {
    pub fn new(
        id: ActivityId,
        room: RoomId,
        format: Arc<GameFormat>,
        content: Box<dyn GameContent>,
        target: u32,
        timing: EngineTiming,
    ) -> Self {
        Self {
            id,
            room,
            format,
            content,
            timing,
            target,
            state: EngineState::AwaitingSignups,
            round: 0,
            current: None,
            roster: Roster::new(),
            started: false,
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

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn target(&self) -> u32 {
        self.target
    }

    pub fn ended(&self) -> bool {
        self.ended
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// The guess the defending bot would make for the current round, if
    /// the content module supports bot play.
    pub fn bot_line(&self) -> Option<String> {
        self.current.as_ref().and_then(|r| self.content.bot_guess(r))
    }

    // -- Lifecycle ----------------------------------------------------------

    /// Opens the game: free-join formats start their first round
    /// immediately, fixed-roster formats open a signup window.
    pub fn open(&mut self) -> Vec<Effect> {
        if self.started || self.ended {
            return Vec::new();
        }
        if self.format.free_join {
            let mut effects = vec![Effect::say(format!(
                "A game of {} is starting!",
                self.format.name
            ))];
            effects.extend(self.start_now());
            effects
        } else {
            info!(room_id = %self.room, activity = %self.id, "signups opened");
            vec![
                Effect::say(format!(
                    "A game of {} is starting! Type ``/join`` to play.",
                    self.format.name
                )),
                Effect::StartTimer {
                    kind: TimerKind::Signups,
                    delay: self.timing.signup_window,
                    seq: 0,
                },
            ]
        }
    }

    /// Starts the first round, bypassing signups. Used for free-join
    /// formats and for child games whose roster is inherited.
    pub fn start_now(&mut self) -> Vec<Effect> {
        if self.started || self.ended {
            return Vec::new();
        }
        self.started = true;
        self.begin_round()
    }

    /// Adds a player. Fixed-roster formats only accept joins before the
    /// first round; free-join formats accept them any time.
    pub fn join(&mut self, user: UserId, name: &str) -> Result<Vec<Effect>, ActivityError> {
        if self.ended {
            return Err(ActivityError::WrongPhase(
                "this game has already ended".into(),
            ));
        }
        if self.started && !self.format.free_join {
            return Err(ActivityError::WrongPhase(
                "signups for this game have closed".into(),
            ));
        }
        self.roster.join(user, name, self.format.max_players)?;
        Ok(Vec::new())
    }

    /// Removes a player. Returns `true` if they were in the game.
    pub fn leave(&mut self, user: &UserId) -> bool {
        self.roster.leave(user)
    }

    /// Splits the roster into teams. Only meaningful once the game has
    /// started.
    pub fn split_teams(&mut self, count: usize, names: &[&str]) -> Result<(), ActivityError> {
        if !self.started || self.ended {
            return Err(ActivityError::WrongPhase(
                "teams can only be made in a running game".into(),
            ));
        }
        self.roster.split_teams(count, names)
    }

    pub fn unsplit_teams(&mut self) {
        self.roster.unsplit();
    }

    // -- Guess handling -----------------------------------------------------

    /// Evaluates a guess. Guesses outside an active round, after the game
    /// ended, or from eliminated players are silently ignored — this is
    /// the primary defense against timer races.
    pub fn handle_guess(&mut self, user: &UserId, name: &str, guess: &str) -> Vec<Effect> {
        if self.ended || self.state != EngineState::RoundActive {
            return Vec::new();
        }
        if self.format.free_join {
            self.roster.touch(user, name);
        }
        if !self.roster.can_act(user) {
            return Vec::new();
        }
        let Some(current) = &self.current else {
            return Vec::new();
        };
        let Some(answer) = self.content.evaluate_guess(current, guess) else {
            self.content.on_incorrect_guess(user, guess);
            return Vec::new();
        };

        let points = if self.content.capabilities().variable_points {
            self.content.points_for(&answer)
        } else {
            1
        };
        let total = self.roster.award(user, points);
        self.content.on_correct_guess(user, &answer);
        debug!(
            room_id = %self.room,
            activity = %self.id,
            %user,
            round = self.round,
            points,
            total,
            "correct guess"
        );

        let mut effects = vec![Effect::CancelTimer(TimerKind::Round)];
        if total >= self.target {
            effects.push(Effect::say(format!(
                "Correct! {name} guessed {answer} and wins with {total} points!"
            )));
            effects.extend(self.finish(Some((user.clone(), name.to_string())), false));
        } else {
            effects.push(Effect::say(format!(
                "Correct! {name} guessed {answer} and has {total} point(s)."
            )));
            self.state = EngineState::BetweenRounds;
            effects.push(Effect::StartTimer {
                kind: TimerKind::NextRound,
                delay: self.timing.between_rounds,
                seq: self.round,
            });
        }
        effects
    }

    // -- Timer handling -----------------------------------------------------

    /// Handles a watchdog firing. Events for rounds that already ended
    /// (stale `seq`) or for an ended game are no-ops.
    pub fn on_timer(&mut self, kind: TimerKind, seq: u64) -> Vec<Effect> {
        if self.ended {
            return Vec::new();
        }
        match kind {
            TimerKind::Signups => {
                if self.state != EngineState::AwaitingSignups {
                    return Vec::new();
                }
                if self.roster.len() < self.format.min_players {
                    let mut effects = vec![Effect::say(format!(
                        "The game of {} did not get enough players and was cancelled.",
                        self.format.name
                    ))];
                    effects.extend(self.finish(None, false));
                    effects
                } else {
                    self.start_now()
                }
            }
            TimerKind::Round => {
                if self.state != EngineState::RoundActive || seq != self.round {
                    return Vec::new();
                }
                let answers = self
                    .current
                    .as_ref()
                    .map(|r| r.answers.join(", "))
                    .unwrap_or_default();
                let mut effects = vec![Effect::say(format!("Time's up! The answer: {answers}"))];
                if self.format.single_attempt {
                    effects.extend(self.finish(None, false));
                } else {
                    self.state = EngineState::BetweenRounds;
                    effects.push(Effect::StartTimer {
                        kind: TimerKind::NextRound,
                        delay: self.timing.between_rounds,
                        seq: self.round,
                    });
                }
                effects
            }
            TimerKind::NextRound => {
                if self.state != EngineState::BetweenRounds || seq != self.round {
                    return Vec::new();
                }
                self.begin_round()
            }
            // Not an engine timer.
            _ => Vec::new(),
        }
    }

    // -- Termination --------------------------------------------------------

    /// Forced termination by a privileged user. No winner is declared.
    pub fn force_end(&mut self, reason: &str) -> Vec<Effect> {
        if self.ended {
            return Vec::new();
        }
        let mut effects = vec![Effect::say(format!(
            "The game of {} was forcibly ended. ({reason})",
            self.format.name
        ))];
        effects.extend(self.finish(None, true));
        effects
    }

    // -- Internals ----------------------------------------------------------

    fn begin_round(&mut self) -> Vec<Effect> {
        self.round += 1;
        let data = self.content.compute_round(self.round);
        let hint = data.hint.clone();
        self.current = Some(data);
        self.state = EngineState::RoundActive;
        debug!(room_id = %self.room, activity = %self.id, round = self.round, "round opened");
        vec![
            Effect::RoundStarted {
                round: self.round,
                hint: hint.clone(),
            },
            Effect::say(format!("Round {} | {hint}", self.round)),
            Effect::StartTimer {
                kind: TimerKind::Round,
                delay: self.format.round_duration,
                seq: self.round,
            },
        ]
    }

    /// The single transition into `Ended`. Sticky: a second call is a
    /// no-op, so end-of-activity bookkeeping runs exactly once.
    fn finish(&mut self, winner: Option<(UserId, String)>, forced: bool) -> Vec<Effect> {
        if self.ended {
            return Vec::new();
        }
        self.ended = true;
        self.state = EngineState::Ended;
        self.current = None;
        let (winner_id, winner_name) = match winner {
            Some((id, name)) => (Some(id), Some(name)),
            None => (None, None),
        };
        info!(
            room_id = %self.room,
            activity = %self.id,
            rounds = self.round,
            winner = winner_name.as_deref().unwrap_or("none"),
            forced,
            "game ended"
        );
        vec![Effect::Ended(EndReport {
            winner: winner_id,
            winner_name,
            ledger: self.roster.ledger_clone(),
            forced,
        })]
    }
}
