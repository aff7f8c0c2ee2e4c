//! Round-engine behavior: the automated loop from open to winner.

use std::sync::Arc;

use warden_activity::{
    Activity, ActivityError, Capabilities, Effect, EngineState, EngineTiming, GameContent,
    RoundData, RoundEngine, TimerKind,
};
use warden_core::{ActivityId, GameFormat, RoomId, UserId};

// ===========================================================================
// Helpers
// ===========================================================================

/// Content module whose answer is always "pikachu".
struct FixedAnswer;

impl GameContent for FixedAnswer {
    fn compute_round(&mut self, round: u64) -> RoundData {
        RoundData {
            hint: format!("hint {round}"),
            answers: vec!["Pikachu".into()],
        }
    }
}

/// Content module that awards answer-specific point values.
struct WeightedAnswer;

impl GameContent for WeightedAnswer {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            bot_play: false,
            variable_points: true,
        }
    }

    fn compute_round(&mut self, round: u64) -> RoundData {
        RoundData {
            hint: format!("hint {round}"),
            answers: vec!["Mega Lucario".into()],
        }
    }

    fn points_for(&self, _answer: &str) -> u32 {
        2
    }
}

fn uid(name: &str) -> UserId {
    UserId::from_name(name)
}

fn scripted_engine(target: u32) -> RoundEngine {
    let format = Arc::new(GameFormat::scripted("trivia", "Trivia"));
    RoundEngine::new(
        ActivityId(1),
        RoomId::new("lobby"),
        format,
        Box::new(FixedAnswer),
        target,
        EngineTiming::default(),
    )
}

fn contains_ended(effects: &[Effect]) -> bool {
    effects.iter().any(|e| matches!(e, Effect::Ended(_)))
}

/// Advances the engine through the between-rounds pause into the next
/// round, returning the effects of the new round.
fn next_round(engine: &mut RoundEngine) -> Vec<Effect> {
    assert_eq!(engine.state(), EngineState::BetweenRounds);
    engine.on_timer(TimerKind::NextRound, engine.round())
}

// ===========================================================================
// Opening
// ===========================================================================

#[test]
fn test_free_join_format_starts_first_round_immediately() {
    let mut engine = scripted_engine(3);
    let effects = engine.open();

    assert_eq!(engine.state(), EngineState::RoundActive);
    assert_eq!(engine.round(), 1);
    assert!(effects
        .iter()
        .any(|e| matches!(e, Effect::RoundStarted { round: 1, .. })));
    assert!(effects.iter().any(|e| matches!(
        e,
        Effect::StartTimer {
            kind: TimerKind::Round,
            seq: 1,
            ..
        }
    )));
}

#[test]
fn test_fixed_roster_format_opens_signup_window() {
    let mut format = GameFormat::scripted("trivia", "Trivia");
    format.free_join = false;
    format.min_players = 2;
    let mut engine = RoundEngine::new(
        ActivityId(1),
        RoomId::new("lobby"),
        Arc::new(format),
        Box::new(FixedAnswer),
        3,
        EngineTiming::default(),
    );

    let effects = engine.open();
    assert_eq!(engine.state(), EngineState::AwaitingSignups);
    assert!(effects.iter().any(|e| matches!(
        e,
        Effect::StartTimer {
            kind: TimerKind::Signups,
            ..
        }
    )));

    engine.join(uid("Ann"), "Ann").unwrap();
    engine.join(uid("Bob"), "Bob").unwrap();
    let effects = engine.on_timer(TimerKind::Signups, 0);
    assert_eq!(engine.state(), EngineState::RoundActive);
    assert!(effects
        .iter()
        .any(|e| matches!(e, Effect::RoundStarted { round: 1, .. })));
}

#[test]
fn test_signup_window_without_enough_players_cancels() {
    let mut format = GameFormat::scripted("trivia", "Trivia");
    format.free_join = false;
    format.min_players = 2;
    let mut engine = RoundEngine::new(
        ActivityId(1),
        RoomId::new("lobby"),
        Arc::new(format),
        Box::new(FixedAnswer),
        3,
        EngineTiming::default(),
    );

    engine.open();
    engine.join(uid("Ann"), "Ann").unwrap();
    let effects = engine.on_timer(TimerKind::Signups, 0);
    assert!(contains_ended(&effects));
    assert!(engine.ended());
}

#[test]
fn test_joins_close_when_fixed_roster_game_starts() {
    let mut format = GameFormat::scripted("trivia", "Trivia");
    format.free_join = false;
    format.min_players = 1;
    let mut engine = RoundEngine::new(
        ActivityId(1),
        RoomId::new("lobby"),
        Arc::new(format),
        Box::new(FixedAnswer),
        3,
        EngineTiming::default(),
    );

    engine.open();
    engine.join(uid("Ann"), "Ann").unwrap();
    engine.on_timer(TimerKind::Signups, 0);

    assert!(matches!(
        engine.join(uid("Bob"), "Bob"),
        Err(ActivityError::WrongPhase(_))
    ));
}

// ===========================================================================
// Guessing and winning
// ===========================================================================

#[test]
fn test_first_to_target_wins() {
    let mut engine = scripted_engine(3);
    engine.open();

    for expected_round in 1..=2u64 {
        assert_eq!(engine.round(), expected_round);
        let effects = engine.handle_guess(&uid("Ann"), "Ann", "pikachu");
        assert!(!contains_ended(&effects));
        next_round(&mut engine);
    }

    let effects = engine.handle_guess(&uid("Ann"), "Ann", "pikachu");
    let report = effects
        .iter()
        .find_map(|e| match e {
            Effect::Ended(r) => Some(r.clone()),
            _ => None,
        })
        .expect("third correct guess should end the game");
    assert_eq!(report.winner, Some(uid("Ann")));
    assert_eq!(report.ledger.get(&uid("Ann")), Some(&3));
    assert!(!report.forced);
}

#[test]
fn test_incorrect_guess_changes_nothing() {
    let mut engine = scripted_engine(3);
    engine.open();

    let effects = engine.handle_guess(&uid("Ann"), "Ann", "charmander");
    assert!(effects.is_empty());
    assert_eq!(engine.state(), EngineState::RoundActive);
    assert_eq!(engine.roster().points(&uid("Ann")), 0);
}

#[test]
fn test_forme_prefixed_guess_matches_forme_answer() {
    let format = Arc::new(GameFormat::scripted("trivia", "Trivia"));
    let mut engine = RoundEngine::new(
        ActivityId(1),
        RoomId::new("lobby"),
        format,
        Box::new(WeightedAnswer),
        4,
        EngineTiming::default(),
    );
    engine.open();

    // "lucario mega" folds to the stored "Mega Lucario"; the module's
    // answer-specific value applies because it declares variable_points.
    let effects = engine.handle_guess(&uid("Ann"), "Ann", "lucario mega");
    assert!(!effects.is_empty());
    assert_eq!(engine.roster().points(&uid("Ann")), 2);
}

#[test]
fn test_guesses_between_rounds_are_ignored() {
    let mut engine = scripted_engine(3);
    engine.open();
    engine.handle_guess(&uid("Ann"), "Ann", "pikachu");
    assert_eq!(engine.state(), EngineState::BetweenRounds);

    let effects = engine.handle_guess(&uid("Bob"), "Bob", "pikachu");
    assert!(effects.is_empty());
    assert_eq!(engine.roster().points(&uid("Bob")), 0);
}

// ===========================================================================
// Timers and staleness
// ===========================================================================

#[test]
fn test_round_timeout_reveals_answer_and_pauses() {
    let mut engine = scripted_engine(3);
    engine.open();

    let effects = engine.on_timer(TimerKind::Round, 1);
    assert_eq!(engine.state(), EngineState::BetweenRounds);
    assert!(effects
        .iter()
        .any(|e| matches!(e, Effect::Announce(msg) if msg.contains("Pikachu"))));
    assert!(effects.iter().any(|e| matches!(
        e,
        Effect::StartTimer {
            kind: TimerKind::NextRound,
            ..
        }
    )));
}

#[test]
fn test_stale_round_timer_is_dropped() {
    let mut engine = scripted_engine(5);
    engine.open();
    engine.handle_guess(&uid("Ann"), "Ann", "pikachu");
    next_round(&mut engine);
    assert_eq!(engine.round(), 2);

    // A timer scheduled for round 1 firing during round 2 must not end
    // the round.
    let effects = engine.on_timer(TimerKind::Round, 1);
    assert!(effects.is_empty());
    assert_eq!(engine.state(), EngineState::RoundActive);
}

#[test]
fn test_events_after_end_are_ignored() {
    let mut engine = scripted_engine(1);
    engine.open();
    let effects = engine.handle_guess(&uid("Ann"), "Ann", "pikachu");
    assert!(contains_ended(&effects));

    assert!(engine.on_timer(TimerKind::Round, 1).is_empty());
    assert!(engine.handle_guess(&uid("Bob"), "Bob", "pikachu").is_empty());
    assert!(engine.force_end("again").is_empty());
}

// ===========================================================================
// Minigames and forced ends
// ===========================================================================

#[test]
fn test_single_attempt_minigame_ends_on_timeout() {
    let format = Arc::new(GameFormat::minigame("hangman", "Hangman"));
    let mut engine = RoundEngine::new(
        ActivityId(1),
        RoomId::new("lobby"),
        format,
        Box::new(FixedAnswer),
        1,
        EngineTiming::default(),
    );
    engine.open();

    let effects = engine.on_timer(TimerKind::Round, 1);
    let report = effects
        .iter()
        .find_map(|e| match e {
            Effect::Ended(r) => Some(r.clone()),
            _ => None,
        })
        .expect("a single-attempt round that times out ends the game");
    assert_eq!(report.winner, None);
}

#[test]
fn test_force_end_reports_no_winner() {
    let mut engine = scripted_engine(3);
    engine.open();
    engine.handle_guess(&uid("Ann"), "Ann", "pikachu");

    let effects = engine.force_end("staff request");
    let report = effects
        .iter()
        .find_map(|e| match e {
            Effect::Ended(r) => Some(r.clone()),
            _ => None,
        })
        .expect("forced end emits a report");
    assert_eq!(report.winner, None);
    assert!(report.forced);
    assert_eq!(report.ledger.get(&uid("Ann")), Some(&1), "ledger survives");
}

// ===========================================================================
// Activity dispatch
// ===========================================================================

#[test]
fn test_activity_enum_routes_to_engine() {
    let mut activity = Activity::Scripted(scripted_engine(1));
    activity.open();
    let effects = activity.handle_guess(&uid("Ann"), "Ann", "pikachu");
    assert!(contains_ended(&effects));
    assert!(activity.ended());
}
