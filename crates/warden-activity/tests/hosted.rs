//! Hosted-game lifecycle: the time budget, warning chain, and host
//! privileges, driven under paused virtual time.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;

use warden_activity::{
    ActivityError, Effect, HostBudget, HostPhase, HostedGame, TimerKind,
};
use warden_core::{ActivityId, GameFormat, RoomId, UserId};

// ===========================================================================
// Helpers
// ===========================================================================

const MIN: Duration = Duration::from_secs(60);

fn uid(name: &str) -> UserId {
    UserId::from_name(name)
}

fn hosted_game() -> HostedGame {
    HostedGame::new(
        ActivityId(7),
        RoomId::new("lobby"),
        Arc::new(GameFormat::hosted("scavengers", "Scavenger Hunt")),
        uid("Hope"),
        "Hope",
        HostBudget::default(),
    )
}

/// Opens signups, fills the roster, and starts the game.
fn started_game() -> HostedGame {
    let mut game = hosted_game();
    game.open_signups();
    game.join(uid("Ann"), "Ann").unwrap();
    game.join(uid("Bob"), "Bob").unwrap();
    game.start(&uid("Hope")).unwrap();
    game
}

fn timer_delay(effects: &[Effect], wanted: TimerKind) -> Duration {
    effects
        .iter()
        .find_map(|e| match e {
            Effect::StartTimer { kind, delay, .. } if *kind == wanted => Some(*delay),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no {wanted:?} timer in {effects:?}"))
}

fn announcement<'a>(effects: &'a [Effect], needle: &str) -> &'a str {
    effects
        .iter()
        .find_map(|e| match e {
            Effect::Announce(msg) if msg.contains(needle) => Some(msg.as_str()),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no announcement containing {needle:?} in {effects:?}"))
}

// ===========================================================================
// Warning chain
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn test_warning_chain_runs_to_forced_end() {
    let mut game = started_game();
    // Signups opened at t=0 with a 25 minute budget; the first warning is
    // armed for t=20:00.
    time::advance(20 * MIN).await;
    let effects = game.on_timer(TimerKind::FirstWarning, 0);
    announcement(&effects, "5 minutes remain");
    assert_eq!(
        timer_delay(&effects, TimerKind::FinalWarning),
        5 * MIN - Duration::from_secs(30)
    );

    time::advance(5 * MIN - Duration::from_secs(30)).await;
    let effects = game.on_timer(TimerKind::FinalWarning, 0);
    announcement(&effects, "30 seconds remain");
    assert_eq!(
        timer_delay(&effects, TimerKind::Deadline),
        Duration::from_secs(30)
    );

    time::advance(Duration::from_secs(30)).await;
    let effects = game.on_timer(TimerKind::Deadline, 0);
    let report = effects
        .iter()
        .find_map(|e| match e {
            Effect::Ended(r) => Some(r),
            _ => None,
        })
        .expect("deadline forces the end");
    assert!(report.forced);
    assert_eq!(report.winner, None);
    assert_eq!(game.phase(), HostPhase::Ended);
}

#[tokio::test(start_paused = true)]
async fn test_open_signups_arms_first_warning() {
    let mut game = hosted_game();
    let effects = game.open_signups();
    assert_eq!(timer_delay(&effects, TimerKind::FirstWarning), 20 * MIN);
    assert_eq!(game.phase(), HostPhase::Signups);
}

// ===========================================================================
// Extension
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn test_extension_moves_deadline_and_rearms_warning() {
    let mut game = started_game();
    time::advance(10 * MIN).await;

    let effects = game.extend(&uid("Hope"), 2 * MIN).unwrap();
    assert!(effects
        .iter()
        .any(|e| matches!(e, Effect::CancelTimer(TimerKind::FirstWarning))));
    // 15 minutes were left; +2 extension puts the first warning (5 minute
    // lead) 12 minutes out.
    assert_eq!(timer_delay(&effects, TimerKind::FirstWarning), 12 * MIN);
    assert_eq!(game.remaining(), Some(17 * MIN));
}

#[tokio::test(start_paused = true)]
async fn test_extension_is_one_time() {
    let mut game = started_game();
    game.extend(&uid("Hope"), MIN).unwrap();
    assert!(matches!(
        game.extend(&uid("Hope"), MIN),
        Err(ActivityError::ExtensionUnavailable(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_extension_bounds_are_enforced() {
    let mut game = started_game();
    assert!(matches!(
        game.extend(&uid("Hope"), Duration::from_secs(30)),
        Err(ActivityError::ExtensionUnavailable(_))
    ));
    assert!(matches!(
        game.extend(&uid("Hope"), 3 * MIN),
        Err(ActivityError::ExtensionUnavailable(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_extension_denied_once_first_warning_is_due() {
    let mut game = started_game();
    // 4 minutes left: inside the first-warning lead, too late to extend.
    time::advance(21 * MIN).await;
    assert!(matches!(
        game.extend(&uid("Hope"), 2 * MIN),
        Err(ActivityError::ExtensionUnavailable(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_extension_is_host_only() {
    let mut game = started_game();
    assert_eq!(
        game.extend(&uid("Ann"), 2 * MIN),
        Err(ActivityError::HostOnly)
    );
}

// ===========================================================================
// Host privileges
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn test_sub_host_shares_powers_but_cannot_delegate() {
    let mut game = started_game();
    game.set_sub_host(&uid("Hope"), uid("Ann"), "Ann").unwrap();

    // The sub-host can run the game.
    game.award_points(&uid("Ann"), &uid("Bob"), "Bob", 2).unwrap();
    assert_eq!(game.roster().points(&uid("Bob")), 2);

    // Only the original host may appoint a sub-host.
    assert_eq!(
        game.set_sub_host(&uid("Ann"), uid("Bob"), "Bob"),
        Err(ActivityError::HostOnly)
    );
}

#[tokio::test(start_paused = true)]
async fn test_point_removal_requires_format_permission() {
    let mut game = started_game();
    game.award_points(&uid("Hope"), &uid("Ann"), "Ann", 3).unwrap();
    // The default hosted format forbids removal.
    assert_eq!(
        game.deduct_points(&uid("Hope"), &uid("Ann"), 1),
        Err(ActivityError::PointRemovalNotAllowed)
    );

    let mut format = GameFormat::hosted("scavengers", "Scavenger Hunt");
    format.allow_point_removal = true;
    let mut game = HostedGame::new(
        ActivityId(8),
        RoomId::new("lobby"),
        Arc::new(format),
        uid("Hope"),
        "Hope",
        HostBudget::default(),
    );
    game.open_signups();
    game.join(uid("Ann"), "Ann").unwrap();
    game.join(uid("Bob"), "Bob").unwrap();
    game.start(&uid("Hope")).unwrap();
    game.award_points(&uid("Hope"), &uid("Ann"), "Ann", 3).unwrap();
    game.deduct_points(&uid("Hope"), &uid("Ann"), 5).unwrap();
    assert_eq!(game.roster().points(&uid("Ann")), 0);
}

#[tokio::test(start_paused = true)]
async fn test_start_requires_minimum_players() {
    let mut game = hosted_game();
    game.open_signups();
    game.join(uid("Ann"), "Ann").unwrap();
    assert!(matches!(
        game.start(&uid("Hope")),
        Err(ActivityError::WrongPhase(_))
    ));
}

// ===========================================================================
// Ending
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn test_declared_winner_lands_in_report() {
    let mut game = started_game();
    game.award_points(&uid("Hope"), &uid("Ann"), "Ann", 4).unwrap();

    let effects = game.declare_winner(&uid("Hope"), &uid("Ann")).unwrap();
    let report = effects
        .iter()
        .find_map(|e| match e {
            Effect::Ended(r) => Some(r),
            _ => None,
        })
        .expect("declaring a winner ends the game");
    assert_eq!(report.winner, Some(uid("Ann")));
    assert_eq!(report.ledger.get(&uid("Ann")), Some(&4));
    assert!(!report.forced);
}

#[tokio::test(start_paused = true)]
async fn test_stale_deadline_after_end_is_ignored() {
    let mut game = started_game();
    game.end(&uid("Hope")).unwrap();
    assert!(game.on_timer(TimerKind::Deadline, 0).is_empty());
    assert!(game.force_end("again").is_empty());
}
