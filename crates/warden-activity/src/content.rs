//! The `GameContent` trait — the contract content modules implement.
//!
//! The scheduler consumes a deliberately narrow surface from the several
//! hundred game-content modules: compute a round, evaluate a guess, and a
//! few optional hooks. Optional behavior is declared up front in
//! [`Capabilities`] so a format wired into a mode it cannot support fails
//! at activity creation with a named configuration error instead of at
//! runtime.

use warden_core::{UserId, guess_matches};

/// One round's material: the hint shown to the room and the answers that
/// count as correct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundData {
    pub hint: String,
    pub answers: Vec<String>,
}

/// Which optional parts of the contract a content module implements.
///
/// Checked at activity creation, not discovered by calling and hoping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// The module can produce a guess on behalf of a defending bot
    /// (required for bot-challenge formats).
    pub bot_play: bool,
    /// The module awards answer-specific point values via
    /// [`GameContent::points_for`].
    pub variable_points: bool,
}

/// The capability set a content module supplies to the round engine.
///
/// `compute_round` and the default `evaluate_guess` are the whole required
/// surface; everything else is optional with a no-op default.
pub trait GameContent: Send {
    /// Declares which optional hooks this module implements.
    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }

    /// Produces the next round's hint and answer set. `round` counts from 1.
    fn compute_round(&mut self, round: u64) -> RoundData;

    /// Tests a raw guess against the round's answers, returning the stored
    /// form of the matched answer. The default applies id folding and the
    /// forme-prefix rule; modules with custom matching override this.
    fn evaluate_guess(&self, round: &RoundData, guess: &str) -> Option<String> {
        round
            .answers
            .iter()
            .find(|answer| guess_matches(guess, answer))
            .cloned()
    }

    /// Point award for a matched answer. Only consulted when
    /// [`Capabilities::variable_points`] is declared; the engine awards 1
    /// otherwise.
    fn points_for(&self, _answer: &str) -> u32 {
        1
    }

    /// A guess the defending bot would make for this round. Only consulted
    /// when [`Capabilities::bot_play`] is declared.
    fn bot_guess(&self, _round: &RoundData) -> Option<String> {
        None
    }

    /// Called after a correct guess is awarded.
    fn on_correct_guess(&mut self, _user: &UserId, _answer: &str) {}

    /// Called for each incorrect guess.
    fn on_incorrect_guess(&mut self, _user: &UserId, _guess: &str) {}
}
