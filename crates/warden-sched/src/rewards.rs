//! Points-to-bits conversion at activity end.
//!
//! In-activity scores are ephemeral; bits are the persistent reward
//! currency. Conversion happens exactly once, from the final ledger of an
//! ended activity. On a no-winner outcome (tie, timeout) no winner bonus
//! is paid, but per-point participation bits still convert.

use std::collections::HashMap;

use warden_core::{GameFormat, UserId};

/// One participant's payout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardPayout {
    pub user: UserId,
    pub bits: u32,
}

/// Converts a final point ledger into bit payouts.
///
/// `cap` bounds any single payout (bonus included); zero means no cap.
/// Players with zero points and no bonus are omitted. Output is sorted by
/// user id so payouts are stable for announcements and tests.
pub fn convert_rewards(
    format: &GameFormat,
    ledger: &HashMap<UserId, u32>,
    winner: Option<&UserId>,
    cap: u32,
) -> Vec<RewardPayout> {
    let mut payouts: Vec<RewardPayout> = ledger
        .iter()
        .filter_map(|(user, points)| {
            let mut bits = points.saturating_mul(format.bits_per_point);
            if winner == Some(user) {
                bits = bits.saturating_add(format.winner_bonus_bits);
            }
            if cap > 0 {
                bits = bits.min(cap);
            }
            (bits > 0).then(|| RewardPayout {
                user: user.clone(),
                bits,
            })
        })
        .collect();
    payouts.sort_by(|a, b| a.user.as_str().cmp(b.user.as_str()));
    payouts
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::GameFormat;

    fn ledger(entries: &[(&str, u32)]) -> HashMap<UserId, u32> {
        entries
            .iter()
            .map(|(name, pts)| (UserId::from_name(name), *pts))
            .collect()
    }

    #[test]
    fn test_winner_gets_bonus() {
        let format = GameFormat::scripted("trivia", "Trivia");
        let winner = UserId::from_name("Ann");
        let payouts = convert_rewards(&format, &ledger(&[("Ann", 3), ("Bob", 1)]), Some(&winner), 0);

        assert_eq!(
            payouts,
            vec![
                RewardPayout { user: UserId::from_name("Ann"), bits: 3 * 10 + 50 },
                RewardPayout { user: UserId::from_name("Bob"), bits: 10 },
            ]
        );
    }

    #[test]
    fn test_tie_pays_participation_but_no_bonus() {
        let format = GameFormat::scripted("trivia", "Trivia");
        let payouts = convert_rewards(&format, &ledger(&[("Left", 5), ("Right", 5)]), None, 0);

        assert_eq!(payouts.len(), 2);
        assert!(payouts.iter().all(|p| p.bits == 50));
    }

    #[test]
    fn test_cap_bounds_single_payout() {
        let format = GameFormat::scripted("trivia", "Trivia");
        let winner = UserId::from_name("Ann");
        let payouts = convert_rewards(&format, &ledger(&[("Ann", 100)]), Some(&winner), 300);
        assert_eq!(payouts[0].bits, 300);
    }

    #[test]
    fn test_zero_point_players_are_omitted() {
        let format = GameFormat::scripted("trivia", "Trivia");
        let payouts = convert_rewards(&format, &ledger(&[("Ann", 2), ("Idle", 0)]), None, 0);
        assert_eq!(payouts.len(), 1);
        assert_eq!(payouts[0].user, UserId::from_name("Ann"));
    }
}
