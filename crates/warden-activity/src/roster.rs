//! Player roster, point ledger, and teams for one activity.
//!
//! A [`Roster`] is owned by exactly one activity and dies with it; players
//! are never shared across instances. Ledger values are unsigned, so
//! points can never go negative even in formats that allow removal.

use std::collections::HashMap;

use warden_core::UserId;

use crate::ActivityError;

/// One participant in an activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: UserId,
    /// Display name as first seen, for announcements.
    pub name: String,
    pub eliminated: bool,
    /// Index into the roster's team list, when split.
    pub team: Option<usize>,
}

/// A team created by an explicit split operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub name: String,
    /// Members in join order.
    pub members: Vec<UserId>,
}

/// Roster plus ledger for one activity.
#[derive(Debug, Default)]
pub struct Roster {
    players: HashMap<UserId, Player>,
    ledger: HashMap<UserId, u32>,
    teams: Vec<Team>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a player explicitly (signup or host action).
    ///
    /// `max` of zero means unlimited.
    pub fn join(&mut self, user: UserId, name: &str, max: usize) -> Result<(), ActivityError> {
        if self.players.contains_key(&user) {
            return Err(ActivityError::AlreadyJoined(user));
        }
        if max != 0 && self.players.len() >= max {
            return Err(ActivityError::RosterFull { max });
        }
        self.players.insert(
            user.clone(),
            Player {
                id: user,
                name: name.to_string(),
                eliminated: false,
                team: None,
            },
        );
        Ok(())
    }

    /// Ensures a player exists, creating them lazily. Free-join games call
    /// this on a user's first guess.
    pub fn touch(&mut self, user: &UserId, name: &str) {
        if !self.players.contains_key(user) {
            self.players.insert(
                user.clone(),
                Player {
                    id: user.clone(),
                    name: name.to_string(),
                    eliminated: false,
                    team: None,
                },
            );
        }
    }

    /// Removes a player and their ledger entry. Returns `true` if they
    /// were present.
    pub fn leave(&mut self, user: &UserId) -> bool {
        self.ledger.remove(user);
        for team in &mut self.teams {
            team.members.retain(|m| m != user);
        }
        self.players.remove(user).is_some()
    }

    pub fn contains(&self, user: &UserId) -> bool {
        self.players.contains_key(user)
    }

    pub fn player(&self, user: &UserId) -> Option<&Player> {
        self.players.get(user)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Whether the player may act this round.
    pub fn can_act(&self, user: &UserId) -> bool {
        self.players.get(user).is_some_and(|p| !p.eliminated)
    }

    pub fn eliminate(&mut self, user: &UserId) -> Result<(), ActivityError> {
        let player = self
            .players
            .get_mut(user)
            .ok_or_else(|| ActivityError::NotAParticipant(user.clone()))?;
        player.eliminated = true;
        Ok(())
    }

    // -- Ledger -------------------------------------------------------------

    /// Awards points and returns the player's new total.
    pub fn award(&mut self, user: &UserId, points: u32) -> u32 {
        let total = self.ledger.entry(user.clone()).or_insert(0);
        *total = total.saturating_add(points);
        *total
    }

    /// Removes points (saturating at zero) and returns the new total.
    /// Callers enforce the format's `allow_point_removal` flag.
    pub fn deduct(&mut self, user: &UserId, points: u32) -> u32 {
        let total = self.ledger.entry(user.clone()).or_insert(0);
        *total = total.saturating_sub(points);
        *total
    }

    pub fn points(&self, user: &UserId) -> u32 {
        self.ledger.get(user).copied().unwrap_or(0)
    }

    pub fn ledger(&self) -> &HashMap<UserId, u32> {
        &self.ledger
    }

    pub fn ledger_clone(&self) -> HashMap<UserId, u32> {
        self.ledger.clone()
    }

    // -- Teams --------------------------------------------------------------

    /// Splits the current players into `count` teams, round-robin in
    /// sorted id order so the split is deterministic.
    pub fn split_teams(&mut self, count: usize, names: &[&str]) -> Result<(), ActivityError> {
        if count < 2 || count > self.players.len() {
            return Err(ActivityError::WrongPhase(format!(
                "cannot split {} players into {} teams",
                self.players.len(),
                count
            )));
        }
        self.teams = (0..count)
            .map(|i| Team {
                name: names
                    .get(i)
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| format!("Team {}", i + 1)),
                members: Vec::new(),
            })
            .collect();

        let mut ids: Vec<UserId> = self.players.keys().cloned().collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        for (i, user) in ids.into_iter().enumerate() {
            let team = i % count;
            self.teams[team].members.push(user.clone());
            if let Some(player) = self.players.get_mut(&user) {
                player.team = Some(team);
            }
        }
        Ok(())
    }

    /// Dissolves all teams.
    pub fn unsplit(&mut self) {
        self.teams.clear();
        for player in self.players.values_mut() {
            player.team = None;
        }
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    /// A team's aggregate point total (sum of its members' ledgers).
    pub fn team_points(&self, team: usize) -> u32 {
        self.teams
            .get(team)
            .map(|t| t.members.iter().map(|m| self.points(m)).sum())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(name: &str) -> UserId {
        UserId::from_name(name)
    }

    #[test]
    fn test_join_enforces_limit_and_uniqueness() {
        let mut roster = Roster::new();
        roster.join(uid("Ann"), "Ann", 2).unwrap();
        roster.join(uid("Bob"), "Bob", 2).unwrap();

        assert_eq!(
            roster.join(uid("Ann"), "Ann", 2),
            Err(ActivityError::AlreadyJoined(uid("Ann")))
        );
        assert_eq!(
            roster.join(uid("Cid"), "Cid", 2),
            Err(ActivityError::RosterFull { max: 2 })
        );
    }

    #[test]
    fn test_touch_is_idempotent_and_keeps_first_name() {
        let mut roster = Roster::new();
        roster.touch(&uid("Ann"), "Ann");
        roster.touch(&uid("Ann"), "ANN!!");
        assert_eq!(roster.len(), 1);
        assert_eq!(roster.player(&uid("Ann")).unwrap().name, "Ann");
    }

    #[test]
    fn test_award_and_deduct_saturate() {
        let mut roster = Roster::new();
        roster.touch(&uid("Ann"), "Ann");
        assert_eq!(roster.award(&uid("Ann"), 3), 3);
        assert_eq!(roster.deduct(&uid("Ann"), 5), 0, "ledger never goes negative");
    }

    #[test]
    fn test_eliminated_players_cannot_act() {
        let mut roster = Roster::new();
        roster.touch(&uid("Ann"), "Ann");
        assert!(roster.can_act(&uid("Ann")));
        roster.eliminate(&uid("Ann")).unwrap();
        assert!(!roster.can_act(&uid("Ann")));
        assert!(roster.contains(&uid("Ann")));
    }

    #[test]
    fn test_split_and_unsplit_teams() {
        let mut roster = Roster::new();
        for name in ["Ann", "Bob", "Cid", "Dee"] {
            roster.touch(&uid(name), name);
        }
        roster.split_teams(2, &["Red", "Blue"]).unwrap();
        assert_eq!(roster.teams().len(), 2);
        assert_eq!(roster.teams()[0].members.len(), 2);

        roster.award(&uid("Ann"), 2);
        roster.award(&uid("Bob"), 1);
        assert_eq!(roster.team_points(0) + roster.team_points(1), 3);

        roster.unsplit();
        assert!(roster.teams().is_empty());
        assert!(roster.player(&uid("Ann")).unwrap().team.is_none());
    }

    #[test]
    fn test_split_rejects_too_many_teams() {
        let mut roster = Roster::new();
        roster.touch(&uid("Ann"), "Ann");
        assert!(roster.split_teams(2, &[]).is_err());
    }

    #[test]
    fn test_leave_clears_ledger_and_team_membership() {
        let mut roster = Roster::new();
        roster.touch(&uid("Ann"), "Ann");
        roster.touch(&uid("Bob"), "Bob");
        roster.split_teams(2, &[]).unwrap();
        roster.award(&uid("Ann"), 4);

        assert!(roster.leave(&uid("Ann")));
        assert_eq!(roster.points(&uid("Ann")), 0);
        assert!(roster.teams().iter().all(|t| !t.members.contains(&uid("Ann"))));
    }
}
