use std::fmt;

use crate::session::Mode;

/// Number of player slots on the leaderboard.
pub const PLAYER_SLOTS: usize = 5;

/// A 1-based player slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlayerSlot(u8);

impl PlayerSlot {
    pub fn new(number: u8) -> Option<Self> {
        (1..=PLAYER_SLOTS as u8).contains(&number).then_some(Self(number))
    }

    pub fn number(self) -> u8 {
        self.0
    }

    fn index(self) -> usize {
        self.0 as usize - 1
    }

    pub fn all() -> impl Iterator<Item = PlayerSlot> {
        (1..=PLAYER_SLOTS as u8).map(PlayerSlot)
    }
}

impl Default for PlayerSlot {
    fn default() -> Self {
        Self(1)
    }
}

impl fmt::Display for PlayerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player {}", self.0)
    }
}

/// Best score per player and mode. Lower is better; lives only as long as the process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreLedger {
    best: [[Option<u32>; 3]; PLAYER_SLOTS],
}

impl ScoreLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `score` if it beats the stored best. Returns whether it did.
    pub fn record(&mut self, player: PlayerSlot, mode: Mode, score: u32) -> bool {
        let slot = &mut self.best[player.index()][mode.index()];
        match *slot {
            Some(best) if best <= score => false,
            _ => {
                *slot = Some(score);
                true
            }
        }
    }

    pub fn best(&self, player: PlayerSlot, mode: Mode) -> Option<u32> {
        self.best[player.index()][mode.index()]
    }

    /// Best score in `mode` across all players.
    pub fn leader(&self, mode: Mode) -> Option<u32> {
        PlayerSlot::all().filter_map(|p| self.best(p, mode)).min()
    }

    /// Whether `player` holds the best score in `mode` (ties all lead).
    pub fn is_leader(&self, player: PlayerSlot, mode: Mode) -> bool {
        match (self.best(player, mode), self.leader(mode)) {
            (Some(mine), Some(top)) => mine == top,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(n: u8) -> PlayerSlot {
        PlayerSlot::new(n).unwrap()
    }

    #[test]
    fn slots_are_one_based() {
        assert!(PlayerSlot::new(0).is_none());
        assert!(PlayerSlot::new(6).is_none());
        assert_eq!(PlayerSlot::all().count(), PLAYER_SLOTS);
        assert_eq!(player(3).to_string(), "Player 3");
    }

    #[test]
    fn keeps_only_improvements() {
        let mut ledger = ScoreLedger::new();
        assert!(ledger.record(player(2), Mode::Classic, 17));
        assert_eq!(ledger.best(player(2), Mode::Classic), Some(17));
        assert!(!ledger.record(player(2), Mode::Classic, 25));
        assert_eq!(ledger.best(player(2), Mode::Classic), Some(17));
        assert!(ledger.record(player(2), Mode::Classic, 10));
        assert_eq!(ledger.best(player(2), Mode::Classic), Some(10));
    }

    #[test]
    fn equal_score_is_not_an_improvement() {
        let mut ledger = ScoreLedger::new();
        ledger.record(player(1), Mode::Crazy, 40);
        assert!(!ledger.record(player(1), Mode::Crazy, 40));
    }

    #[test]
    fn modes_and_players_are_independent() {
        let mut ledger = ScoreLedger::new();
        ledger.record(player(1), Mode::RaceAgainstTime, 5);
        assert_eq!(ledger.best(player(1), Mode::Classic), None);
        assert_eq!(ledger.best(player(2), Mode::RaceAgainstTime), None);
    }

    #[test]
    fn ties_share_the_lead() {
        let mut ledger = ScoreLedger::new();
        ledger.record(player(1), Mode::Classic, 30);
        ledger.record(player(4), Mode::Classic, 30);
        ledger.record(player(5), Mode::Classic, 31);
        assert_eq!(ledger.leader(Mode::Classic), Some(30));
        assert!(ledger.is_leader(player(1), Mode::Classic));
        assert!(ledger.is_leader(player(4), Mode::Classic));
        assert!(!ledger.is_leader(player(5), Mode::Classic));
        assert!(!ledger.is_leader(player(2), Mode::Classic));
    }

    #[test]
    fn empty_mode_has_no_leader() {
        assert_eq!(ScoreLedger::new().leader(Mode::Crazy), None);
    }
}
