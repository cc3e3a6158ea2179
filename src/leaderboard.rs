//! Global leaderboard
//!
//! Persisted as a JSON array, keeps the top 100 players by monthly score.

use serde::{Deserialize, Serialize};

/// Maximum number of entries to keep
pub const MAX_LEADERBOARD_ENTRIES: usize = 100;

/// A single leaderboard row, keyed by player name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub name: String,
    /// Best single-session kill count
    pub high_score: u64,
    pub total_gold: u64,
    /// Ranking key
    pub monthly_score: u64,
    pub games_played: u32,
    /// Player level at the last submission
    pub level: u32,
}

/// Leaderboard sorted descending by monthly score
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Merge a finished session into the board.
    ///
    /// Existing rows keep their best high score and accumulate gold, monthly
    /// score and games played; unknown names get a fresh row. Returns the
    /// 1-based rank of `name` afterwards, or `None` if it fell outside the
    /// retained top entries.
    pub fn submit(&mut self, name: &str, kills: u64, gold_earned: u64, level: u32) -> Option<usize> {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => {
                entry.high_score = entry.high_score.max(kills);
                entry.total_gold += gold_earned;
                entry.monthly_score += kills;
                entry.games_played += 1;
                entry.level = level;
            }
            None => self.entries.push(LeaderboardEntry {
                name: name.to_string(),
                high_score: kills,
                total_gold: gold_earned,
                monthly_score: kills,
                games_played: 1,
                level,
            }),
        }

        // Stable: ties keep their previous relative order
        self.entries
            .sort_by(|a, b| b.monthly_score.cmp(&a.monthly_score));
        self.entries.truncate(MAX_LEADERBOARD_ENTRIES);

        let rank = self.rank_of(name);
        log::info!(
            "Leaderboard submit for {}: {} kills, rank {:?}",
            name,
            kills,
            rank
        );
        rank
    }

    /// 1-based rank of a player, `None` if not on the board
    pub fn rank_of(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name).map(|i| i + 1)
    }

    /// Look up a player's row
    pub fn entry(&self, name: &str) -> Option<&LeaderboardEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Re-establish the ordering and size bound on a freshly loaded board
    pub fn normalize(&mut self) {
        self.entries
            .sort_by(|a, b| b.monthly_score.cmp(&a.monthly_score));
        self.entries.truncate(MAX_LEADERBOARD_ENTRIES);
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Get the top entry (if any)
    pub fn leader(&self) -> Option<&LeaderboardEntry> {
        self.entries.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_first_submit_inserts() {
        let mut board = Leaderboard::new();
        let rank = board.submit("Ana", 12, 60, 2);
        assert_eq!(rank, Some(1));
        let entry = board.entry("Ana").unwrap();
        assert_eq!(entry.high_score, 12);
        assert_eq!(entry.total_gold, 60);
        assert_eq!(entry.monthly_score, 12);
        assert_eq!(entry.games_played, 1);
        assert_eq!(entry.level, 2);
    }

    #[test]
    fn test_resubmit_keeps_best_score() {
        let mut board = Leaderboard::new();
        board.submit("Ana", 50, 250, 3);
        board.submit("Ana", 30, 150, 4);
        assert_eq!(board.len(), 1);
        let entry = board.entry("Ana").unwrap();
        assert_eq!(entry.high_score, 50);
        assert_eq!(entry.games_played, 2);
        assert_eq!(entry.monthly_score, 80);
        assert_eq!(entry.total_gold, 400);
        assert_eq!(entry.level, 4);
    }

    #[test]
    fn test_ranking_by_monthly_score() {
        let mut board = Leaderboard::new();
        board.submit("Ana", 10, 0, 1);
        assert_eq!(board.submit("Ben", 20, 0, 1), Some(1));
        assert_eq!(board.rank_of("Ana"), Some(2));
        // Ana's cumulative 10 + 15 overtakes Ben
        assert_eq!(board.submit("Ana", 15, 0, 1), Some(1));
        assert_eq!(board.leader().unwrap().name, "Ana");
    }

    #[test]
    fn test_ties_keep_prior_order() {
        let mut board = Leaderboard::new();
        board.submit("Ana", 10, 0, 1);
        board.submit("Ben", 10, 0, 1);
        board.submit("Cy", 10, 0, 1);
        let names: Vec<_> = board.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Ana", "Ben", "Cy"]);
    }

    #[test]
    fn test_bound_keeps_top_hundred() {
        let mut board = Leaderboard::new();
        for i in 0..105u64 {
            board.submit(&format!("P{}", i), i + 1, 0, 1);
        }
        assert_eq!(board.len(), MAX_LEADERBOARD_ENTRIES);
        assert!(board
            .entries
            .windows(2)
            .all(|w| w[0].monthly_score >= w[1].monthly_score));
        // The five lowest scorers were dropped
        assert!(board.entry("P4").is_none());
        assert!(board.entry("P5").is_some());
    }

    #[test]
    fn test_truncated_player_has_no_rank() {
        let mut board = Leaderboard::new();
        for i in 0..100u64 {
            board.submit(&format!("P{}", i), 100 + i, 0, 1);
        }
        assert_eq!(board.submit("Late", 1, 0, 1), None);
        assert_eq!(board.len(), MAX_LEADERBOARD_ENTRIES);
        assert!(board.entry("Late").is_none());
    }

    #[test]
    fn test_serializes_as_array() {
        let mut board = Leaderboard::new();
        board.submit("Ana", 3, 15, 1);
        let json = serde_json::to_string(&board).unwrap();
        assert!(json.starts_with('['));
        assert!(json.contains("\"monthlyScore\":3"));
        let loaded: Leaderboard = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, board);
    }

    proptest! {
        #[test]
        fn prop_board_bounded_and_sorted(
            submissions in prop::collection::vec((0u8..150, 0u64..500), 1..300)
        ) {
            let mut board = Leaderboard::new();
            for (name, kills) in submissions {
                board.submit(&format!("P{}", name), kills, kills * 5, 1);
            }
            prop_assert!(board.len() <= MAX_LEADERBOARD_ENTRIES);
            prop_assert!(board
                .entries
                .windows(2)
                .all(|w| w[0].monthly_score >= w[1].monthly_score));
        }
    }
}
