//! Append/delete store over finalized game records, with the season
//! aggregation queries the roster screens are built on.

use serde::{Deserialize, Serialize};

use super::GameRecord;
use crate::stats::{derived, StatLine};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameLog {
    records: Vec<GameRecord>,
}

impl GameLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore from persisted records, re-establishing newest-first
    /// order. Only the queryable ordering is a contract; the stored order
    /// is normalized here rather than trusted.
    pub fn from_records(mut records: Vec<GameRecord>) -> Self {
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Self { records }
    }

    /// Insert at the head; display order is most-recent-first.
    pub fn append(&mut self, record: GameRecord) {
        self.records.insert(0, record);
    }

    /// Idempotent delete. `false` when nothing matched.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.records.len();
        self.records.retain(|record| record.id != id);
        self.records.len() != before
    }

    pub fn get(&self, id: &str) -> Option<&GameRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Games for one player within one scope, newest first. Exact string
    /// equality on both fields; re-evaluated fresh on every call.
    pub fn by_player_and_scope(&self, player: &str, scope_id: &str) -> Vec<&GameRecord> {
        let mut matches: Vec<&GameRecord> = self
            .records
            .iter()
            .filter(|record| record.player == player && record.scope_id == scope_id)
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matches
    }

    /// Distinct player names within a scope, for the roster list.
    pub fn players_in_scope(&self, scope_id: &str) -> Vec<String> {
        let mut players: Vec<String> = self
            .records
            .iter()
            .filter(|record| record.scope_id == scope_id)
            .map(|record| record.player.clone())
            .collect();
        players.sort();
        players.dedup();
        players
    }

    /// Season totals for one player within one scope.
    pub fn season(&self, player: &str, scope_id: &str) -> SeasonSummary {
        let games = self.by_player_and_scope(player, scope_id);
        SeasonSummary {
            games: games.len() as u32,
            totals: aggregate(games.iter().copied()),
        }
    }
}

/// Field-wise sum over any record sequence. Commutative and associative;
/// all stored fields are integers, so accumulation is exact.
pub fn aggregate<'a, I>(records: I) -> StatLine
where
    I: IntoIterator<Item = &'a GameRecord>,
{
    records.into_iter().fold(StatLine::default(), |acc, record| acc.add(&record.stats))
}

/// Season totals with derived averages for one player within one scope.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonSummary {
    pub games: u32,
    pub totals: StatLine,
}

impl SeasonSummary {
    pub fn points(&self) -> u32 {
        derived::points(&self.totals)
    }

    pub fn points_per_game(&self) -> f32 {
        derived::per_game(self.points(), self.games)
    }

    pub fn rebounds_per_game(&self) -> f32 {
        derived::per_game(derived::rebounds(&self.totals), self.games)
    }

    pub fn field_goal_pct(&self) -> f32 {
        derived::field_goal_pct(&self.totals)
    }
}
