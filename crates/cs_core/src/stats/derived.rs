//! Derived box-score metrics.
//!
//! Pure functions of [`StatLine`]; never stored, always recomputed on
//! read. A zero denominator yields `0.0`, never an error.

use serde::Serialize;

use super::StatLine;

pub fn points(line: &StatLine) -> u32 {
    2 * line.two_point_made + 3 * line.three_point_made + line.free_throw_made
}

pub fn field_goals_made(line: &StatLine) -> u32 {
    line.two_point_made + line.three_point_made
}

pub fn field_goals_attempted(line: &StatLine) -> u32 {
    line.two_point_made + line.two_point_missed + line.three_point_made + line.three_point_missed
}

pub fn field_goal_pct(line: &StatLine) -> f32 {
    pct(field_goals_made(line), field_goals_attempted(line))
}

pub fn three_point_pct(line: &StatLine) -> f32 {
    pct(line.three_point_made, line.three_point_made + line.three_point_missed)
}

pub fn free_throw_pct(line: &StatLine) -> f32 {
    pct(line.free_throw_made, line.free_throw_made + line.free_throw_missed)
}

pub fn rebounds(line: &StatLine) -> u32 {
    line.offensive_rebound + line.defensive_rebound
}

/// Made/attempted as a percentage; 0.0 when nothing was attempted.
pub fn pct(made: u32, attempted: u32) -> f32 {
    if attempted == 0 {
        0.0
    } else {
        made as f32 / attempted as f32 * 100.0
    }
}

/// Per-game average; 0.0 when no games were played.
pub fn per_game(total: u32, games: u32) -> f32 {
    if games == 0 {
        0.0
    } else {
        total as f32 / games as f32
    }
}

/// Display-ready summary of a stat line for UI panels.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxScore {
    pub points: u32,
    pub field_goals_made: u32,
    pub field_goals_attempted: u32,
    pub field_goal_pct: f32,
    pub three_point_pct: f32,
    pub free_throw_pct: f32,
    pub rebounds: u32,
    pub assists: u32,
    pub turnovers: u32,
    pub steals: u32,
    pub fouls: u32,
}

impl BoxScore {
    pub fn from_line(line: &StatLine) -> Self {
        Self {
            points: points(line),
            field_goals_made: field_goals_made(line),
            field_goals_attempted: field_goals_attempted(line),
            field_goal_pct: field_goal_pct(line),
            three_point_pct: three_point_pct(line),
            free_throw_pct: free_throw_pct(line),
            rebounds: rebounds(line),
            assists: line.assist,
            turnovers: line.turnover,
            steals: line.steal,
            fouls: line.foul,
        }
    }
}

/// One-line share-sheet text for a player's current line.
pub fn share_text(player: &str, line: &StatLine) -> String {
    format!(
        "{}: {} PTS, {}/{} FG ({:.1}%), {} REB, {} AST, {} STL",
        player,
        points(line),
        field_goals_made(line),
        field_goals_attempted(line),
        field_goal_pct(line),
        rebounds(line),
        line.assist,
        line.steal,
    )
}
