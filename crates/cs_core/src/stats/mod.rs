//! Live box-score counters.
//!
//! `StatLine` is the fixed-schema record of per-game counters. All
//! arithmetic clamps at zero and never fails; derived metrics live in
//! [`derived`] and are recomputed on read, never stored.

pub mod derived;

use serde::{Deserialize, Serialize};

/// The closed set of counter keys tracked per game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatKey {
    TwoPointMade,
    TwoPointMissed,
    ThreePointMade,
    ThreePointMissed,
    FreeThrowMade,
    FreeThrowMissed,
    OffensiveRebound,
    DefensiveRebound,
    Assist,
    Turnover,
    Steal,
    Foul,
}

impl StatKey {
    pub const ALL: [StatKey; 12] = [
        StatKey::TwoPointMade,
        StatKey::TwoPointMissed,
        StatKey::ThreePointMade,
        StatKey::ThreePointMissed,
        StatKey::FreeThrowMade,
        StatKey::FreeThrowMissed,
        StatKey::OffensiveRebound,
        StatKey::DefensiveRebound,
        StatKey::Assist,
        StatKey::Turnover,
        StatKey::Steal,
        StatKey::Foul,
    ];

    /// Short label used in share text and logs.
    pub fn label(&self) -> &'static str {
        match self {
            StatKey::TwoPointMade => "2PM",
            StatKey::TwoPointMissed => "2P miss",
            StatKey::ThreePointMade => "3PM",
            StatKey::ThreePointMissed => "3P miss",
            StatKey::FreeThrowMade => "FTM",
            StatKey::FreeThrowMissed => "FT miss",
            StatKey::OffensiveRebound => "OREB",
            StatKey::DefensiveRebound => "DREB",
            StatKey::Assist => "AST",
            StatKey::Turnover => "TO",
            StatKey::Steal => "STL",
            StatKey::Foul => "PF",
        }
    }
}

/// One game's counter record.
///
/// Fields serialize camelCase to match the persisted draft and record
/// shapes. Every field is ≥ 0 at all times; [`StatLine::apply`] clamps
/// instead of underflowing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatLine {
    pub two_point_made: u32,
    pub two_point_missed: u32,
    pub three_point_made: u32,
    pub three_point_missed: u32,
    pub free_throw_made: u32,
    pub free_throw_missed: u32,
    pub offensive_rebound: u32,
    pub defensive_rebound: u32,
    pub assist: u32,
    pub turnover: u32,
    pub steal: u32,
    pub foul: u32,
}

impl StatLine {
    pub fn get(&self, key: StatKey) -> u32 {
        match key {
            StatKey::TwoPointMade => self.two_point_made,
            StatKey::TwoPointMissed => self.two_point_missed,
            StatKey::ThreePointMade => self.three_point_made,
            StatKey::ThreePointMissed => self.three_point_missed,
            StatKey::FreeThrowMade => self.free_throw_made,
            StatKey::FreeThrowMissed => self.free_throw_missed,
            StatKey::OffensiveRebound => self.offensive_rebound,
            StatKey::DefensiveRebound => self.defensive_rebound,
            StatKey::Assist => self.assist,
            StatKey::Turnover => self.turnover,
            StatKey::Steal => self.steal,
            StatKey::Foul => self.foul,
        }
    }

    fn slot(&mut self, key: StatKey) -> &mut u32 {
        match key {
            StatKey::TwoPointMade => &mut self.two_point_made,
            StatKey::TwoPointMissed => &mut self.two_point_missed,
            StatKey::ThreePointMade => &mut self.three_point_made,
            StatKey::ThreePointMissed => &mut self.three_point_missed,
            StatKey::FreeThrowMade => &mut self.free_throw_made,
            StatKey::FreeThrowMissed => &mut self.free_throw_missed,
            StatKey::OffensiveRebound => &mut self.offensive_rebound,
            StatKey::DefensiveRebound => &mut self.defensive_rebound,
            StatKey::Assist => &mut self.assist,
            StatKey::Turnover => &mut self.turnover,
            StatKey::Steal => &mut self.steal,
            StatKey::Foul => &mut self.foul,
        }
    }

    /// Clamped counter update: the result field is `max(0, old + delta)`,
    /// all other fields unchanged. Pure and total.
    pub fn apply(mut self, key: StatKey, delta: i32) -> StatLine {
        let slot = self.slot(key);
        *slot = if delta >= 0 {
            slot.saturating_add(delta as u32)
        } else {
            slot.saturating_sub(delta.unsigned_abs())
        };
        self
    }

    /// Field-wise exact-integer sum.
    pub fn add(&self, other: &StatLine) -> StatLine {
        let mut out = *self;
        for key in StatKey::ALL {
            let sum = self.get(key).saturating_add(other.get(key));
            *out.slot(key) = sum;
        }
        out
    }

    pub fn is_zero(&self) -> bool {
        StatKey::ALL.iter().all(|key| self.get(*key) == 0)
    }
}
