//! Finalized game records and team scopes.

pub mod log;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::stats::StatLine;

/// Immutable snapshot of one finalized game.
///
/// Created only through the finalize flow; deleted individually; never
/// mutated afterwards. Player identity is a plain string key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub game_date: NaiveDate,
    pub scope_id: String,
    pub opponent: String,
    pub player: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub stats: StatLine,
}

impl GameRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        created_at: DateTime<Utc>,
        game_date: NaiveDate,
        scope_id: String,
        opponent: String,
        player: String,
        note: Option<String>,
        stats: StatLine,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at,
            game_date,
            scope_id,
            opponent,
            player,
            note,
            stats,
        }
    }
}

/// Named partition of the game log and player roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamScope {
    pub id: String,
    pub name: String,
}

pub const DEFAULT_SCOPE_ID: &str = "scope-default";
pub const DEFAULT_SCOPE_NAME: &str = "My Team";

/// Scope collection. At least one scope exists at all times; the default
/// is materialized when the persisted list is absent or empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeList {
    scopes: Vec<TeamScope>,
}

impl ScopeList {
    pub fn with_default() -> Self {
        Self {
            scopes: vec![TeamScope {
                id: DEFAULT_SCOPE_ID.to_string(),
                name: DEFAULT_SCOPE_NAME.to_string(),
            }],
        }
    }

    /// Restore from a persisted list.
    pub fn from_scopes(scopes: Vec<TeamScope>) -> Self {
        if scopes.is_empty() {
            Self::with_default()
        } else {
            Self { scopes }
        }
    }

    /// Add a scope with a fresh identifier and return it.
    pub fn add(&mut self, name: &str) -> &TeamScope {
        let scope = TeamScope { id: Uuid::new_v4().to_string(), name: name.to_string() };
        self.scopes.push(scope);
        self.scopes.last().unwrap()
    }

    pub fn get(&self, id: &str) -> Option<&TeamScope> {
        self.scopes.iter().find(|scope| scope.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TeamScope> {
        self.scopes.iter()
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

impl Default for ScopeList {
    fn default() -> Self {
        Self::with_default()
    }
}
