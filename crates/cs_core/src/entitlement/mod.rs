//! Entitlement ledger: the paywall gate.
//!
//! One plan is active at a time. `credits_remaining` is meaningful only
//! under [`Plan::Credits`]; `unlimited_until` only under
//! [`Plan::Unlimited`]. The ledger is mutated by exactly two flows:
//! consuming one allowance per successful finalize, and purchase
//! redemption (see [`redemption`]).

pub mod migration;
pub mod redemption;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Finalizes allowed before the free trial is exhausted.
pub const TRIAL_LIMIT: u32 = 2;

/// Persisted entitlement shape version (see [`migration`]).
pub const ENTITLEMENT_VERSION: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    Free,
    Credits,
    Unlimited,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementState {
    pub version: u32,
    pub plan: Plan,
    pub credits_remaining: u32,
    pub free_used: u32,
    /// Absent on a pass with no recorded expiry (legacy lifetime pass):
    /// treated as still active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlimited_until: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl EntitlementState {
    /// First-run state: free plan, nothing consumed.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            version: ENTITLEMENT_VERSION,
            plan: Plan::Free,
            credits_remaining: 0,
            free_used: 0,
            unlimited_until: None,
            updated_at: now,
        }
    }

    /// The gate decision: may one more game be finalized right now?
    pub fn may_finalize(&self, now: DateTime<Utc>) -> bool {
        match self.plan {
            Plan::Unlimited => self.unlimited_until.map_or(true, |until| now < until),
            Plan::Credits => self.credits_remaining > 0,
            Plan::Free => self.free_used < TRIAL_LIMIT,
        }
    }

    /// Consume one finalize allowance. Exactly one allowance class is
    /// charged. Call at most once per successful finalize, immediately
    /// after [`Self::may_finalize`] returned true for the same attempt.
    pub fn consume_finalize(&mut self, now: DateTime<Utc>) {
        match self.plan {
            Plan::Unlimited => {}
            Plan::Credits => {
                self.credits_remaining = self.credits_remaining.saturating_sub(1);
            }
            Plan::Free => {
                self.free_used += 1;
            }
        }
        self.updated_at = now;
    }
}
