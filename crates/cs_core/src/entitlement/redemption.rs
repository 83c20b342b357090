//! Idempotent application of external purchase results.
//!
//! The gateway hands back a plan token and a transaction id; the ledger
//! applies each transaction id exactly once, so refresh-triggered
//! re-entry of the resumption point is harmless.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::{EntitlementState, Plan};
use crate::error::CoreError;

/// Days of unlimited access granted by the season pass.
pub const SEASON_PASS_DAYS: i64 = 365;

/// What a recognized plan token grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanGrant {
    Credits(u32),
    UnlimitedDays(i64),
}

/// One purchasable product, keyed by the token the gateway uses.
#[derive(Debug, Clone, Copy)]
pub struct PlanSpec {
    pub token: &'static str,
    pub grant: PlanGrant,
}

/// The closed catalog of recognized plan tokens.
pub static PLAN_CATALOG: Lazy<Vec<PlanSpec>> = Lazy::new(|| {
    vec![
        PlanSpec { token: "credit_single", grant: PlanGrant::Credits(1) },
        PlanSpec { token: "credit_pack_5", grant: PlanGrant::Credits(5) },
        PlanSpec { token: "credit_pack_10", grant: PlanGrant::Credits(10) },
        PlanSpec { token: "season_pass", grant: PlanGrant::UnlimitedDays(SEASON_PASS_DAYS) },
    ]
});

pub fn lookup_plan(token: &str) -> Option<PlanGrant> {
    PLAN_CATALOG.iter().find(|spec| spec.token == token).map(|spec| spec.grant)
}

/// Transaction ids already applied to the ledger. Grows monotonically;
/// never shrinks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RedemptionLog {
    applied: BTreeSet<String>,
}

impl RedemptionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, transaction_id: &str) -> bool {
        self.applied.contains(transaction_id)
    }

    pub fn len(&self) -> usize {
        self.applied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeemOutcome {
    Applied,
    AlreadyApplied,
}

/// Apply a verified purchase to the ledger, exactly once per transaction
/// id. An unrecognized token mutates nothing and is surfaced as an
/// error, never swallowed.
pub fn redeem(
    log: &mut RedemptionLog,
    state: &mut EntitlementState,
    transaction_id: &str,
    plan_token: &str,
    now: DateTime<Utc>,
) -> Result<RedeemOutcome, CoreError> {
    if log.applied.contains(transaction_id) {
        log::debug!("Transaction {} already redeemed, skipping", transaction_id);
        return Ok(RedeemOutcome::AlreadyApplied);
    }

    let grant = lookup_plan(plan_token)
        .ok_or_else(|| CoreError::UnrecognizedPlan { token: plan_token.to_string() })?;

    match grant {
        PlanGrant::Credits(count) => {
            state.plan = Plan::Credits;
            state.credits_remaining = state.credits_remaining.saturating_add(count);
            state.unlimited_until = None;
        }
        PlanGrant::UnlimitedDays(days) => {
            // A still-active pass extends from its current expiry
            let base = match (state.plan, state.unlimited_until) {
                (Plan::Unlimited, Some(until)) if until > now => until,
                _ => now,
            };
            state.plan = Plan::Unlimited;
            state.unlimited_until = Some(base + Duration::days(days));
        }
    }

    log.applied.insert(transaction_id.to_string());
    state.updated_at = now;
    log::info!("Redeemed plan '{}' via transaction {}", plan_token, transaction_id);

    Ok(RedeemOutcome::Applied)
}
