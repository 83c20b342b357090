//! Load-time migration of persisted entitlement shapes.
//!
//! Earlier releases stored the plan as ad hoc strings under shifting
//! field names. Every legacy shape is translated into the current tagged
//! form here, before anything downstream sees it; malformed payloads
//! degrade to the free default instead of crashing the load.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use super::{EntitlementState, Plan, ENTITLEMENT_VERSION};

/// Translate any persisted entitlement payload into the current shape.
pub fn migrate_entitlement(value: Value, now: DateTime<Utc>) -> EntitlementState {
    let claimed_version = value.get("version").and_then(Value::as_u64).unwrap_or(0) as u32;

    if claimed_version == ENTITLEMENT_VERSION {
        match serde_json::from_value::<EntitlementState>(value) {
            Ok(state) => return state,
            Err(err) => {
                log::warn!("Entitlement payload failed to parse, resetting to free plan: {}", err);
                return EntitlementState::new(now);
            }
        }
    }

    if claimed_version > ENTITLEMENT_VERSION {
        // Future shape; take the fields we know and restamp
        log::warn!(
            "Entitlement payload from future version {} (current: {})",
            claimed_version,
            ENTITLEMENT_VERSION
        );
    }

    match migrate_legacy(&value, now) {
        Some(state) => {
            log::info!(
                "Migrated entitlement from version {} to {}",
                claimed_version,
                ENTITLEMENT_VERSION
            );
            state
        }
        None => {
            log::warn!("Unrecognized entitlement payload, resetting to free plan");
            EntitlementState::new(now)
        }
    }
}

/// Version 1 and earlier: plan stored as a bare string, counters under
/// shifting field names, expiry as unix milliseconds.
fn migrate_legacy(value: &Value, now: DateTime<Utc>) -> Option<EntitlementState> {
    let obj = value.as_object()?;

    let plan_str = obj.get("plan").and_then(Value::as_str).unwrap_or("free");
    let plan = match plan_str {
        "free" | "trial" => Plan::Free,
        "credits" | "credit" | "metered" | "pack" => Plan::Credits,
        "unlimited" | "pro" | "season" => Plan::Unlimited,
        other => {
            log::warn!("Unknown legacy plan '{}', falling back to free", other);
            Plan::Free
        }
    };

    let credits_remaining = first_u32(obj, &["creditsRemaining", "credits", "gamesLeft"]);
    let free_used = first_u32(obj, &["freeUsed", "freeUsageCount", "freeGamesUsed"]);
    let unlimited_until = ["unlimitedUntil", "proUntil", "expiresAt"]
        .iter()
        .find_map(|name| obj.get(*name))
        .and_then(parse_timestamp);

    Some(EntitlementState {
        version: ENTITLEMENT_VERSION,
        plan,
        credits_remaining,
        free_used,
        unlimited_until,
        updated_at: now,
    })
}

fn first_u32(obj: &serde_json::Map<String, Value>, names: &[&str]) -> u32 {
    names.iter().find_map(|name| obj.get(*name).and_then(Value::as_u64)).unwrap_or(0) as u32
}

/// Legacy payloads stored expiry as unix milliseconds; newer ones as an
/// RFC 3339 string.
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    if let Some(ms) = value.as_i64() {
        return Utc.timestamp_millis_opt(ms).single();
    }
    value
        .as_str()
        .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
        .map(|parsed| parsed.with_timezone(&Utc))
}
