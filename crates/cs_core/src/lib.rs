//! # cs_core - Courtside Stat-Entry Engine
//!
//! Tap-counter box scores with reversible history, an append-only game
//! log aggregated into per-player season statistics, and a local
//! entitlement ledger that gates how many games may be finalized before
//! payment.
//!
//! ## Features
//! - Clamped, never-negative counter arithmetic
//! - Exact-inverse undo over a bounded edit history
//! - Per-player season aggregation within team scopes
//! - Credit/trial/season-pass paywall with idempotent purchase redemption
//! - Write-through persistence over a pluggable key-value store

pub mod entitlement;
pub mod error;
pub mod gateway;
pub mod history;
pub mod hooks;
pub mod record;
pub mod session;
pub mod stats;
pub mod store;

// Re-export the main API surface
pub use entitlement::redemption::{RedeemOutcome, RedemptionLog};
pub use entitlement::{EntitlementState, Plan, TRIAL_LIMIT};
pub use error::{CoreError, Result};
pub use gateway::{GatewayError, PaymentGateway, VerifiedPurchase};
pub use history::{HistoryEntry, HistoryLog};
pub use hooks::{DeviceHooks, NoopHooks, ShareOutcome};
pub use record::log::{aggregate, GameLog, SeasonSummary};
pub use record::{GameRecord, ScopeList, TeamScope, DEFAULT_SCOPE_ID};
pub use session::{FinalizeInput, FinalizeOutcome, ResumeOutcome, Session};
pub use stats::derived::BoxScore;
pub use stats::{StatKey, StatLine};
pub use store::{file::FileStore, KvStore, MemoryStore};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
