//! Single-writer orchestration layer.
//!
//! `Session` owns the one mutable instance of every ledger. All
//! mutations are synchronous and run to completion before the next UI
//! event; each is followed by a write-through to the store so a reload
//! reconstructs the exact last in-memory state. The only asynchronous
//! boundary is the payment gateway round trip, handled as a resumption
//! point ([`Session::resume_checkout`]) rather than true concurrency.

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::entitlement::migration::migrate_entitlement;
use crate::entitlement::redemption::{self, RedeemOutcome, RedemptionLog};
use crate::entitlement::EntitlementState;
use crate::error::{CoreError, Result};
use crate::gateway::PaymentGateway;
use crate::history::{HistoryEntry, HistoryLog};
use crate::hooks::{DeviceHooks, ShareOutcome};
use crate::record::log::{GameLog, SeasonSummary};
use crate::record::{GameRecord, ScopeList, TeamScope};
use crate::stats::{derived, StatKey, StatLine};
use crate::store::{keys, KvStore};

/// Metadata the coach fills in before finalizing.
#[derive(Debug, Clone)]
pub struct FinalizeInput {
    pub player: String,
    pub game_date: NaiveDate,
    pub scope_id: String,
    pub opponent: String,
    pub note: Option<String>,
}

/// What a finalize attempt produced.
#[derive(Debug, Clone, PartialEq)]
pub enum FinalizeOutcome {
    /// The game was recorded and one allowance consumed.
    Recorded(GameRecord),
    /// The entitlement gate said no; nothing was mutated.
    PaywallRequired,
}

/// Haptic pulse length for counter taps, in milliseconds.
const TAP_PULSE_MS: u32 = 10;

/// What the checkout resumption point produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeOutcome {
    Redeemed,
    AlreadyRedeemed,
    /// The gateway has not seen payment yet; retry by re-entering.
    NotPaid,
}

pub struct Session<S: KvStore> {
    counts: StatLine,
    history: HistoryLog,
    games: GameLog,
    scopes: ScopeList,
    entitlement: EntitlementState,
    redemptions: RedemptionLog,
    store: S,
}

impl<S: KvStore> Session<S> {
    /// Reconstruct the last persisted state, or first-run defaults.
    /// Legacy entitlement shapes are migrated here, before any ledger
    /// logic sees them.
    pub fn load(store: S) -> Self {
        let now = Utc::now();

        let counts: StatLine = store
            .get(keys::DRAFT)
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default();

        let games = store
            .get(keys::GAMES)
            .and_then(|value| serde_json::from_value::<Vec<GameRecord>>(value).ok())
            .map(GameLog::from_records)
            .unwrap_or_default();

        let scopes = store
            .get(keys::SCOPES)
            .and_then(|value| serde_json::from_value::<Vec<TeamScope>>(value).ok())
            .map(ScopeList::from_scopes)
            .unwrap_or_default();

        let entitlement = match store.get(keys::ENTITLEMENT) {
            Some(value) => migrate_entitlement(value, now),
            None => EntitlementState::new(now),
        };

        let redemptions: RedemptionLog = store
            .get(keys::REDEMPTIONS)
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default();

        log::info!(
            "Session loaded: {} games, {} scopes, plan {:?}",
            games.len(),
            scopes.len(),
            entitlement.plan
        );

        Self { counts, history: HistoryLog::new(), games, scopes, entitlement, redemptions, store }
    }

    pub fn counts(&self) -> &StatLine {
        &self.counts
    }

    pub fn games(&self) -> &GameLog {
        &self.games
    }

    pub fn scopes(&self) -> &ScopeList {
        &self.scopes
    }

    pub fn entitlement(&self) -> &EntitlementState {
        &self.entitlement
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    // ========================
    // Live counter edits
    // ========================

    /// Apply one tap. Positive `delta` increments, negative decrements
    /// (clamped at zero). Only the effective change is recorded in
    /// history, so undo is always an exact inverse.
    pub fn apply_stat(&mut self, key: StatKey, delta: i32) {
        let before = self.counts.get(key);
        let next = self.counts.apply(key, delta);
        let after = next.get(key);

        if after > before {
            self.history.record(HistoryEntry::Increment { key, delta: after - before });
        } else if before > after {
            self.history.record(HistoryEntry::Decrement { key, delta: before - after });
        } else {
            // Fully clamped away; nothing happened, nothing to undo
            return;
        }

        self.counts = next;
        log::debug!("Applied {} {:+}", key.label(), delta);
        self.persist_draft();
    }

    /// [`Self::apply_stat`] plus the tap haptic. The UI entry point for
    /// counter buttons.
    pub fn tap(&mut self, key: StatKey, delta: i32, hooks: &dyn DeviceHooks) {
        self.apply_stat(key, delta);
        hooks.vibrate(TAP_PULSE_MS);
    }

    /// Undo the most recent edit. No-op on an empty history.
    pub fn undo(&mut self) -> bool {
        match self.history.undo(&self.counts) {
            Some(restored) => {
                self.counts = restored;
                self.persist_draft();
                true
            }
            None => false,
        }
    }

    /// Zero the live counters as a single undoable edit.
    pub fn clear_counts(&mut self) {
        if self.counts.is_zero() {
            return;
        }
        self.history.record(HistoryEntry::Reset { before: self.counts });
        self.counts = StatLine::default();
        self.persist_draft();
    }

    /// Throw away the draft and its history and start fresh.
    pub fn new_draft(&mut self) {
        self.counts = StatLine::default();
        self.history.clear();
        self.persist_draft();
    }

    // ========================
    // Finalize
    // ========================

    pub fn may_finalize(&self) -> bool {
        self.entitlement.may_finalize(Utc::now())
    }

    /// Convert the live counters into an immutable game record, gated by
    /// the entitlement ledger. The gate check and the consume run back to
    /// back with no other finalize attempt in between.
    pub fn finalize(&mut self, input: FinalizeInput) -> Result<FinalizeOutcome> {
        let player = input.player.trim();
        if player.is_empty() {
            return Err(CoreError::Validation("player name is required".to_string()));
        }
        if !self.scopes.contains(&input.scope_id) {
            return Err(CoreError::Validation(format!(
                "unknown team scope '{}'",
                input.scope_id
            )));
        }

        let now = Utc::now();
        if !self.entitlement.may_finalize(now) {
            log::info!("Finalize blocked by paywall (plan {:?})", self.entitlement.plan);
            return Ok(FinalizeOutcome::PaywallRequired);
        }

        let record = GameRecord::new(
            now,
            input.game_date,
            input.scope_id,
            input.opponent,
            player.to_string(),
            input.note,
            self.counts,
        );

        self.games.append(record.clone());
        self.entitlement.consume_finalize(now);
        self.history.clear();
        self.counts = StatLine::default();

        self.persist_games();
        self.persist_entitlement();
        self.persist_draft();

        log::info!("Finalized game {} for {}", record.id, record.player);
        Ok(FinalizeOutcome::Recorded(record))
    }

    /// Delete a finalized game after user confirmation. Idempotent.
    pub fn delete_game(&mut self, id: &str) -> bool {
        let removed = self.games.remove(id);
        if removed {
            self.persist_games();
            log::info!("Deleted game {}", id);
        }
        removed
    }

    // ========================
    // Queries
    // ========================

    pub fn games_for(&self, player: &str, scope_id: &str) -> Vec<&GameRecord> {
        self.games.by_player_and_scope(player, scope_id)
    }

    pub fn season(&self, player: &str, scope_id: &str) -> SeasonSummary {
        self.games.season(player, scope_id)
    }

    pub fn players_in_scope(&self, scope_id: &str) -> Vec<String> {
        self.games.players_in_scope(scope_id)
    }

    // ========================
    // Team scopes
    // ========================

    pub fn add_scope(&mut self, name: &str) -> TeamScope {
        let scope = self.scopes.add(name).clone();
        self.persist_scopes();
        scope
    }

    // ========================
    // Checkout & redemption
    // ========================

    /// Start a checkout for a catalog plan. The returned URL is where
    /// the UI navigates; nothing is mutated until the resumption point.
    pub fn begin_checkout(&self, gateway: &dyn PaymentGateway, plan_token: &str) -> Result<String> {
        if redemption::lookup_plan(plan_token).is_none() {
            return Err(CoreError::UnrecognizedPlan { token: plan_token.to_string() });
        }
        Ok(gateway.create_checkout(plan_token)?)
    }

    /// Resumption point after returning from checkout. Verifies the
    /// transaction once and redeems it; a page refresh re-entering here
    /// with the same transaction id is harmless.
    pub fn resume_checkout(
        &mut self,
        gateway: &dyn PaymentGateway,
        transaction_id: &str,
    ) -> Result<ResumeOutcome> {
        if self.redemptions.contains(transaction_id) {
            return Ok(ResumeOutcome::AlreadyRedeemed);
        }

        let purchase = gateway.verify_transaction(transaction_id)?;
        if !purchase.paid {
            log::info!("Transaction {} not yet paid", transaction_id);
            return Ok(ResumeOutcome::NotPaid);
        }

        let outcome = redemption::redeem(
            &mut self.redemptions,
            &mut self.entitlement,
            transaction_id,
            &purchase.plan_token,
            Utc::now(),
        )?;

        self.persist_entitlement();
        self.persist_redemptions();

        Ok(match outcome {
            RedeemOutcome::Applied => ResumeOutcome::Redeemed,
            RedeemOutcome::AlreadyApplied => ResumeOutcome::AlreadyRedeemed,
        })
    }

    // ========================
    // Sharing
    // ========================

    /// Format the live line for the share sheet. Cosmetic; the outcome
    /// does not affect any ledger.
    pub fn share_box_score(&self, hooks: &dyn DeviceHooks, player: &str) -> ShareOutcome {
        hooks.share_text(&derived::share_text(player, &self.counts))
    }

    // ========================
    // Write-through persistence
    // ========================

    fn persist_draft(&mut self) {
        write_through(&mut self.store, keys::DRAFT, &self.counts);
    }

    fn persist_games(&mut self) {
        write_through(&mut self.store, keys::GAMES, &self.games);
    }

    fn persist_scopes(&mut self) {
        write_through(&mut self.store, keys::SCOPES, &self.scopes);
    }

    fn persist_entitlement(&mut self) {
        write_through(&mut self.store, keys::ENTITLEMENT, &self.entitlement);
    }

    fn persist_redemptions(&mut self) {
        write_through(&mut self.store, keys::REDEMPTIONS, &self.redemptions);
    }
}

fn write_through<S: KvStore, T: Serialize>(store: &mut S, key: &str, value: &T) {
    match serde_json::to_value(value) {
        Ok(json) => store.set(key, &json),
        Err(err) => log::warn!("Failed to serialize '{}': {}", key, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entitlement::{Plan, TRIAL_LIMIT};
    use crate::gateway::{GatewayError, VerifiedPurchase};
    use crate::record::DEFAULT_SCOPE_ID;
    use crate::store::MemoryStore;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Scripted gateway: transaction id -> verification result.
    struct StubGateway {
        purchases: HashMap<String, VerifiedPurchase>,
        verify_calls: RefCell<u32>,
    }

    impl StubGateway {
        fn with_purchase(transaction_id: &str, plan_token: &str, paid: bool) -> Self {
            let mut purchases = HashMap::new();
            purchases.insert(
                transaction_id.to_string(),
                VerifiedPurchase { paid, plan_token: plan_token.to_string() },
            );
            Self { purchases, verify_calls: RefCell::new(0) }
        }
    }

    impl PaymentGateway for StubGateway {
        fn create_checkout(&self, plan_token: &str) -> std::result::Result<String, GatewayError> {
            Ok(format!("https://checkout.test/session/{}", plan_token))
        }

        fn verify_transaction(
            &self,
            transaction_id: &str,
        ) -> std::result::Result<VerifiedPurchase, GatewayError> {
            *self.verify_calls.borrow_mut() += 1;
            self.purchases
                .get(transaction_id)
                .cloned()
                .ok_or_else(|| GatewayError::Verification("unknown transaction".to_string()))
        }
    }

    /// Gateway that always fails.
    struct DownGateway;

    impl PaymentGateway for DownGateway {
        fn create_checkout(&self, _plan_token: &str) -> std::result::Result<String, GatewayError> {
            Err(GatewayError::Checkout("network unreachable".to_string()))
        }

        fn verify_transaction(
            &self,
            _transaction_id: &str,
        ) -> std::result::Result<VerifiedPurchase, GatewayError> {
            Err(GatewayError::Verification("network unreachable".to_string()))
        }
    }

    fn fresh_session() -> Session<MemoryStore> {
        Session::load(MemoryStore::new())
    }

    fn finalize_input(player: &str) -> FinalizeInput {
        FinalizeInput {
            player: player.to_string(),
            game_date: NaiveDate::from_ymd_opt(2024, 11, 2).unwrap(),
            scope_id: DEFAULT_SCOPE_ID.to_string(),
            opponent: "Tigers".to_string(),
            note: None,
        }
    }

    #[test]
    fn test_first_run_defaults() {
        let session = fresh_session();

        assert!(session.counts().is_zero());
        assert_eq!(session.games().len(), 0);
        assert_eq!(session.scopes().len(), 1);
        assert_eq!(session.entitlement().plan, Plan::Free);
    }

    #[test]
    fn test_tap_undo_tap() {
        let mut session = fresh_session();

        session.apply_stat(StatKey::TwoPointMade, 1);
        session.apply_stat(StatKey::Assist, 1);
        assert_eq!(session.history_len(), 2);

        assert!(session.undo());
        assert_eq!(session.counts().assist, 0);
        assert_eq!(session.counts().two_point_made, 1);

        assert!(session.undo());
        assert!(session.counts().is_zero());

        // Empty history: no-op, no panic
        assert!(!session.undo());
    }

    #[test]
    fn test_clamped_decrement_records_no_history() {
        let mut session = fresh_session();

        session.apply_stat(StatKey::Turnover, -1);

        assert_eq!(session.counts().turnover, 0);
        assert_eq!(session.history_len(), 0);
    }

    #[test]
    fn test_clear_counts_is_undoable() {
        let mut session = fresh_session();
        session.apply_stat(StatKey::ThreePointMade, 1);
        session.apply_stat(StatKey::Steal, 2);

        session.clear_counts();
        assert!(session.counts().is_zero());

        assert!(session.undo());
        assert_eq!(session.counts().three_point_made, 1);
        assert_eq!(session.counts().steal, 2);
    }

    #[test]
    fn test_trial_allows_two_finalizes_then_blocks() {
        let mut session = fresh_session();

        for n in 1..=TRIAL_LIMIT {
            session.apply_stat(StatKey::TwoPointMade, 1);
            let outcome = session.finalize(finalize_input("Jordan")).unwrap();
            assert!(matches!(outcome, FinalizeOutcome::Recorded(_)), "finalize {} blocked", n);
        }
        assert_eq!(session.games().len(), TRIAL_LIMIT as usize);
        assert_eq!(session.entitlement().free_used, TRIAL_LIMIT);

        session.apply_stat(StatKey::TwoPointMade, 1);
        let outcome = session.finalize(finalize_input("Jordan")).unwrap();

        assert_eq!(outcome, FinalizeOutcome::PaywallRequired);
        assert_eq!(session.games().len(), TRIAL_LIMIT as usize);
        // The blocked attempt consumed nothing and kept the live line
        assert_eq!(session.entitlement().free_used, TRIAL_LIMIT);
        assert_eq!(session.counts().two_point_made, 1);
    }

    #[test]
    fn test_finalize_clears_draft_and_history() {
        let mut session = fresh_session();
        session.apply_stat(StatKey::FreeThrowMade, 2);

        let outcome = session.finalize(finalize_input("Jordan")).unwrap();

        let record = match outcome {
            FinalizeOutcome::Recorded(record) => record,
            other => panic!("expected a recorded game, got {:?}", other),
        };
        assert_eq!(record.stats.free_throw_made, 2);
        assert!(session.counts().is_zero());
        assert_eq!(session.history_len(), 0);
        assert!(!session.undo());
    }

    #[test]
    fn test_finalize_requires_player_name() {
        let mut session = fresh_session();
        session.apply_stat(StatKey::Assist, 1);

        let err = session.finalize(finalize_input("   ")).unwrap_err();

        assert!(matches!(err, CoreError::Validation(_)));
        // Nothing mutated: the attempt is blocked before the gate
        assert_eq!(session.games().len(), 0);
        assert_eq!(session.entitlement().free_used, 0);
        assert_eq!(session.counts().assist, 1);
    }

    #[test]
    fn test_finalize_rejects_unknown_scope() {
        let mut session = fresh_session();
        let mut input = finalize_input("Jordan");
        input.scope_id = "no-such-scope".to_string();

        let err = session.finalize(input).unwrap_err();

        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_delete_game_is_idempotent() {
        let mut session = fresh_session();
        session.apply_stat(StatKey::TwoPointMade, 1);
        let outcome = session.finalize(finalize_input("Jordan")).unwrap();
        let id = match outcome {
            FinalizeOutcome::Recorded(record) => record.id,
            other => panic!("expected a recorded game, got {:?}", other),
        };

        assert!(session.delete_game(&id));
        assert!(!session.delete_game(&id));
        assert_eq!(session.games().len(), 0);
    }

    #[test]
    fn test_paywall_then_redeem_then_finalize() {
        let mut session = fresh_session();
        session.entitlement.free_used = TRIAL_LIMIT;

        session.apply_stat(StatKey::ThreePointMade, 1);
        assert_eq!(
            session.finalize(finalize_input("Jordan")).unwrap(),
            FinalizeOutcome::PaywallRequired
        );

        let gateway = StubGateway::with_purchase("tx_1", "credit_single", true);
        assert_eq!(session.resume_checkout(&gateway, "tx_1").unwrap(), ResumeOutcome::Redeemed);
        assert_eq!(session.entitlement().plan, Plan::Credits);
        assert_eq!(session.entitlement().credits_remaining, 1);

        // The live line survived the paywall and finalizes now
        let outcome = session.finalize(finalize_input("Jordan")).unwrap();
        assert!(matches!(outcome, FinalizeOutcome::Recorded(_)));
        assert_eq!(session.entitlement().credits_remaining, 0);
    }

    #[test]
    fn test_resume_checkout_verifies_once_per_transaction() {
        let mut session = fresh_session();
        let gateway = StubGateway::with_purchase("tx_1", "credit_single", true);

        assert_eq!(session.resume_checkout(&gateway, "tx_1").unwrap(), ResumeOutcome::Redeemed);
        // Refresh re-enters the resumption point
        assert_eq!(
            session.resume_checkout(&gateway, "tx_1").unwrap(),
            ResumeOutcome::AlreadyRedeemed
        );

        assert_eq!(*gateway.verify_calls.borrow(), 1);
        assert_eq!(session.entitlement().credits_remaining, 1);
    }

    #[test]
    fn test_unpaid_transaction_redeems_nothing() {
        let mut session = fresh_session();
        let gateway = StubGateway::with_purchase("tx_1", "credit_single", false);

        assert_eq!(session.resume_checkout(&gateway, "tx_1").unwrap(), ResumeOutcome::NotPaid);
        assert_eq!(session.entitlement().plan, Plan::Free);

        // Once paid, the same transaction goes through
        let gateway = StubGateway::with_purchase("tx_1", "credit_single", true);
        assert_eq!(session.resume_checkout(&gateway, "tx_1").unwrap(), ResumeOutcome::Redeemed);
    }

    #[test]
    fn test_gateway_failure_mutates_nothing() {
        let mut session = fresh_session();

        let err = session.resume_checkout(&DownGateway, "tx_1").unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(session.entitlement().plan, Plan::Free);
        assert!(session.redemptions.is_empty());
    }

    #[test]
    fn test_begin_checkout_rejects_unknown_token() {
        let session = fresh_session();
        let gateway = StubGateway::with_purchase("tx_1", "credit_single", true);

        let err = session.begin_checkout(&gateway, "mystery_plan").unwrap_err();
        assert!(matches!(err, CoreError::UnrecognizedPlan { .. }));

        let url = session.begin_checkout(&gateway, "season_pass").unwrap();
        assert!(url.contains("season_pass"));
    }

    #[test]
    fn test_reload_reconstructs_state() {
        let mut store = MemoryStore::new();
        {
            let mut session = Session::load(std::mem::take(&mut store));
            session.apply_stat(StatKey::TwoPointMade, 1);
            session.finalize(finalize_input("Jordan")).unwrap();
            session.apply_stat(StatKey::Assist, 3);
            let gateway = StubGateway::with_purchase("tx_9", "credit_pack_5", true);
            session.resume_checkout(&gateway, "tx_9").unwrap();
            store = session.store;
        }

        let reloaded = Session::load(store);

        assert_eq!(reloaded.games().len(), 1);
        assert_eq!(reloaded.counts().assist, 3);
        assert_eq!(reloaded.entitlement().plan, Plan::Credits);
        assert_eq!(reloaded.entitlement().credits_remaining, 5);
        assert!(reloaded.redemptions.contains("tx_9"));
        // History is session-only
        assert_eq!(reloaded.history_len(), 0);
    }

    #[test]
    fn test_season_query_spans_finalized_games() {
        let mut session = fresh_session();
        session.entitlement.plan = Plan::Credits;
        session.entitlement.credits_remaining = 3;

        for made in [2, 1, 0] {
            session.apply_stat(StatKey::TwoPointMade, made);
            session.apply_stat(StatKey::FreeThrowMade, 1);
            session.finalize(finalize_input("Jordan")).unwrap();
        }

        let season = session.season("Jordan", DEFAULT_SCOPE_ID);

        assert_eq!(season.games, 3);
        assert_eq!(season.totals.two_point_made, 3);
        assert_eq!(season.totals.free_throw_made, 3);
        assert_eq!(season.points(), 9);
        assert_eq!(season.points_per_game(), 3.0);
    }

    #[test]
    fn test_hooks_drive_share_and_haptics() {
        #[derive(Default)]
        struct CapturingHooks {
            shared: RefCell<String>,
            pulses: RefCell<u32>,
        }
        impl DeviceHooks for CapturingHooks {
            fn share_text(&self, text: &str) -> ShareOutcome {
                *self.shared.borrow_mut() = text.to_string();
                ShareOutcome::Shared
            }
            fn vibrate(&self, _millis: u32) {
                *self.pulses.borrow_mut() += 1;
            }
        }

        let mut session = fresh_session();
        let hooks = CapturingHooks::default();

        session.tap(StatKey::TwoPointMade, 1, &hooks);
        session.tap(StatKey::TwoPointMade, 1, &hooks);
        assert_eq!(*hooks.pulses.borrow(), 2);

        let outcome = session.share_box_score(&hooks, "Jordan");

        assert_eq!(outcome, ShareOutcome::Shared);
        assert!(hooks.shared.borrow().contains("Jordan: 4 PTS"));
    }
}
