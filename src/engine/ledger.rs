//! Ledger engine — the account ledger and compliance-rule core.
//!
//! Owns the per-account persisted state and every mutation path into it:
//! add, edit, delete, clear, phase advancement, and the status report.
//! Every insert/edit/delete triggers a full chronological recompute so
//! that historical changes never leave the running balance inconsistent,
//! and every add is gated by the risk limit policy.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{info, warn};

use crate::engine::risk::risk_limits;
use crate::engine::violations;
use crate::odds::combined_parlay_odds;
use crate::payout::payout;
use crate::storage::Storage;
use crate::types::{
    AccountConfig, AccountInfo, AccountStatus, AccountTier, BetAdded, Bet, BetResult, Ledger,
    LedgerError, ParlayLeg,
};

/// Fraction of the phase start balance required as profit to pass a phase.
const PHASE_PROFIT_TARGET: Decimal = dec!(0.20);

/// Input for a new wager, before ids and derived fields exist.
#[derive(Debug, Clone)]
pub struct NewBet {
    pub date: NaiveDate,
    pub sport: String,
    pub selection: String,
    pub stake: Decimal,
    pub odds: i64,
    pub result: BetResult,
    pub is_parlay: bool,
    pub parlay_legs: Vec<ParlayLeg>,
}

/// Replacement fields for an edit. The record keeps its id and parlay
/// metadata; on a parlay the edited odds are the combined value.
#[derive(Debug, Clone)]
pub struct BetPatch {
    pub date: NaiveDate,
    pub sport: String,
    pub selection: String,
    pub stake: Decimal,
    pub odds: i64,
    pub result: BetResult,
}

/// The engine: storage plus all ledger operations. One logical operation
/// per call — load, mutate, recompute, persist.
#[derive(Debug, Clone)]
pub struct LedgerEngine {
    storage: Storage,
}

fn storage_err(e: anyhow::Error) -> LedgerError {
    LedgerError::Storage(format!("{e:#}"))
}

impl LedgerEngine {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    // -- accounts --------------------------------------------------------

    /// Create a new challenge account: index entry, config document, and
    /// a ledger seeded with the starting size. Tier and size are fixed
    /// for the life of the account.
    pub fn create_account(
        &self,
        account_id: &str,
        name: &str,
        tier: AccountTier,
        size: Decimal,
        today: NaiveDate,
    ) -> Result<(), LedgerError> {
        if size <= Decimal::ZERO {
            return Err(LedgerError::InvalidData(
                "account size must be positive".into(),
            ));
        }
        let mut index = self.storage.load_index().map_err(storage_err)?;
        if index.contains_key(account_id) {
            return Err(LedgerError::InvalidData(format!(
                "account '{account_id}' already exists"
            )));
        }

        let config = AccountConfig::new(tier, size, today);
        let ledger = Ledger {
            bets: Vec::new(),
            account_balance: size,
            starting_balance: size,
        };
        self.storage
            .save_config(account_id, &config)
            .map_err(storage_err)?;
        self.storage
            .save_ledger(account_id, &ledger)
            .map_err(storage_err)?;

        index.insert(
            account_id.to_string(),
            AccountInfo {
                name: name.to_string(),
                tier,
                size,
                active: true,
                created: today,
            },
        );
        self.storage.save_index(&index).map_err(storage_err)?;

        info!(account_id, %tier, %size, "Account created");
        Ok(())
    }

    pub fn list_accounts(&self) -> Result<crate::types::AccountsIndex, LedgerError> {
        self.storage.load_index().map_err(storage_err)
    }

    pub fn load_ledger(&self, account_id: &str) -> Result<Ledger, LedgerError> {
        self.storage.load_ledger(account_id).map_err(storage_err)
    }

    fn load_config(&self, account_id: &str) -> Result<AccountConfig, LedgerError> {
        self.storage
            .load_config(account_id)
            .map_err(storage_err)?
            .ok_or_else(|| LedgerError::NotFound(format!("account '{account_id}'")))
    }

    /// Seed a ledger that was loaded as zeroed (absent data document)
    /// with the account's real starting size.
    fn seed_if_fresh(ledger: &mut Ledger, config: &AccountConfig) {
        if ledger.bets.is_empty() && ledger.starting_balance == Decimal::ZERO {
            ledger.starting_balance = config.account_size;
            ledger.account_balance = config.account_size;
        }
    }

    // -- mutations -------------------------------------------------------

    /// Add a settled wager. The stake is gated by the risk limit policy
    /// before anything is written; on success the compliance rules are
    /// evaluated against the new state and returned with the balance.
    pub fn add_bet(
        &self,
        account_id: &str,
        new: NewBet,
        today: NaiveDate,
    ) -> Result<BetAdded, LedgerError> {
        validate_fields(&new.sport, &new.selection, new.stake)?;

        let mut config = self.load_config(account_id)?;
        let mut ledger = self.load_ledger(account_id)?;
        Self::seed_if_fresh(&mut ledger, &config);
        config.ensure_highest(ledger.account_balance);

        let limits = risk_limits(
            config.account_tier,
            config.account_size,
            ledger.account_balance,
            config.highest_balance,
        );
        if new.stake < limits.min_risk || new.stake > limits.max_risk {
            warn!(
                account_id,
                stake = %new.stake,
                min = %limits.min_risk,
                max = %limits.max_risk,
                drawdown_protected = limits.drawdown_protected,
                "Stake rejected by risk limits"
            );
            return Err(LedgerError::StakeOutOfRange {
                min: limits.min_risk,
                max: limits.max_risk,
                tier: config.account_tier,
                size: config.account_size,
                drawdown_protected: limits.drawdown_protected,
            });
        }

        let effective_odds = if new.is_parlay && !new.parlay_legs.is_empty() {
            // A zero-odds leg has no decimal price; combining it would
            // blow up the product instead of failing.
            if new.parlay_legs.iter().any(|l| l.odds == 0) {
                return Err(LedgerError::InvalidData(
                    "parlay leg odds cannot be 0".into(),
                ));
            }
            let leg_odds: Vec<i64> = new.parlay_legs.iter().map(|l| l.odds).collect();
            combined_parlay_odds(&leg_odds)
        } else {
            new.odds
        };
        if effective_odds == 0 {
            return Err(LedgerError::InvalidData("odds cannot be 0".into()));
        }

        let pnl = payout(new.stake, effective_odds, new.result)?;
        let bet = Bet {
            id: uuid::Uuid::new_v4().to_string(),
            date: new.date,
            sport: new.sport,
            selection: new.selection,
            stake: new.stake,
            odds: effective_odds,
            result: new.result,
            is_parlay: new.is_parlay,
            parlay_legs: new.parlay_legs,
            pnl,
            balance_after: ledger.account_balance + pnl,
        };
        let bet_id = bet.id.clone();
        ledger.bets.push(bet);
        // A back-dated insert lands mid-history; recompute restores the
        // chronological balance curve either way.
        ledger.recompute();

        config.ensure_highest(ledger.account_balance);
        config.last_activity = Some(new.date);

        self.storage
            .save_ledger(account_id, &ledger)
            .map_err(storage_err)?;
        self.storage
            .save_config(account_id, &config)
            .map_err(storage_err)?;

        let violations = violations::evaluate(&ledger, &config, today);
        info!(
            account_id,
            bet_id,
            pnl = %pnl,
            balance = %ledger.account_balance,
            violations = violations.len(),
            "Bet added"
        );

        Ok(BetAdded {
            bet_id,
            pnl,
            new_balance: ledger.account_balance,
            violations,
        })
    }

    /// Replace a bet's fields in place, keeping its creation-order key,
    /// then recompute the whole ledger. The pnl is re-derived from the
    /// edited stake/odds/result and becomes authoritative.
    pub fn edit_bet(
        &self,
        account_id: &str,
        bet_id: &str,
        patch: BetPatch,
    ) -> Result<Decimal, LedgerError> {
        validate_fields(&patch.sport, &patch.selection, patch.stake)?;
        if patch.odds == 0 {
            return Err(LedgerError::InvalidData("odds cannot be 0".into()));
        }

        let mut config = self.load_config(account_id)?;
        let mut ledger = self.load_ledger(account_id)?;
        let idx = ledger
            .find(bet_id)
            .ok_or_else(|| LedgerError::NotFound(format!("bet '{bet_id}'")))?;

        let pnl = payout(patch.stake, patch.odds, patch.result)?;
        let bet = &mut ledger.bets[idx];
        bet.date = patch.date;
        bet.sport = patch.sport;
        bet.selection = patch.selection;
        bet.stake = patch.stake;
        bet.odds = patch.odds;
        bet.result = patch.result;
        bet.pnl = pnl;

        ledger.recompute();
        config.ensure_highest(ledger.account_balance);

        self.storage
            .save_ledger(account_id, &ledger)
            .map_err(storage_err)?;
        self.storage
            .save_config(account_id, &config)
            .map_err(storage_err)?;

        info!(account_id, bet_id, balance = %ledger.account_balance, "Bet edited");
        Ok(ledger.account_balance)
    }

    /// Remove a bet by id and recompute.
    pub fn delete_bet(&self, account_id: &str, bet_id: &str) -> Result<Decimal, LedgerError> {
        let mut config = self.load_config(account_id)?;
        let mut ledger = self.load_ledger(account_id)?;
        let idx = ledger
            .find(bet_id)
            .ok_or_else(|| LedgerError::NotFound(format!("bet '{bet_id}'")))?;
        ledger.bets.remove(idx);

        ledger.recompute();
        config.ensure_highest(ledger.account_balance);

        self.storage
            .save_ledger(account_id, &ledger)
            .map_err(storage_err)?;
        self.storage
            .save_config(account_id, &config)
            .map_err(storage_err)?;

        info!(account_id, bet_id, balance = %ledger.account_balance, "Bet deleted");
        Ok(ledger.account_balance)
    }

    /// Wipe all bets and reset the balance to the starting balance.
    /// Destructive; the caller owes the end user a double confirmation.
    pub fn clear_all(&self, account_id: &str) -> Result<Decimal, LedgerError> {
        let mut config = self.load_config(account_id)?;
        let mut ledger = self.load_ledger(account_id)?;
        Self::seed_if_fresh(&mut ledger, &config);

        let removed = ledger.bets.len();
        ledger.bets.clear();
        ledger.account_balance = ledger.starting_balance;

        config.highest_balance = config.account_size.max(ledger.starting_balance);
        config.last_activity = None;

        self.storage
            .save_ledger(account_id, &ledger)
            .map_err(storage_err)?;
        self.storage
            .save_config(account_id, &config)
            .map_err(storage_err)?;

        warn!(account_id, removed, balance = %ledger.account_balance, "Ledger cleared");
        Ok(ledger.account_balance)
    }

    /// Advance the challenge one phase forward. Resets the phase start
    /// balance to the current balance; a funded account is a no-op.
    pub fn advance_phase(&self, account_id: &str) -> Result<String, LedgerError> {
        let mut config = self.load_config(account_id)?;
        let mut ledger = self.load_ledger(account_id)?;
        Self::seed_if_fresh(&mut ledger, &config);

        match config.current_phase.next() {
            Some(next) => {
                config.current_phase = next;
                config.phase_start_balance = ledger.account_balance;
                self.storage
                    .save_config(account_id, &config)
                    .map_err(storage_err)?;
                info!(account_id, phase = %next, "Phase advanced");
                Ok(format!("Advanced to {next}"))
            }
            None => Ok("Account is already funded".to_string()),
        }
    }

    // -- status ----------------------------------------------------------

    /// Aggregate status report: balances, phase progress, risk limits,
    /// and a fresh violation evaluation. Nothing here is cached.
    pub fn status(&self, account_id: &str, today: NaiveDate) -> Result<AccountStatus, LedgerError> {
        let mut config = self.load_config(account_id)?;
        let mut ledger = self.load_ledger(account_id)?;
        Self::seed_if_fresh(&mut ledger, &config);
        config.ensure_highest(ledger.account_balance);

        let limits = risk_limits(
            config.account_tier,
            config.account_size,
            ledger.account_balance,
            config.highest_balance,
        );
        let violations = violations::evaluate(&ledger, &config, today);

        let profit_target = config.phase_start_balance * PHASE_PROFIT_TARGET;
        let profit_progress_pct = if profit_target > Decimal::ZERO {
            ((ledger.account_balance - config.phase_start_balance) / profit_target
                * Decimal::from(100))
            .round_dp(2)
            .clamp(Decimal::ZERO, Decimal::from(100))
        } else {
            Decimal::ZERO
        };

        Ok(AccountStatus {
            balance: ledger.account_balance,
            starting_balance: ledger.starting_balance,
            highest_balance: config.highest_balance,
            phase: config.current_phase,
            phase_start_balance: config.phase_start_balance,
            profit_target,
            profit_progress_pct,
            total_bets: ledger.bet_count(),
            max_drawdown: ledger.max_drawdown(),
            drawdown_protected: limits.drawdown_protected,
            risk_limits: limits,
            violations,
            last_activity: config.last_activity,
        })
    }
}

fn validate_fields(sport: &str, selection: &str, stake: Decimal) -> Result<(), LedgerError> {
    if sport.trim().is_empty() {
        return Err(LedgerError::InvalidData("sport must not be empty".into()));
    }
    if selection.trim().is_empty() {
        return Err(LedgerError::InvalidData(
            "selection must not be empty".into(),
        ));
    }
    if stake <= Decimal::ZERO {
        return Err(LedgerError::InvalidData("stake must be positive".into()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
