//! Shared types for the STAKEBOOK engine.
//!
//! These types form the data model used across all modules: accounts,
//! bets, the per-account ledger, risk limits, and violations. They are
//! designed to be stable so that engine, ingest, and api modules can
//! depend on them without circular references.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// Account class controlling min-bet percentage and max-bet caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountTier {
    Standard,
    Pro,
}

impl fmt::Display for AccountTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountTier::Standard => write!(f, "Standard"),
            AccountTier::Pro => write!(f, "Pro"),
        }
    }
}

impl std::str::FromStr for AccountTier {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(AccountTier::Standard),
            "pro" => Ok(AccountTier::Pro),
            _ => Err(anyhow::anyhow!("Unknown account tier: {s}")),
        }
    }
}

/// Challenge progression stage. Advances only forward, one step per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Phase1,
    Phase2,
    Funded,
}

impl Phase {
    /// The next phase, or None if already funded.
    pub fn next(&self) -> Option<Phase> {
        match self {
            Phase::Phase1 => Some(Phase::Phase2),
            Phase::Phase2 => Some(Phase::Funded),
            Phase::Funded => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Phase1 => write!(f, "Phase 1"),
            Phase::Phase2 => write!(f, "Phase 2"),
            Phase::Funded => write!(f, "Funded"),
        }
    }
}

/// Mutable policy/state attached to an account. Persisted as the
/// per-account config document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    pub account_tier: AccountTier,
    pub account_size: Decimal,
    pub current_phase: Phase,
    pub start_date: NaiveDate,
    /// Date of the most recent bet; used for inactivity checks.
    #[serde(default)]
    pub last_activity: Option<NaiveDate>,
    /// Balance snapshot when the current phase began.
    pub phase_start_balance: Decimal,
    /// High-water mark of balance ever reached; never decreases.
    #[serde(default)]
    pub highest_balance: Decimal,
}

impl AccountConfig {
    pub fn new(tier: AccountTier, size: Decimal, start_date: NaiveDate) -> Self {
        Self {
            account_tier: tier,
            account_size: size,
            current_phase: Phase::Phase1,
            start_date,
            last_activity: None,
            phase_start_balance: size,
            highest_balance: size,
        }
    }

    /// Clamp the high-water mark so it never falls below the account size
    /// or the given balance. Older persisted configs may be missing the
    /// field entirely (deserialized as zero).
    pub fn ensure_highest(&mut self, balance: Decimal) {
        if self.highest_balance < self.account_size {
            self.highest_balance = self.account_size;
        }
        if self.highest_balance < balance {
            self.highest_balance = balance;
        }
    }
}

/// Entry in the top-level accounts index document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountInfo {
    pub name: String,
    pub tier: AccountTier,
    pub size: Decimal,
    pub active: bool,
    pub created: NaiveDate,
}

/// Accounts index: account id → summary info.
pub type AccountsIndex = BTreeMap<String, AccountInfo>;

// ---------------------------------------------------------------------------
// Bets
// ---------------------------------------------------------------------------

/// Settled wager outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BetResult {
    Win,
    Loss,
    Push,
    Refunded,
    CashedOut,
}

impl BetResult {
    pub const ALL: &'static [BetResult] = &[
        BetResult::Win,
        BetResult::Loss,
        BetResult::Push,
        BetResult::Refunded,
        BetResult::CashedOut,
    ];
}

impl fmt::Display for BetResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BetResult::Win => write!(f, "WIN"),
            BetResult::Loss => write!(f, "LOSS"),
            BetResult::Push => write!(f, "PUSH"),
            BetResult::Refunded => write!(f, "REFUNDED"),
            BetResult::CashedOut => write!(f, "CASHED_OUT"),
        }
    }
}

/// A single leg of a parlay: selection plus its own American odds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParlayLeg {
    pub selection: String,
    pub odds: i64,
}

/// A settled wager record. Editable/deletable as a whole record; `pnl`
/// and `balance_after` are derived and recomputed by the ledger, never
/// set independently by callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bet {
    pub id: String,
    pub date: NaiveDate,
    pub sport: String,
    pub selection: String,
    pub stake: Decimal,
    /// American odds. For parlays this is the combined odds derived from
    /// the legs, not any single leg's own odds.
    pub odds: i64,
    pub result: BetResult,
    #[serde(default)]
    pub is_parlay: bool,
    #[serde(default)]
    pub parlay_legs: Vec<ParlayLeg>,
    pub pnl: Decimal,
    /// Running balance snapshot immediately after this bet.
    pub balance_after: Decimal,
}

impl fmt::Display for Bet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.pnl >= Decimal::ZERO { "+" } else { "" };
        write!(
            f,
            "{} {} {} ${} @ {:+} {} ({sign}{})",
            self.date, self.sport, self.selection, self.stake, self.odds, self.result, self.pnl,
        )
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// The ordered bet record for one account plus its running balances.
/// Persisted as the per-account data document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    pub bets: Vec<Bet>,
    pub account_balance: Decimal,
    pub starting_balance: Decimal,
}

impl Ledger {
    /// An empty ledger with zero balances. First-time initialization with
    /// the real starting size is the caller's responsibility.
    pub fn zeroed() -> Self {
        Self {
            bets: Vec::new(),
            account_balance: Decimal::ZERO,
            starting_balance: Decimal::ZERO,
        }
    }

    pub fn bet_count(&self) -> usize {
        self.bets.len()
    }

    /// Sum of pnl over all bets.
    pub fn total_pnl(&self) -> Decimal {
        self.bets.iter().map(|b| b.pnl).sum()
    }

    /// Locate a bet index by id.
    pub fn find(&self, bet_id: &str) -> Option<usize> {
        self.bets.iter().position(|b| b.id == bet_id)
    }

    /// Full recompute: stable-sort bets by date (insertion order breaks
    /// ties), then walk forward from `starting_balance` accumulating each
    /// bet's authoritative `pnl` into `balance_after`. The final cumulative
    /// value becomes `account_balance`. Runs after every edit, delete, and
    /// out-of-order insert so that historical changes never leave the
    /// running balance inconsistent.
    pub fn recompute(&mut self) {
        self.bets.sort_by_key(|b| b.date);
        let mut balance = self.starting_balance;
        for bet in &mut self.bets {
            balance += bet.pnl;
            bet.balance_after = balance;
        }
        self.account_balance = balance;
    }

    /// Sum of pnl for bets on the given date.
    pub fn daily_pnl(&self, date: NaiveDate) -> Decimal {
        self.bets
            .iter()
            .filter(|b| b.date == date)
            .map(|b| b.pnl)
            .sum()
    }

    /// Maximum peak-to-trough drop over the balance curve.
    ///
    /// Walks the bets in reverse, reconstructing each prior balance by
    /// undoing the bet's pnl, and tracks the lowest later balance seen.
    /// Each reconstructed (earlier) balance minus that trough is a
    /// peak-to-trough candidate; the largest wins.
    pub fn max_drawdown(&self) -> Decimal {
        let mut running = self.account_balance;
        let mut trough = running;
        let mut max_dd = Decimal::ZERO;
        for bet in self.bets.iter().rev() {
            running -= bet.pnl;
            if running < trough {
                trough = running;
            }
            let dd = running - trough;
            if dd > max_dd {
                max_dd = dd;
            }
        }
        max_dd
    }
}

// ---------------------------------------------------------------------------
// Risk limits
// ---------------------------------------------------------------------------

/// Allowed stake range for the next bet, given the account snapshot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskLimits {
    pub min_risk: Decimal,
    pub max_risk: Decimal,
    /// Balance the minimum was computed from. When drawdown protection is
    /// active this is the 85%-of-peak floor, not the live balance.
    pub balance_for_calculation: Decimal,
    pub drawdown_protected: bool,
}

// ---------------------------------------------------------------------------
// Violations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    DailyLoss,
    MaxDrawdown,
    PickMinimum,
    Inactivity,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::DailyLoss => write!(f, "daily_loss"),
            ViolationKind::MaxDrawdown => write!(f, "max_drawdown"),
            ViolationKind::PickMinimum => write!(f, "pick_minimum"),
            ViolationKind::Inactivity => write!(f, "inactivity"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// A detected breach of a compliance rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    #[serde(rename = "type")]
    pub kind: ViolationKind,
    pub message: String,
    pub severity: Severity,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.kind, self.message)
    }
}

// ---------------------------------------------------------------------------
// Operation results
// ---------------------------------------------------------------------------

/// Returned by a successful add-bet, alongside the compliance check run
/// on the new state.
#[derive(Debug, Clone, Serialize)]
pub struct BetAdded {
    pub bet_id: String,
    pub pnl: Decimal,
    pub new_balance: Decimal,
    pub violations: Vec<Violation>,
}

/// Aggregate result of a CSV import batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub errors: usize,
    pub warnings: usize,
    pub error_messages: Vec<String>,
    pub warning_messages: Vec<String>,
    pub new_balance: Decimal,
}

/// Aggregate status report for the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct AccountStatus {
    pub balance: Decimal,
    pub starting_balance: Decimal,
    pub highest_balance: Decimal,
    pub phase: Phase,
    pub phase_start_balance: Decimal,
    /// 20% of the phase start balance.
    pub profit_target: Decimal,
    /// Progress toward the phase profit target, 0–100.
    pub profit_progress_pct: Decimal,
    pub total_bets: usize,
    pub max_drawdown: Decimal,
    pub risk_limits: RiskLimits,
    pub drawdown_protected: bool,
    pub violations: Vec<Violation>,
    pub last_activity: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

fn stake_range_message(
    min: &Decimal,
    max: &Decimal,
    tier: &AccountTier,
    size: &Decimal,
    protected: &bool,
) -> String {
    let suffix = if *protected {
        " (drawdown protection active)"
    } else {
        ""
    };
    format!("Stake must be between ${min} and ${max} for a {tier} ${size} account{suffix}")
}

/// Domain errors for the ledger engine. All returned as values; the web
/// handler translates them into user-visible responses.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("{}", stake_range_message(.min, .max, .tier, .size, .drawdown_protected))]
    StakeOutOfRange {
        min: Decimal,
        max: Decimal,
        tier: AccountTier,
        size: Decimal,
        drawdown_protected: bool,
    },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid result: {0}")]
    InvalidResult(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
