//! Violation engine.
//!
//! Evaluates the compliance rules against the current ledger snapshot
//! and account config, fresh on every status request. Never
//! short-circuits: the full set of breaches comes back, possibly empty.
//!
//! Rules: daily loss over 10% of account size, max drawdown over 15%,
//! fewer than 20 total picks, and (funded accounts only) 5+ days of
//! inactivity.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{AccountConfig, Ledger, Phase, Severity, Violation, ViolationKind};

const DAILY_LOSS_PCT: Decimal = dec!(0.10);
const MAX_DRAWDOWN_PCT: Decimal = dec!(0.15);
const MIN_PICKS: usize = 20;
const INACTIVITY_DAYS: i64 = 5;

/// Evaluate all compliance rules. `today` is injected by the caller so
/// the checks are deterministic under test.
pub fn evaluate(ledger: &Ledger, config: &AccountConfig, today: NaiveDate) -> Vec<Violation> {
    let mut violations = Vec::new();
    let size = config.account_size;

    let daily = ledger.daily_pnl(today);
    let daily_limit = size * DAILY_LOSS_PCT;
    if daily < Decimal::ZERO && daily.abs() > daily_limit {
        violations.push(Violation {
            kind: ViolationKind::DailyLoss,
            message: format!(
                "Daily loss of ${} exceeds the ${daily_limit} limit (10% of account size)",
                daily.abs()
            ),
            severity: Severity::Critical,
        });
    }

    let drawdown = ledger.max_drawdown();
    let drawdown_limit = size * MAX_DRAWDOWN_PCT;
    if drawdown > drawdown_limit {
        violations.push(Violation {
            kind: ViolationKind::MaxDrawdown,
            message: format!(
                "Max drawdown of ${drawdown} exceeds the ${drawdown_limit} limit (15% of account size)"
            ),
            severity: Severity::Critical,
        });
    }

    let total = ledger.bet_count();
    if total < MIN_PICKS {
        violations.push(Violation {
            kind: ViolationKind::PickMinimum,
            message: format!("Only {total} of the minimum {MIN_PICKS} picks placed"),
            severity: Severity::Warning,
        });
    }

    if config.current_phase == Phase::Funded {
        let last = config.last_activity.unwrap_or(config.start_date);
        let idle_days = (today - last).num_days();
        if idle_days >= INACTIVITY_DAYS {
            violations.push(Violation {
                kind: ViolationKind::Inactivity,
                message: format!(
                    "No bets for {idle_days} days (funded accounts require activity every {INACTIVITY_DAYS} days)"
                ),
                severity: Severity::Critical,
            });
        }
    }

    violations
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
