//! Payout calculation.
//!
//! Profit/loss for a single settled wager given stake, American odds,
//! and outcome. For parlays the caller resolves the combined odds first
//! (see `odds::combined_parlay_odds`); the stored bet's odds field is
//! already the combined value.

use rust_decimal::Decimal;

use crate::types::{BetResult, LedgerError};

/// Compute the profit/loss of a settled wager, rounded to cents.
///
/// Cash-outs settle to zero: the actual cash-out amount is not captured,
/// a preserved simplification of the challenge rules.
pub fn payout(stake: Decimal, odds: i64, result: BetResult) -> Result<Decimal, LedgerError> {
    let pnl = match result {
        BetResult::Loss => -stake,
        BetResult::Push | BetResult::Refunded | BetResult::CashedOut => Decimal::ZERO,
        BetResult::Win => {
            if odds > 0 {
                stake * Decimal::from(odds) / Decimal::from(100)
            } else if odds < 0 {
                stake * Decimal::from(100) / Decimal::from(odds.abs())
            } else {
                return Err(LedgerError::InvalidResult(
                    "cannot settle a win at odds of 0".into(),
                ));
            }
        }
    };
    Ok(pnl.round_dp(2))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
