//! Risk limit policy.
//!
//! Pure function of the account snapshot: tier and size fix the max-bet
//! cap, while the minimum bet tracks the balance. Once the balance falls
//! more than 15% below its historical peak, drawdown protection kicks in
//! and the minimum is computed off the 85%-of-peak floor instead of the
//! depressed live balance, raising the effective minimum-bet baseline.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{AccountTier, RiskLimits};

/// Fraction of peak balance below which drawdown protection activates.
const PROTECTION_FLOOR: Decimal = dec!(0.85);

/// Compute the allowed stake range for the next bet.
pub fn risk_limits(
    tier: AccountTier,
    size: Decimal,
    current_balance: Decimal,
    highest_balance: Decimal,
) -> RiskLimits {
    let min_percent = match tier {
        AccountTier::Standard => dec!(1.0),
        AccountTier::Pro => dec!(2.0),
    };

    let floor = highest_balance * PROTECTION_FLOOR;
    let drawdown_protected = highest_balance > Decimal::ZERO
        && current_balance > Decimal::ZERO
        && current_balance < floor;

    let balance_for_calculation = if drawdown_protected {
        floor
    } else {
        current_balance
    };

    let min_risk = (balance_for_calculation * min_percent / dec!(100)).round_dp(2);
    let max_risk = max_cap(tier, size);

    RiskLimits {
        min_risk,
        max_risk,
        balance_for_calculation,
        drawdown_protected,
    }
}

/// Fixed max-bet caps: a step function of tier and account size,
/// independent of the current balance.
fn max_cap(tier: AccountTier, size: Decimal) -> Decimal {
    match tier {
        AccountTier::Standard => {
            if size <= dec!(5000) {
                dec!(100)
            } else if size <= dec!(10000) {
                dec!(200)
            } else if size <= dec!(25000) {
                dec!(500)
            } else {
                dec!(1000)
            }
        }
        AccountTier::Pro => {
            if size <= dec!(50000) {
                dec!(2500)
            } else {
                dec!(5000)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
