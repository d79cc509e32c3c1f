//! Odds conversion.
//!
//! Pure functions converting between American and decimal odds, plus
//! combined parlay odds. No state.

/// Convert American odds to decimal odds.
///
/// `+150` → 2.5, `-110` → ~1.909. Zero is degenerate (no such price
/// exists); callers must guard before converting.
pub fn american_to_decimal(odds: i64) -> f64 {
    if odds > 0 {
        odds as f64 / 100.0 + 1.0
    } else {
        100.0 / odds.abs() as f64 + 1.0
    }
}

/// Convert decimal odds back to American, rounded to the nearest integer.
pub fn decimal_to_american(decimal: f64) -> i64 {
    if decimal >= 2.0 {
        ((decimal - 1.0) * 100.0).round() as i64
    } else {
        (-100.0 / (decimal - 1.0)).round() as i64
    }
}

/// Combined American odds for a parlay: leg decimal odds multiply.
///
/// An empty leg list returns the sentinel 0 ("no parlay").
pub fn combined_parlay_odds(legs: &[i64]) -> i64 {
    if legs.is_empty() {
        return 0;
    }
    let product: f64 = legs.iter().map(|&o| american_to_decimal(o)).product();
    decimal_to_american(product)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_american_to_decimal_positive() {
        assert!((american_to_decimal(150) - 2.5).abs() < 1e-10);
        assert!((american_to_decimal(100) - 2.0).abs() < 1e-10);
        assert!((american_to_decimal(400) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_american_to_decimal_negative() {
        assert!((american_to_decimal(-110) - 1.909090909).abs() < 1e-6);
        assert!((american_to_decimal(-200) - 1.5).abs() < 1e-10);
        assert!((american_to_decimal(-500) - 1.2).abs() < 1e-10);
    }

    #[test]
    fn test_decimal_to_american() {
        assert_eq!(decimal_to_american(2.5), 150);
        assert_eq!(decimal_to_american(2.0), 100);
        assert_eq!(decimal_to_american(1.5), -200);
    }

    #[test]
    fn test_round_trip_within_one() {
        for odds in [-500, -200, -110, 100, 150, 400] {
            let back = decimal_to_american(american_to_decimal(odds));
            assert!(
                (back - odds).abs() <= 1,
                "round trip of {odds} gave {back}"
            );
        }
    }

    #[test]
    fn test_parlay_two_legs() {
        // -150 → 1.667, +120 → 2.2; product 3.667 → +267
        let combined = combined_parlay_odds(&[-150, 120]);
        assert!((combined - 267).abs() <= 1, "got {combined}");
    }

    #[test]
    fn test_parlay_three_legs() {
        // Three even-money legs: 2.0^3 = 8.0 → +700
        assert_eq!(combined_parlay_odds(&[100, 100, 100]), 700);
    }

    #[test]
    fn test_parlay_single_leg_is_identity_ish() {
        let combined = combined_parlay_odds(&[-110]);
        assert!((combined - (-110)).abs() <= 1);
    }

    #[test]
    fn test_parlay_empty_is_sentinel_zero() {
        assert_eq!(combined_parlay_odds(&[]), 0);
    }
}
