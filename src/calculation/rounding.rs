//! Monetary rounding.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds to 2 decimal places, halves away from zero.
///
/// Every stored money amount passes through this function exactly once.
///
/// # Examples
///
/// ```
/// use hr_engine::calculation::round2;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// assert_eq!(round2(Decimal::from_str("2.345").unwrap()), Decimal::from_str("2.35").unwrap());
/// assert_eq!(round2(Decimal::from_str("-2.345").unwrap()), Decimal::from_str("-2.35").unwrap());
/// assert_eq!(round2(Decimal::from_str("2.344").unwrap()), Decimal::from_str("2.34").unwrap());
/// ```
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_half_rounds_away_from_zero() {
        assert_eq!(round2(dec("0.005")), dec("0.01"));
        assert_eq!(round2(dec("-0.005")), dec("-0.01"));
        assert_eq!(round2(dec("1.125")), dec("1.13"));
    }

    #[test]
    fn test_whole_numbers_are_unchanged() {
        assert_eq!(round2(dec("5300000")), dec("5300000"));
        assert_eq!(round2(Decimal::ZERO), Decimal::ZERO);
    }

    proptest! {
        #[test]
        fn prop_round2_is_idempotent(mantissa in -1_000_000_000_000i64..1_000_000_000_000i64, scale in 0u32..10) {
            let value = Decimal::new(mantissa, scale);
            prop_assert_eq!(round2(round2(value)), round2(value));
        }

        #[test]
        fn prop_round2_moves_value_by_at_most_half_a_cent(mantissa in -1_000_000_000i64..1_000_000_000i64, scale in 0u32..8) {
            let value = Decimal::new(mantissa, scale);
            let diff = (round2(value) - value).abs();
            prop_assert!(diff <= dec("0.005"));
        }
    }
}
