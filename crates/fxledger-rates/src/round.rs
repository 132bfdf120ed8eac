//! Significant-figure rounding for rates.
//!
//! Rates are ratios of running totals and would otherwise carry all 28 digits
//! a `Decimal` can hold. Every emitted rate is cut to a fixed number of
//! significant figures, rounding half away from zero.

use rust_decimal::{Decimal, RoundingStrategy};

/// Significant figures kept on every emitted rate.
pub const RATE_SIGFIGS: u32 = 8;

/// Significant figures kept on the intermediate product while resolving an
/// indirect rate.
pub const PRODUCT_SIGFIGS: u32 = 9;

/// Round `value` to `digits` significant figures, half away from zero.
///
/// ```
/// use fxledger_rates::round::round_sigfigs;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(round_sigfigs(dec!(123.456789012), 8), dec!(123.45679));
/// assert_eq!(round_sigfigs(dec!(0.000123456785), 8), dec!(0.00012345679));
/// assert_eq!(round_sigfigs(dec!(0), 8), dec!(0));
/// ```
#[must_use]
pub fn round_sigfigs(value: Decimal, digits: u32) -> Decimal {
    if value.is_zero() || digits == 0 {
        return value;
    }
    value
        .round_sf_with_strategy(digits, RoundingStrategy::MidpointAwayFromZero)
        .unwrap_or(value)
        .normalize()
}

/// Divide and round to [`RATE_SIGFIGS`]; `None` when `denominator` is zero.
#[must_use]
pub fn rate_div(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    if denominator.is_zero() {
        return None;
    }
    numerator
        .checked_div(denominator)
        .map(|q| round_sigfigs(q, RATE_SIGFIGS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_half_rounds_away_from_zero() {
        assert_eq!(round_sigfigs(dec!(1.00000005), 8), dec!(1.0000001));
        assert_eq!(round_sigfigs(dec!(-1.00000005), 8), dec!(-1.0000001));
        assert_eq!(round_sigfigs(dec!(1.00000004), 8), dec!(1));
    }

    #[test]
    fn test_large_values_keep_integer_digits() {
        assert_eq!(round_sigfigs(dec!(123456789.4), 9), dec!(123456789));
        assert_eq!(round_sigfigs(dec!(123456789.4), 8), dec!(123456790));
    }

    #[test]
    fn test_rate_div() {
        assert_eq!(rate_div(dec!(7000), dec!(300)), Some(dec!(23.333333)));
        assert_eq!(rate_div(dec!(2), dec!(3)), Some(dec!(0.66666667)));
        assert_eq!(rate_div(dec!(1), dec!(0)), None);
    }
}
