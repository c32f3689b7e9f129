use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::types::{Money, Rate};

/// Absolute slack allowed when comparing two computed money totals.
pub const ABSOLUTE_TOLERANCE: Decimal = dec!(0.000001);

/// Relative slack allowed when comparing two computed money totals.
pub const RELATIVE_TOLERANCE: Decimal = dec!(0.000001);

/// Largest magnitude accepted for any money line (1e20).
///
/// Decimal range ends near 7.9e28, so sums over a full horizon and leverage
/// multiples of amounts under this limit cannot overflow.
pub const MONEY_LIMIT: Money = dec!(100000000000000000000);

/// Most decimal places a `Decimal` can carry.
pub const MAX_DECIMAL_PLACES: u32 = 28;

const CAGR_NEWTON_ITERATIONS: usize = 200;
const CAGR_NEWTON_TOLERANCE: Decimal = dec!(0.0000000000000000000001);

/// Divide, returning zero when the denominator is zero.
///
/// A quotient beyond decimal range saturates at `Decimal::MAX` or `Decimal::MIN`.
pub fn safe_divide(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        return Decimal::ZERO;
    }
    numerator.checked_div(denominator).unwrap_or_else(|| {
        if numerator.is_sign_negative() == denominator.is_sign_negative() {
            Decimal::MAX
        } else {
            Decimal::MIN
        }
    })
}

/// Round a money amount to `dp` decimal places, half away from zero.
pub fn round_money(value: Money, dp: u32) -> Money {
    value.round_dp_with_strategy(
        dp.min(MAX_DECIMAL_PLACES),
        RoundingStrategy::MidpointAwayFromZero,
    )
}

/// `|a - b|` relative to the larger magnitude of the two; zero when both are zero.
pub fn relative_difference(a: Decimal, b: Decimal) -> Decimal {
    let scale = a.abs().max(b.abs());
    safe_divide((a - b).abs(), scale)
}

/// True when `a` and `b` agree within the absolute or the relative tolerance.
pub fn within_tolerance(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() <= ABSOLUTE_TOLERANCE || relative_difference(a, b) <= RELATIVE_TOLERANCE
}

/// Compound annual growth rate `(ending / beginning)^(1/n) - 1`.
///
/// Returns -1 when a positive beginning has decayed to exactly zero, and zero
/// for a non-positive beginning, a negative ending, or `n == 0`.
pub fn compute_cagr(beginning: Money, ending: Money, n: u32) -> Rate {
    if beginning <= Decimal::ZERO || ending < Decimal::ZERO || n == 0 {
        return Decimal::ZERO;
    }
    if ending.is_zero() {
        return -Decimal::ONE;
    }

    let inv_n = Decimal::ONE / Decimal::from(n);
    let root = match ending.checked_div(beginning) {
        Some(ratio) => nth_root(ratio, n),
        // Ratio out of range: take the roots separately
        None => ending
            .checked_powd(inv_n)
            .zip(beginning.checked_powd(inv_n))
            .and_then(|(e, b)| e.checked_div(b)),
    };
    root.map(|r| r - Decimal::ONE).unwrap_or(Decimal::ZERO)
}

/// `ratio^(1/n)`: `powd` gives the estimate, Newton's method refines it in
/// exact decimal arithmetic until the step is negligible.
fn nth_root(ratio: Decimal, n: u32) -> Option<Decimal> {
    let n_dec = Decimal::from(n);
    let estimate = ratio
        .checked_powd(Decimal::ONE / n_dec)
        .filter(|x| *x > Decimal::ZERO)
        // Bernoulli bound: never below the root
        .unwrap_or_else(|| Decimal::ONE + (ratio - Decimal::ONE) / n_dec);

    let mut x = estimate;
    for _ in 0..CAGR_NEWTON_ITERATIONS {
        let Some(step) = newton_step(x, ratio, n) else {
            return Some(estimate);
        };
        let next = x - step;
        if next <= Decimal::ZERO {
            return Some(estimate);
        }
        x = next;
        if step.abs() <= CAGR_NEWTON_TOLERANCE {
            break;
        }
    }
    Some(x)
}

/// `(x^n - ratio) / (n * x^(n-1))`, or `None` if a power leaves decimal range.
fn newton_step(x: Decimal, ratio: Decimal, n: u32) -> Option<Decimal> {
    let mut x_pow_nm1 = Decimal::ONE;
    for _ in 1..n {
        x_pow_nm1 = x_pow_nm1.checked_mul(x)?;
    }
    let x_pow_n = x_pow_nm1.checked_mul(x)?;
    let denom = Decimal::from(n).checked_mul(x_pow_nm1)?;
    if denom.is_zero() {
        return None;
    }
    (x_pow_n - ratio).checked_div(denom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_divide_zero_denominator() {
        assert_eq!(safe_divide(dec!(10), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(safe_divide(dec!(10), dec!(4)), dec!(2.5));
    }

    #[test]
    fn test_safe_divide_saturates_out_of_range() {
        let tiny = dec!(0.0000000000000000000000000001);
        assert_eq!(safe_divide(dec!(1000), tiny), Decimal::MAX);
        assert_eq!(safe_divide(dec!(-1000), tiny), Decimal::MIN);
    }

    #[test]
    fn test_round_money_clamps_places() {
        assert_eq!(round_money(dec!(1.25), u32::MAX), dec!(1.25));
    }

    #[test]
    fn test_round_money_half_away_from_zero() {
        assert_eq!(round_money(dec!(40.285), 2), dec!(40.29));
        assert_eq!(round_money(dec!(-40.285), 2), dec!(-40.29));
        assert_eq!(round_money(dec!(174.01), 0), dec!(174));
    }

    #[test]
    fn test_within_tolerance_absolute_and_relative() {
        assert!(within_tolerance(dec!(644.01), dec!(644.01)));
        assert!(within_tolerance(dec!(0), dec!(0.0000005)));
        // 1e-7 relative on a large total
        assert!(within_tolerance(dec!(1000000000), dec!(1000000100)));
        assert!(!within_tolerance(dec!(100), dec!(100.01)));
    }

    #[test]
    fn test_relative_difference_both_zero() {
        assert_eq!(relative_difference(Decimal::ZERO, Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_cagr_constant_growth() {
        // 1000 -> 1331 over three years is exactly 10% a year
        let cagr = compute_cagr(dec!(1000), dec!(1331), 3);
        assert!((cagr - dec!(0.10)).abs() < dec!(0.0000001), "got {cagr}");
    }

    #[test]
    fn test_cagr_long_horizon_high_growth() {
        // 1.5^100 is far too large to raise the first guess to the 100th power
        let ending = dec!(1000) * dec!(1.5).powu(100);
        let cagr = compute_cagr(dec!(1000), ending, 100);
        assert!((cagr - dec!(0.5)).abs() < dec!(0.0001), "got {cagr}");
    }

    #[test]
    fn test_cagr_long_decline() {
        // Halving every year for 60 years
        let ending = dec!(1000) * dec!(0.5).powu(60);
        let cagr = compute_cagr(dec!(1000), ending, 60);
        assert!((cagr - dec!(-0.5)).abs() < dec!(0.000001), "got {cagr}");
    }

    #[test]
    fn test_cagr_short_decline() {
        let cagr = compute_cagr(dec!(1000), dec!(729), 3);
        assert!((cagr - dec!(-0.1)).abs() < dec!(0.0000001), "got {cagr}");
    }

    #[test]
    fn test_cagr_revenue_decayed_to_zero() {
        assert_eq!(compute_cagr(dec!(1000), Decimal::ZERO, 30), -Decimal::ONE);
    }

    #[test]
    fn test_cagr_degenerate_inputs() {
        assert_eq!(compute_cagr(dec!(0), dec!(100), 3), Decimal::ZERO);
        assert_eq!(compute_cagr(dec!(100), dec!(-5), 3), Decimal::ZERO);
        assert_eq!(compute_cagr(dec!(100), dec!(200), 0), Decimal::ZERO);
    }
}
