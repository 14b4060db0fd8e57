//! Fixed-point decimal arithmetic for amount calculations.
//!
//! Amounts are integers (`u128` for balances, `i128` for net counters) and
//! prices, ratios and fees are [`Decimal`]. Every conversion back to an
//! amount names its rounding direction explicitly: [`round_amount`] rounds
//! half to even, [`truncate_amount`] rounds toward zero, [`ceil_amount`]
//! rounds up.

use crate::error::{Error, Result};
use num_traits::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

// ═══════════════════════════════════════════════════════════════════════════════
// CONVERSIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Convert an unsigned amount to a decimal
pub fn to_dec(amount: u128) -> Result<Decimal> {
    Decimal::from_u128(amount).ok_or(Error::Overflow {
        operation: format!("decimal({})", amount),
    })
}

/// Convert a signed net counter to a decimal
pub fn signed_to_dec(amount: i128) -> Result<Decimal> {
    Decimal::from_i128(amount).ok_or(Error::Overflow {
        operation: format!("decimal({})", amount),
    })
}

/// Widen an unsigned amount into a signed net counter
pub fn to_signed(amount: u128) -> Result<i128> {
    i128::try_from(amount).map_err(|_| Error::Overflow {
        operation: format!("i128({})", amount),
    })
}

fn to_amount(value: Decimal, operation: &str) -> Result<u128> {
    // Rounding a value in (-1, 0) yields negative zero, which to_u128 rejects
    if value.is_zero() {
        return Ok(0);
    }
    if value.is_sign_negative() {
        return Err(Error::Underflow {
            operation: format!("{}({})", operation, value),
        });
    }
    value.to_u128().ok_or(Error::Overflow {
        operation: format!("{}({})", operation, value),
    })
}

/// Round to the nearest integer amount, half to even
pub fn round_amount(value: Decimal) -> Result<u128> {
    to_amount(value.round(), "round")
}

/// Round toward zero
pub fn truncate_amount(value: Decimal) -> Result<u128> {
    to_amount(value.trunc(), "truncate")
}

/// Round up to the next integer amount
pub fn ceil_amount(value: Decimal) -> Result<u128> {
    to_amount(value.ceil(), "ceil")
}

/// Round up into a signed integer; used for values that may be negative
pub fn ceil_signed(value: Decimal) -> Result<i128> {
    value.ceil().to_i128().ok_or(Error::Overflow {
        operation: format!("ceil({})", value),
    })
}

/// Round toward zero into a signed integer
pub fn truncate_signed(value: Decimal) -> Result<i128> {
    value.trunc().to_i128().ok_or(Error::Overflow {
        operation: format!("truncate({})", value),
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// CHECKED DECIMAL OPERATIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Multiplication with overflow check
pub fn dec_mul(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_mul(b).ok_or(Error::Overflow {
        operation: format!("{} * {}", a, b),
    })
}

/// Division with zero and overflow checks
pub fn dec_div(a: Decimal, b: Decimal) -> Result<Decimal> {
    if b.is_zero() {
        return Err(Error::InvalidParameter {
            name: "divisor".into(),
            reason: "division by zero".into(),
        });
    }
    a.checked_div(b).ok_or(Error::Overflow {
        operation: format!("{} / {}", a, b),
    })
}

/// `ceil(numerator / denominator)` as an amount.
///
/// Used for amounts owed to the protocol so the user is never under-charged.
/// The denominator must be positive.
pub fn quo_round_up(numerator: Decimal, denominator: Decimal) -> Result<u128> {
    if denominator <= Decimal::ZERO {
        return Err(Error::InvalidParameter {
            name: "denominator".into(),
            reason: format!("must be positive, got {}", denominator),
        });
    }
    ceil_amount(dec_div(numerator, denominator)?)
}

/// `trunc(numerator / denominator)` as an amount.
///
/// Used for amounts paid out by the protocol so it never over-pays.
pub fn quo_truncate(numerator: Decimal, denominator: Decimal) -> Result<u128> {
    if denominator <= Decimal::ZERO {
        return Err(Error::InvalidParameter {
            name: "denominator".into(),
            reason: format!("must be positive, got {}", denominator),
        });
    }
    truncate_amount(dec_div(numerator, denominator)?)
}

// ═══════════════════════════════════════════════════════════════════════════════
// SAFE AMOUNT ARITHMETIC
// ═══════════════════════════════════════════════════════════════════════════════

/// Safe addition with overflow check
pub fn safe_add(a: u128, b: u128) -> Result<u128> {
    a.checked_add(b).ok_or(Error::Overflow {
        operation: format!("{} + {}", a, b),
    })
}

/// Safe subtraction with underflow check
pub fn safe_sub(a: u128, b: u128) -> Result<u128> {
    a.checked_sub(b).ok_or(Error::Underflow {
        operation: format!("{} - {}", a, b),
    })
}

/// Add an unsigned delta to a signed net counter
pub fn signed_add(counter: i128, delta: u128) -> Result<i128> {
    counter.checked_add(to_signed(delta)?).ok_or(Error::Overflow {
        operation: format!("{} + {}", counter, delta),
    })
}

/// Subtract an unsigned delta from a signed net counter; may go negative
pub fn signed_sub(counter: i128, delta: u128) -> Result<i128> {
    counter.checked_sub(to_signed(delta)?).ok_or(Error::Underflow {
        operation: format!("{} - {}", counter, delta),
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// FEES
// ═══════════════════════════════════════════════════════════════════════════════

/// Fee on `amount` at an optional rate; an absent rate charges nothing.
///
/// The fee is rounded half to even.
pub fn compute_fee(amount: u128, rate: Option<Decimal>) -> Result<u128> {
    match rate {
        Some(rate) if !rate.is_zero() => round_amount(dec_mul(to_dec(amount)?, rate)?),
        _ => Ok(0),
    }
}

/// Rate value with the absent case read as zero
pub fn rate_or_zero(rate: Option<Decimal>) -> Decimal {
    rate.unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_rounding_directions() {
        assert_eq!(round_amount(dec!(2.5)).unwrap(), 2);
        assert_eq!(round_amount(dec!(3.5)).unwrap(), 4);
        assert_eq!(round_amount(dec!(3.4)).unwrap(), 3);
        assert_eq!(truncate_amount(dec!(3.99)).unwrap(), 3);
        assert_eq!(ceil_amount(dec!(3.01)).unwrap(), 4);
        assert_eq!(ceil_amount(dec!(3)).unwrap(), 3);
    }

    #[test]
    fn test_negative_amount_rejected() {
        assert!(matches!(truncate_amount(dec!(-1)), Err(Error::Underflow { .. })));
        assert_eq!(truncate_amount(dec!(-0.5)).unwrap(), 0);
        assert_eq!(round_amount(dec!(-0.4)).unwrap(), 0);
        assert_eq!(ceil_amount(dec!(-0.9)).unwrap(), 0);
        assert!(matches!(round_amount(dec!(-0.6)), Err(Error::Underflow { .. })));
    }

    #[test]
    fn test_quo_rounding() {
        assert_eq!(quo_round_up(dec!(10), dec!(3)).unwrap(), 4);
        assert_eq!(quo_truncate(dec!(10), dec!(3)).unwrap(), 3);
        assert_eq!(quo_round_up(dec!(9), dec!(3)).unwrap(), 3);
        assert!(quo_round_up(dec!(1), Decimal::ZERO).is_err());
        assert!(quo_truncate(dec!(1), dec!(-1)).is_err());
    }

    #[test]
    fn test_safe_arithmetic() {
        assert!(safe_add(1, 2).is_ok());
        assert!(safe_add(u128::MAX, 1).is_err());

        assert!(safe_sub(5, 3).is_ok());
        assert!(safe_sub(3, 5).is_err());

        assert_eq!(signed_sub(3, 5).unwrap(), -2);
        assert_eq!(signed_add(-2, 5).unwrap(), 3);
        assert!(to_signed(u128::MAX).is_err());
    }

    #[test]
    fn test_compute_fee() {
        assert_eq!(compute_fee(100_000_000, Some(dec!(0.001))).unwrap(), 100_000);
        assert_eq!(compute_fee(100_000_000, None).unwrap(), 0);
        assert_eq!(compute_fee(100_000_000, Some(Decimal::ZERO)).unwrap(), 0);
        // 1500 * 0.001 = 1.5 rounds to even
        assert_eq!(compute_fee(1_500, Some(dec!(0.001))).unwrap(), 2);
        assert_eq!(compute_fee(2_500, Some(dec!(0.001))).unwrap(), 2);
    }

    #[test]
    fn test_signed_conversions() {
        assert_eq!(signed_to_dec(-5).unwrap(), dec!(-5));
        assert_eq!(ceil_signed(dec!(-1.5)).unwrap(), -1);
        assert_eq!(truncate_signed(dec!(-1.5)).unwrap(), -1);
        assert_eq!(ceil_signed(dec!(1.2)).unwrap(), 2);
    }
}
