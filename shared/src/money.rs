//! Money calculation utilities using rust_decimal for precision
//!
//! All monetary arithmetic is done using `Decimal` internally, then converted
//! to `f64` for storage/serialization, rounded to 2 decimal places.

use rust_decimal::prelude::*;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Convert an f64 amount to Decimal for arithmetic
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Round a Decimal amount to 2 decimal places, half-up
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Multiply a unit price by a quantity, returning a rounded f64 amount
#[inline]
pub fn line_total(unit_price: f64, quantity: i64) -> f64 {
    to_f64(to_decimal(unit_price) * Decimal::from(quantity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total_avoids_float_drift() {
        // 0.1 * 3 in plain f64 is 0.30000000000000004
        assert_eq!(line_total(0.1, 3), 0.3);
        assert_eq!(line_total(19.99, 3), 59.97);
    }

    #[test]
    fn test_to_f64_rounds_half_up() {
        let d = to_decimal(10.005);
        assert_eq!(to_f64(d), 10.01);
    }

    #[test]
    fn test_tolerance_value() {
        assert_eq!(MONEY_TOLERANCE, Decimal::new(1, 2));
    }

    #[test]
    fn test_round_money_kills_float_dust() {
        // 0.1 + 0.2 carried through f64 lands just above 0.30
        let noisy = to_decimal(0.1f64 + 0.2f64);
        assert_eq!(round_money(noisy), Decimal::new(30, 2));
    }
}
