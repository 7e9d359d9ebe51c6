//! Common utility functions for refund calculations.

use rust_decimal::Decimal;

/// Rounds a decimal value to whole dollars using half-up rounding.
///
/// Values at exactly 0.50 round away from zero, following standard
/// financial rounding conventions.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use refund_core::calculations::common::round_to_dollar;
///
/// assert_eq!(round_to_dollar(dec!(8341.49)), dec!(8341));
/// assert_eq!(round_to_dollar(dec!(8341.50)), dec!(8342));
/// assert_eq!(round_to_dollar(dec!(-0.50)), dec!(-1)); // Away from zero
/// ```
pub fn round_to_dollar(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// Returns the maximum of two decimal values.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use refund_core::calculations::common::max;
///
/// assert_eq!(max(dec!(100.00), dec!(200.00)), dec!(200.00));
/// assert_eq!(max(dec!(-100.00), dec!(0)), dec!(0));
/// ```
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}
