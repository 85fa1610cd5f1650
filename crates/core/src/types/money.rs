//! Decimal money helpers.
//!
//! Amounts are carried as [`Decimal`] in the currency's standard unit
//! (dollars, not cents). Payment processors want integer minor units, and the
//! product feed sends prices as either JSON numbers or strings; both
//! conversions live here.
//!
//! Stored prices and order totals are `NUMERIC(12, 2)`: whole cents, at most
//! [`MAX_STORED_AMOUNT`].

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;
use thiserror::Error;

/// Largest amount a `NUMERIC(12, 2)` column holds.
/// 9_999_999_999.99, i.e. mantissa 999_999_999_999 (0xE8_D4A5_0FFF) at scale 2.
pub const MAX_STORED_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2);

/// An amount that cannot be stored as a price or total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("must not be negative")]
    Negative,

    #[error("must be at most {max}", max = MAX_STORED_AMOUNT)]
    TooLarge,
}

/// Round `amount` to whole cents (half away from zero) and check it fits
/// price storage.
///
/// # Errors
///
/// Returns `AmountError::Negative` below zero and `AmountError::TooLarge`
/// above [`MAX_STORED_AMOUNT`].
pub fn to_stored_amount(amount: Decimal) -> Result<Decimal, AmountError> {
    if amount < Decimal::ZERO {
        return Err(AmountError::Negative);
    }
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if rounded > MAX_STORED_AMOUNT {
        return Err(AmountError::TooLarge);
    }
    Ok(rounded)
}

/// Convert a standard-unit amount to minor units (cents), rounding half away
/// from zero.
///
/// Returns `None` if the result does not fit in an `i64`, including amounts
/// too large to scale by 100 at all.
///
/// ```
/// use cc_automotive_core::to_minor_units;
/// use rust_decimal::Decimal;
///
/// assert_eq!(to_minor_units(Decimal::new(2999, 2)), Some(2999));
/// assert_eq!(to_minor_units(Decimal::new(10005, 3)), Some(1001));
/// ```
#[must_use]
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    amount
        .checked_mul(Decimal::ONE_HUNDRED)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// Coerce a loosely typed JSON price into a decimal.
///
/// Accepts JSON numbers and numeric strings (surrounding whitespace and a
/// leading `$` are tolerated). Anything else yields `None`.
#[must_use]
pub fn parse_amount(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
        }
        Value::String(s) => {
            let trimmed = s.trim();
            let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed);
            Decimal::from_str(trimmed).ok()
        }
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minor_units_rounds_half_away_from_zero() {
        assert_eq!(to_minor_units(Decimal::new(12345, 3)), Some(1235));
        assert_eq!(to_minor_units(Decimal::new(12344, 3)), Some(1234));
        assert_eq!(to_minor_units(Decimal::ZERO), Some(0));
    }

    #[test]
    fn test_minor_units_out_of_range() {
        let huge = Decimal::from_str("1000000000000000000000000000").unwrap();
        assert_eq!(to_minor_units(huge), None);
        assert_eq!(to_minor_units(Decimal::MAX), None);
        assert_eq!(to_minor_units(Decimal::from(i64::MAX)), None);
    }

    #[test]
    fn test_stored_amount_rounds_to_cents() {
        assert_eq!(to_stored_amount(Decimal::new(29999, 3)), Ok(Decimal::new(3000, 2)));
        assert_eq!(to_stored_amount(Decimal::new(2999, 2)), Ok(Decimal::new(2999, 2)));
        assert_eq!(to_stored_amount(Decimal::ZERO), Ok(Decimal::ZERO));
    }

    #[test]
    fn test_stored_amount_bounds() {
        assert_eq!(to_stored_amount(MAX_STORED_AMOUNT), Ok(MAX_STORED_AMOUNT));
        assert_eq!(
            to_stored_amount(Decimal::from(10_000_000_000_i64)),
            Err(AmountError::TooLarge)
        );
        // rounds up past the column bound
        assert_eq!(
            to_stored_amount(Decimal::new(9_999_999_999_995, 3)),
            Err(AmountError::TooLarge)
        );
        assert_eq!(to_stored_amount(Decimal::new(-1, 2)), Err(AmountError::Negative));
        assert_eq!(
            AmountError::TooLarge.to_string(),
            "must be at most 9999999999.99"
        );
    }

    #[test]
    fn test_parse_amount_from_number_and_string() {
        assert_eq!(parse_amount(&json!(29.99)), Some(Decimal::new(2999, 2)));
        assert_eq!(parse_amount(&json!(15)), Some(Decimal::from(15)));
        assert_eq!(parse_amount(&json!("29.99")), Some(Decimal::new(2999, 2)));
        assert_eq!(parse_amount(&json!(" $4.50 ")), Some(Decimal::new(450, 2)));
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert_eq!(parse_amount(&json!("call for price")), None);
        assert_eq!(parse_amount(&json!(null)), None);
        assert_eq!(parse_amount(&json!({"amount": 1})), None);
    }
}
