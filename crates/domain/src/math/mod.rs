//! Tick, price and liquidity math for concentrated liquidity pools.
//!
//! Prices and amounts are exposed as [`Decimal`]. Transcendental steps
//! (powers, logarithms, square roots) run in `f64` and are converted back with
//! an explicit bounds check, so a value that cannot be represented surfaces as
//! [`MathError::PriceOutOfBounds`] instead of being silently truncated.

use crate::error::MathError;
use primitive_types::U256;
use rust_decimal::Decimal;
use rust_decimal::prelude::*;

/// Liquidity-to-token-amount conversions.
pub mod concentrated_liquidity;
/// Tick and price conversions.
pub mod price_tick;

/// 2^96 as a float, the denominator of `sqrtPriceX96`.
pub const Q96_F64: f64 = 79_228_162_514_264_337_593_543_950_336.0;

/// Converts an unsigned 256-bit integer to the nearest `f64`.
pub fn u256_to_f64(value: U256) -> f64 {
    const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;
    value
        .0
        .iter()
        .rev()
        .fold(0.0, |acc, limb| acc * TWO_POW_64 + *limb as f64)
}

/// Converts a float to a decimal, rejecting NaN, infinities and values that
/// would round to zero although they are not.
pub fn f64_to_decimal(value: f64) -> Result<Decimal, MathError> {
    if !value.is_finite() {
        return Err(MathError::PriceOutOfBounds);
    }
    let decimal = Decimal::from_f64(value).ok_or(MathError::PriceOutOfBounds)?;
    if decimal.is_zero() && value != 0.0 {
        return Err(MathError::PriceOutOfBounds);
    }
    Ok(decimal)
}

pub(crate) fn decimal_to_f64(value: Decimal) -> Result<f64, MathError> {
    value.to_f64().ok_or(MathError::Overflow("decimal to f64"))
}

/// Square root of a non-negative decimal.
pub fn decimal_sqrt(value: Decimal) -> Result<Decimal, MathError> {
    if value.is_sign_negative() {
        return Err(MathError::NonPositivePrice(value));
    }
    if value.is_zero() {
        return Ok(Decimal::ZERO);
    }
    f64_to_decimal(decimal_to_f64(value)?.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u256_to_f64() {
        assert_eq!(u256_to_f64(U256::zero()), 0.0);
        assert_eq!(u256_to_f64(U256::from(12345u64)), 12345.0);
        let q96 = U256::one() << 96;
        assert_eq!(u256_to_f64(q96), Q96_F64);
    }

    #[test]
    fn test_f64_to_decimal_rejects_non_finite() {
        assert_eq!(f64_to_decimal(f64::NAN), Err(MathError::PriceOutOfBounds));
        assert_eq!(
            f64_to_decimal(f64::INFINITY),
            Err(MathError::PriceOutOfBounds)
        );
        assert_eq!(f64_to_decimal(1e40), Err(MathError::PriceOutOfBounds));
    }

    #[test]
    fn test_decimal_sqrt() {
        assert_eq!(decimal_sqrt(Decimal::from(16)).unwrap(), Decimal::from(4));
        assert_eq!(decimal_sqrt(Decimal::ZERO).unwrap(), Decimal::ZERO);
        assert!(decimal_sqrt(Decimal::from(-1)).is_err());
    }
}
