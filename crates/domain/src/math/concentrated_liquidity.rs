use super::price_tick::{check_tick, tick_to_sqrt_price_f64};
use super::{Q96_F64, f64_to_decimal, u256_to_f64};
use crate::error::MathError;
use primitive_types::U256;
use rust_decimal::Decimal;
use rust_decimal::prelude::*;

fn ordered(sqrt_price_a: Decimal, sqrt_price_b: Decimal) -> (Decimal, Decimal) {
    if sqrt_price_a < sqrt_price_b {
        (sqrt_price_a, sqrt_price_b)
    } else {
        (sqrt_price_b, sqrt_price_a)
    }
}

fn liquidity_to_decimal(liquidity: u128) -> Result<Decimal, MathError> {
    Decimal::from_u128(liquidity).ok_or(MathError::Overflow("liquidity to decimal"))
}

fn require_positive(sqrt_price: Decimal) -> Result<(), MathError> {
    if sqrt_price <= Decimal::ZERO {
        return Err(MathError::NonPositivePrice(sqrt_price));
    }
    Ok(())
}

/// Calculates the raw amount of token0 (x) given liquidity and price range.
/// delta_x = L * (1/sqrt(P_a) - 1/sqrt(P_b))
/// where P_a < P_b
pub fn get_amount0_delta(
    liquidity: u128,
    sqrt_price_a: Decimal,
    sqrt_price_b: Decimal,
) -> Result<Decimal, MathError> {
    require_positive(sqrt_price_a)?;
    require_positive(sqrt_price_b)?;
    let (lower, upper) = ordered(sqrt_price_a, sqrt_price_b);

    // Reciprocals first: lower * upper underflows for full-range bounds.
    let inv_lower = Decimal::ONE
        .checked_div(lower)
        .ok_or(MathError::Overflow("amount0 delta"))?;
    let inv_upper = Decimal::ONE
        .checked_div(upper)
        .ok_or(MathError::Overflow("amount0 delta"))?;

    liquidity_to_decimal(liquidity)?
        .checked_mul(inv_lower - inv_upper)
        .ok_or(MathError::Overflow("amount0 delta"))
}

/// Calculates the raw amount of token1 (y) given liquidity and price range.
/// delta_y = L * (sqrt(P_b) - sqrt(P_a))
/// where P_a < P_b
pub fn get_amount1_delta(
    liquidity: u128,
    sqrt_price_a: Decimal,
    sqrt_price_b: Decimal,
) -> Result<Decimal, MathError> {
    require_positive(sqrt_price_a)?;
    require_positive(sqrt_price_b)?;
    let (lower, upper) = ordered(sqrt_price_a, sqrt_price_b);

    liquidity_to_decimal(liquidity)?
        .checked_mul(upper - lower)
        .ok_or(MathError::Overflow("amount1 delta"))
}

/// Calculates liquidity for a given raw amount of token0 and price range
/// L = amount0 * (sqrt(P_a) * sqrt(P_b)) / (sqrt(P_b) - sqrt(P_a))
pub fn get_liquidity_for_amount0(
    amount0: Decimal,
    sqrt_price_a: Decimal,
    sqrt_price_b: Decimal,
) -> Result<u128, MathError> {
    require_positive(sqrt_price_a)?;
    let (lower, upper) = ordered(sqrt_price_a, sqrt_price_b);

    let den = upper - lower;
    if den.is_zero() {
        return Err(MathError::InvalidRange { lower, upper });
    }

    let liquidity = amount0
        .checked_mul(lower)
        .and_then(|v| v.checked_mul(upper))
        .and_then(|v| v.checked_div(den))
        .ok_or(MathError::Overflow("liquidity for amount0"))?;
    liquidity
        .floor()
        .to_u128()
        .ok_or(MathError::Overflow("liquidity for amount0"))
}

/// Calculates liquidity for a given raw amount of token1 and price range
/// L = amount1 / (sqrt(P_b) - sqrt(P_a))
pub fn get_liquidity_for_amount1(
    amount1: Decimal,
    sqrt_price_a: Decimal,
    sqrt_price_b: Decimal,
) -> Result<u128, MathError> {
    let (lower, upper) = ordered(sqrt_price_a, sqrt_price_b);

    let den = upper - lower;
    if den.is_zero() {
        return Err(MathError::InvalidRange { lower, upper });
    }

    let liquidity = amount1
        .checked_div(den)
        .ok_or(MathError::Overflow("liquidity for amount1"))?;
    liquidity
        .floor()
        .to_u128()
        .ok_or(MathError::Overflow("liquidity for amount1"))
}

/// Liquidity supplied by `amount0` and `amount1` over a range.
///
/// Below the range only token0 counts, above it only token1; inside the
/// range the position is bounded by whichever side is scarcer, so the result
/// is the minimum of the two single-sided liquidities.
pub fn liquidity_from_amounts(
    sqrt_price: Decimal,
    sqrt_price_lower: Decimal,
    sqrt_price_upper: Decimal,
    amount0: Decimal,
    amount1: Decimal,
) -> Result<u128, MathError> {
    require_positive(sqrt_price)?;
    require_positive(sqrt_price_lower)?;
    if sqrt_price_lower >= sqrt_price_upper {
        return Err(MathError::InvalidRange {
            lower: sqrt_price_lower,
            upper: sqrt_price_upper,
        });
    }

    if sqrt_price <= sqrt_price_lower {
        get_liquidity_for_amount0(amount0, sqrt_price_lower, sqrt_price_upper)
    } else if sqrt_price < sqrt_price_upper {
        let l0 = get_liquidity_for_amount0(amount0, sqrt_price, sqrt_price_upper)?;
        let l1 = get_liquidity_for_amount1(amount1, sqrt_price_lower, sqrt_price)?;
        Ok(l0.min(l1))
    } else {
        get_liquidity_for_amount1(amount1, sqrt_price_lower, sqrt_price_upper)
    }
}

/// Raw token amounts held by `liquidity` at the current price.
///
/// Inverse of [`liquidity_from_amounts`]: all token0 below the range, all
/// token1 above it, a mix in between.
pub fn amounts_for_liquidity(
    liquidity: u128,
    sqrt_price: Decimal,
    sqrt_price_lower: Decimal,
    sqrt_price_upper: Decimal,
) -> Result<(Decimal, Decimal), MathError> {
    require_positive(sqrt_price)?;
    if sqrt_price_lower >= sqrt_price_upper {
        return Err(MathError::InvalidRange {
            lower: sqrt_price_lower,
            upper: sqrt_price_upper,
        });
    }
    if liquidity == 0 {
        return Ok((Decimal::ZERO, Decimal::ZERO));
    }

    if sqrt_price <= sqrt_price_lower {
        let amount0 = get_amount0_delta(liquidity, sqrt_price_lower, sqrt_price_upper)?;
        Ok((amount0, Decimal::ZERO))
    } else if sqrt_price < sqrt_price_upper {
        let amount0 = get_amount0_delta(liquidity, sqrt_price, sqrt_price_upper)?;
        let amount1 = get_amount1_delta(liquidity, sqrt_price_lower, sqrt_price)?;
        Ok((amount0, amount1))
    } else {
        let amount1 = get_amount1_delta(liquidity, sqrt_price_lower, sqrt_price_upper)?;
        Ok((Decimal::ZERO, amount1))
    }
}

/// Human token amounts held by `liquidity` at `sqrt_price_x96`, each already
/// divided by its token's decimals.
///
/// Raw amounts routinely exceed a decimal mantissa (a trillion 18-decimal
/// tokens is 1e30 units, and liquidity is a full `u128`), so the region math
/// runs in `f64` and only the scaled result becomes a [`Decimal`]. Raw amounts
/// are floored to whole units as the pool does when paying out.
pub fn token_amounts(
    liquidity: u128,
    sqrt_price_x96: U256,
    tick_lower: i32,
    tick_upper: i32,
    decimals0: u8,
    decimals1: u8,
) -> Result<(Decimal, Decimal), MathError> {
    let lower = check_tick(tick_lower as i64)?;
    let upper = check_tick(tick_upper as i64)?;
    if lower >= upper {
        return Err(MathError::InvalidRange {
            lower: Decimal::from(lower),
            upper: Decimal::from(upper),
        });
    }
    if sqrt_price_x96.is_zero() {
        return Err(MathError::NonPositivePrice(Decimal::ZERO));
    }
    if liquidity == 0 {
        return Ok((Decimal::ZERO, Decimal::ZERO));
    }

    let sqrt_price = u256_to_f64(sqrt_price_x96) / Q96_F64;
    let sqrt_lower = tick_to_sqrt_price_f64(lower)?;
    let sqrt_upper = tick_to_sqrt_price_f64(upper)?;
    let l = liquidity as f64;

    let (raw0, raw1) = if sqrt_price <= sqrt_lower {
        (l * (1.0 / sqrt_lower - 1.0 / sqrt_upper), 0.0)
    } else if sqrt_price < sqrt_upper {
        (
            l * (1.0 / sqrt_price - 1.0 / sqrt_upper),
            l * (sqrt_price - sqrt_lower),
        )
    } else {
        (0.0, l * (sqrt_upper - sqrt_lower))
    };

    Ok((
        scale_amount(raw0, decimals0, "amount0")?,
        scale_amount(raw1, decimals1, "amount1")?,
    ))
}

fn scale_amount(raw: f64, decimals: u8, what: &'static str) -> Result<Decimal, MathError> {
    if !raw.is_finite() {
        return Err(MathError::Overflow(what));
    }
    let whole = raw.floor();
    if whole <= 0.0 {
        return Ok(Decimal::ZERO);
    }
    if decimals > 28 {
        return Err(MathError::Overflow(what));
    }
    f64_to_decimal(whole / 10f64.powi(decimals as i32)).map_err(|_| MathError::Overflow(what))
}
