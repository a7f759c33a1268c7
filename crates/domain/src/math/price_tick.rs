use super::{Q96_F64, decimal_to_f64, f64_to_decimal, u256_to_f64};
use crate::error::MathError;
use primitive_types::U256;
use rust_decimal::Decimal;
use rust_decimal::prelude::*;

/// Lowest tick a pool can hold.
pub const MIN_TICK: i32 = -887_272;
/// Highest tick a pool can hold.
pub const MAX_TICK: i32 = 887_272;

const TICK_BASE: f64 = 1.0001;
// Keeps floor() from dropping a tick when the log lands a hair below an integer.
const TICK_EPSILON: f64 = 1e-9;

/// Rejects ticks outside `[MIN_TICK, MAX_TICK]`.
pub fn check_tick(tick: i64) -> Result<i32, MathError> {
    if tick < MIN_TICK as i64 || tick > MAX_TICK as i64 {
        return Err(MathError::TickOutOfRange(tick));
    }
    Ok(tick as i32)
}

fn decimals_factor(decimals0: u8, decimals1: u8) -> f64 {
    10f64.powi(decimals0 as i32 - decimals1 as i32)
}

/// Returns the human price of token0 in token1 for a tick.
/// P = 1.0001 ^ tick * 10 ^ (decimals0 - decimals1)
///
/// Ticks outside the valid range are an error, never clamped. A price too
/// large or too small for [`Decimal`] is [`MathError::PriceOutOfBounds`].
pub fn tick_to_price(tick: i32, decimals0: u8, decimals1: u8) -> Result<Decimal, MathError> {
    let tick = check_tick(tick as i64)?;
    let raw = TICK_BASE.powf(tick as f64);
    f64_to_decimal(raw * decimals_factor(decimals0, decimals1))
}

/// Returns the tick whose price is the greatest one not above `price`.
/// tick = floor(log_1.0001(P / 10 ^ (decimals0 - decimals1)))
pub fn price_to_tick(price: Decimal, decimals0: u8, decimals1: u8) -> Result<i32, MathError> {
    if price <= Decimal::ZERO {
        return Err(MathError::NonPositivePrice(price));
    }
    let raw = decimal_to_f64(price)? / decimals_factor(decimals0, decimals1);
    let tick = (raw.ln() / TICK_BASE.ln() + TICK_EPSILON).floor();
    if !tick.is_finite() {
        return Err(MathError::PriceOutOfBounds);
    }
    check_tick(tick as i64)
}

/// Square root of the raw (undecimaled) price at a tick: 1.0001 ^ (tick / 2).
pub fn tick_to_sqrt_price(tick: i32) -> Result<Decimal, MathError> {
    f64_to_decimal(tick_to_sqrt_price_f64(tick)?)
}

pub(crate) fn tick_to_sqrt_price_f64(tick: i32) -> Result<f64, MathError> {
    let tick = check_tick(tick as i64)?;
    Ok(TICK_BASE.powf(tick as f64 / 2.0))
}

/// Converts a Q64.96 `sqrtPriceX96` into the raw square-root price.
pub fn sqrt_price_x96_to_sqrt_price(sqrt_price_x96: U256) -> Result<Decimal, MathError> {
    if sqrt_price_x96.is_zero() {
        return Err(MathError::NonPositivePrice(Decimal::ZERO));
    }
    f64_to_decimal(u256_to_f64(sqrt_price_x96) / Q96_F64)
}

/// Converts a Q64.96 `sqrtPriceX96` into the human price of token0 in token1.
/// P = (sqrtPriceX96 / 2^96) ^ 2 * 10 ^ (decimals0 - decimals1)
pub fn sqrt_price_x96_to_price(
    sqrt_price_x96: U256,
    decimals0: u8,
    decimals1: u8,
) -> Result<Decimal, MathError> {
    if sqrt_price_x96.is_zero() {
        return Err(MathError::NonPositivePrice(Decimal::ZERO));
    }
    let sqrt = u256_to_f64(sqrt_price_x96) / Q96_F64;
    f64_to_decimal(sqrt * sqrt * decimals_factor(decimals0, decimals1))
}
