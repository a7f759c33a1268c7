use crate::error::MathError;
use crate::math::decimal_sqrt;
use crate::math::price_tick::check_tick;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

/// Sentinel returned for degenerate ranges whose efficiency is unbounded.
pub const CAPITAL_EFFICIENCY_CAP: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Capital efficiency of a `[price_lower, price_upper]` range compared to a
/// full-range position.
/// CE = 1 / (1 - sqrt(P_a / P_b))
///
/// A zero-width range returns [`CAPITAL_EFFICIENCY_CAP`] rather than infinity.
pub fn capital_efficiency(price_lower: Decimal, price_upper: Decimal) -> Result<Decimal, MathError> {
    if price_lower <= Decimal::ZERO {
        return Err(MathError::NonPositivePrice(price_lower));
    }
    if price_lower > price_upper {
        return Err(MathError::InvalidRange {
            lower: price_lower,
            upper: price_upper,
        });
    }
    if price_lower == price_upper {
        return Ok(CAPITAL_EFFICIENCY_CAP);
    }

    let ratio = price_lower
        .checked_div(price_upper)
        .ok_or(MathError::Overflow("capital efficiency"))?;
    let den = Decimal::ONE - decimal_sqrt(ratio)?;
    if den <= Decimal::ZERO {
        return Ok(CAPITAL_EFFICIENCY_CAP);
    }

    let ce = Decimal::ONE
        .checked_div(den)
        .ok_or(MathError::Overflow("capital efficiency"))?;
    Ok(ce.min(CAPITAL_EFFICIENCY_CAP))
}

/// Capital efficiency from tick bounds.
///
/// Same quantity as [`capital_efficiency`], but sqrt(P_a / P_b) is taken as
/// 1.0001 ^ ((tick_lower - tick_upper) / 2), so a full-range position whose
/// bound prices do not fit a decimal still yields a value near 1. Token
/// decimals cancel out of the ratio.
pub fn capital_efficiency_for_ticks(tick_lower: i32, tick_upper: i32) -> Result<Decimal, MathError> {
    let lower = check_tick(tick_lower as i64)?;
    let upper = check_tick(tick_upper as i64)?;
    if lower > upper {
        return Err(MathError::InvalidRange {
            lower: Decimal::from(lower),
            upper: Decimal::from(upper),
        });
    }
    if lower == upper {
        return Ok(CAPITAL_EFFICIENCY_CAP);
    }

    let sqrt_ratio = 1.0001f64.powf((lower - upper) as f64 / 2.0);
    let den = 1.0 - sqrt_ratio;
    if den <= 0.0 {
        return Ok(CAPITAL_EFFICIENCY_CAP);
    }
    let ce = Decimal::from_f64(1.0 / den).ok_or(MathError::Overflow("capital efficiency"))?;
    Ok(ce.min(CAPITAL_EFFICIENCY_CAP))
}
