use super::RangeProximity;
use crate::enums::RangeStrategy;
use crate::error::MathError;
use rust_decimal::Decimal;

fn check_inputs(current: Decimal, lower: Decimal, upper: Decimal) -> Result<(), MathError> {
    if current <= Decimal::ZERO {
        return Err(MathError::NonPositivePrice(current));
    }
    if lower <= Decimal::ZERO {
        return Err(MathError::NonPositivePrice(lower));
    }
    if upper <= lower {
        return Err(MathError::InvalidRange { lower, upper });
    }
    Ok(())
}

/// Range width as a percentage of the current price.
/// width = (upper - lower) / current * 100
pub fn range_width_pct(current: Decimal, lower: Decimal, upper: Decimal) -> Result<Decimal, MathError> {
    check_inputs(current, lower, upper)?;
    (upper - lower)
        .checked_div(current)
        .and_then(|w| w.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or(MathError::Overflow("range width"))
}

/// How far the current price sits from each range boundary.
pub fn range_proximity(
    current: Decimal,
    lower: Decimal,
    upper: Decimal,
) -> Result<RangeProximity, MathError> {
    check_inputs(current, lower, upper)?;
    let pct = |num: Decimal, den: Decimal| {
        num.checked_div(den)
            .and_then(|v| v.checked_mul(Decimal::ONE_HUNDRED))
            .ok_or(MathError::Overflow("range proximity"))
    };

    let in_range = lower <= current && current <= upper;
    let position_in_range_pct = if in_range {
        pct(current - lower, upper - lower)?
    } else {
        Decimal::ZERO
    };

    Ok(RangeProximity {
        in_range,
        downside_buffer_pct: pct(current - lower, current)?,
        upside_buffer_pct: pct(upper - current, current)?,
        position_in_range_pct,
    })
}

/// Buckets a range by its width relative to the current price:
/// 80% and wider is conservative, 40% and wider moderate, anything
/// tighter aggressive.
pub fn classify_strategy(
    current: Decimal,
    lower: Decimal,
    upper: Decimal,
) -> Result<RangeStrategy, MathError> {
    let width = range_width_pct(current, lower, upper)?;
    Ok(if width >= Decimal::from(80) {
        RangeStrategy::Conservative
    } else if width >= Decimal::from(40) {
        RangeStrategy::Moderate
    } else {
        RangeStrategy::Aggressive
    })
}
