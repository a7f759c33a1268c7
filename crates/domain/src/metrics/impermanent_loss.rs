use super::{FeesVersusLoss, ImpermanentLossEstimate};
use super::efficiency::capital_efficiency;
use crate::error::MathError;
use crate::math::concentrated_liquidity::amounts_for_liquidity;
use crate::math::{decimal_sqrt, decimal_to_f64, f64_to_decimal};
use rust_decimal::Decimal;

/// Calculates Impermanent Loss for a constant product pool.
/// formula: 2 * sqrt(price_ratio) / (1 + price_ratio) - 1
///
/// # Arguments
///
/// * `price_ratio` - current price / entry price
///
/// # Returns
///
/// * `Decimal` - The impermanent loss as a fraction (e.g., -0.05 for 5% loss).
///   `IL(r) == IL(1/r)`.
pub fn impermanent_loss(price_ratio: Decimal) -> Result<Decimal, MathError> {
    if price_ratio <= Decimal::ZERO {
        return Err(MathError::NonPositivePrice(price_ratio));
    }

    // The formula is symmetric in r and 1/r; evaluate on r >= 1 so both
    // directions share one rounding path.
    let mut r = decimal_to_f64(price_ratio)?;
    if r < 1.0 {
        r = 1.0 / r;
    }
    let il = 2.0 * r.sqrt() / (1.0 + r) - 1.0;
    f64_to_decimal(il)
}

/// Impermanent loss for a move from `entry_price` to `current_price`.
pub fn impermanent_loss_between(
    entry_price: Decimal,
    current_price: Decimal,
) -> Result<Decimal, MathError> {
    if entry_price <= Decimal::ZERO {
        return Err(MathError::NonPositivePrice(entry_price));
    }
    if current_price <= Decimal::ZERO {
        return Err(MathError::NonPositivePrice(current_price));
    }
    let ratio = current_price
        .checked_div(entry_price)
        .ok_or(MathError::Overflow("price ratio"))?;
    impermanent_loss(ratio)
}

/// Full-range loss amplified by the range's capital efficiency.
///
/// This is the usual quick estimate for a concentrated position; it is
/// floored at -1 since a position cannot lose more than its value.
pub fn impermanent_loss_v3(
    entry_price: Decimal,
    current_price: Decimal,
    price_lower: Decimal,
    price_upper: Decimal,
) -> Result<ImpermanentLossEstimate, MathError> {
    let v2 = impermanent_loss_between(entry_price, current_price)?;
    let price_ratio = current_price
        .checked_div(entry_price)
        .ok_or(MathError::Overflow("price ratio"))?;
    let ce = capital_efficiency(price_lower, price_upper)?;
    let amplified = v2
        .checked_mul(ce)
        .ok_or(MathError::Overflow("amplified impermanent loss"))?;

    Ok(ImpermanentLossEstimate {
        v2,
        v3: amplified.max(Decimal::NEGATIVE_ONE),
        capital_efficiency: ce,
        price_ratio,
    })
}

/// Calculates Impermanent Loss for a concentrated liquidity position.
/// This compares the value of the LP position at current_price vs holding the
/// assets deposited at entry_price.
pub fn impermanent_loss_concentrated(
    entry_price: Decimal,
    current_price: Decimal,
    price_lower: Decimal,
    price_upper: Decimal,
) -> Result<Decimal, MathError> {
    for p in [entry_price, current_price, price_lower] {
        if p <= Decimal::ZERO {
            return Err(MathError::NonPositivePrice(p));
        }
    }
    if price_lower >= price_upper {
        return Err(MathError::InvalidRange {
            lower: price_lower,
            upper: price_upper,
        });
    }

    // Arbitrary liquidity; only the ratio of the two valuations matters.
    let liquidity = 1_000_000_000_000u128;

    let sqrt_lower = decimal_sqrt(price_lower)?;
    let sqrt_upper = decimal_sqrt(price_upper)?;

    let (x0, y0) =
        amounts_for_liquidity(liquidity, decimal_sqrt(entry_price)?, sqrt_lower, sqrt_upper)?;
    let (x1, y1) =
        amounts_for_liquidity(liquidity, decimal_sqrt(current_price)?, sqrt_lower, sqrt_upper)?;

    let value = |x: Decimal, y: Decimal| {
        x.checked_mul(current_price)
            .and_then(|v| v.checked_add(y))
            .ok_or(MathError::Overflow("position value"))
    };
    let value_held = value(x0, y0)?;
    let value_lp = value(x1, y1)?;

    if value_held.is_zero() {
        return Ok(Decimal::ZERO);
    }
    Ok((value_lp - value_held) / value_held)
}

/// Weighs earned fees against the boundary losses of a position worth
/// `value_usd`. `il_at_lower` and `il_at_upper` are loss fractions.
pub fn fees_versus_loss(
    value_usd: Decimal,
    fees_usd: Decimal,
    il_at_lower: Decimal,
    il_at_upper: Decimal,
) -> Result<FeesVersusLoss, MathError> {
    let loss = |il: Decimal| {
        value_usd
            .checked_mul(il)
            .ok_or(MathError::Overflow("boundary loss"))
    };
    let loss_at_lower_usd = loss(il_at_lower)?;
    let loss_at_upper_usd = loss(il_at_upper)?;
    Ok(FeesVersusLoss {
        fees_usd,
        loss_at_lower_usd,
        loss_at_upper_usd,
        net_at_lower_usd: fees_usd
            .checked_add(loss_at_lower_usd)
            .ok_or(MathError::Overflow("boundary loss"))?,
        net_at_upper_usd: fees_usd
            .checked_add(loss_at_upper_usd)
            .ok_or(MathError::Overflow("boundary loss"))?,
    })
}
