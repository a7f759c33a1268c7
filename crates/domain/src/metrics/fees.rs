use crate::error::MathError;
use rust_decimal::Decimal;

const DAYS_PER_YEAR: Decimal = Decimal::from_parts(365, 0, 0, false, 0);
const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Annualized fee yield in percent.
/// APY = daily_fees * 365 / position_value * 100
pub fn fee_apy(daily_fees: Decimal, position_value: Decimal) -> Result<Decimal, MathError> {
    if position_value <= Decimal::ZERO {
        return Err(MathError::ZeroPositionValue);
    }
    daily_fees
        .checked_mul(DAYS_PER_YEAR)
        .and_then(|annual| annual.checked_div(position_value))
        .and_then(|ratio| ratio.checked_mul(HUNDRED))
        .ok_or(MathError::Overflow("fee apy"))
}

/// Fees a position earns per day from pro-rata distribution of pool volume.
/// daily = volume_24h * fee_fraction * share
///
/// `fee_fraction` is the pool fee as a fraction (0.003 for the 0.3% tier),
/// `share` the position's fraction of active liquidity.
pub fn daily_fee_estimate(
    volume_24h: Decimal,
    fee_fraction: Decimal,
    share: Decimal,
) -> Result<Decimal, MathError> {
    volume_24h
        .checked_mul(fee_fraction)
        .and_then(|fees| fees.checked_mul(share))
        .ok_or(MathError::Overflow("daily fee estimate"))
}

/// Pool-wide fee APR in percent, `None` when TVL is not positive.
pub fn pool_apr(volume_24h: Decimal, fee_fraction: Decimal, tvl: Decimal) -> Option<Decimal> {
    if tvl <= Decimal::ZERO {
        return None;
    }
    volume_24h
        .checked_mul(fee_fraction)?
        .checked_mul(DAYS_PER_YEAR)?
        .checked_div(tvl)?
        .checked_mul(HUNDRED)
}

/// 24h volume over TVL, `None` when TVL is not positive. Higher values mean
/// more trading per dollar locked.
pub fn volume_tvl_ratio(volume_24h: Decimal, tvl: Decimal) -> Option<Decimal> {
    if tvl <= Decimal::ZERO {
        return None;
    }
    volume_24h.checked_div(tvl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_fee_apy() {
        // $10/day on $3650 -> 100%
        assert_eq!(fee_apy(dec!(10), dec!(3650)).unwrap(), dec!(100));
        assert_eq!(fee_apy(Decimal::ZERO, dec!(1000)).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_fee_apy_zero_value_guard() {
        assert_eq!(
            fee_apy(dec!(10), Decimal::ZERO),
            Err(MathError::ZeroPositionValue)
        );
        assert_eq!(
            fee_apy(dec!(10), dec!(-5)),
            Err(MathError::ZeroPositionValue)
        );
    }

    #[test]
    fn test_daily_fee_estimate() {
        // 1M volume, 0.3% tier, 1% share -> $30
        let daily = daily_fee_estimate(dec!(1_000_000), dec!(0.003), dec!(0.01)).unwrap();
        assert_eq!(daily, dec!(30));
    }

    #[test]
    fn test_pool_apr() {
        // 1M * 0.003 * 365 / 10M * 100 = 10.95
        assert_eq!(
            pool_apr(dec!(1_000_000), dec!(0.003), dec!(10_000_000)),
            Some(dec!(10.95))
        );
        assert_eq!(pool_apr(dec!(1_000_000), dec!(0.003), Decimal::ZERO), None);
    }

    #[test]
    fn test_volume_tvl_ratio() {
        assert_eq!(
            volume_tvl_ratio(dec!(100_000_000), dec!(50_000_000)),
            Some(dec!(2))
        );
        assert_eq!(volume_tvl_ratio(dec!(1), Decimal::ZERO), None);
    }
}
