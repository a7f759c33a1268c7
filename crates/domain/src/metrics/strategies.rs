use super::efficiency::capital_efficiency;
use crate::enums::RangeStrategy;
use crate::error::MathError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Annual volatility assumed when none is supplied (50%).
pub const DEFAULT_VOLATILITY: Decimal = dec!(0.5);
/// Capital a suggestion is sized for when the position's USD value is unknown.
pub const DEFAULT_CAPITAL_USD: Decimal = dec!(10000);
/// Yield assumed per unit of capital efficiency above 2x when no pool APR is
/// known: apr = 5% * CE / 2.
const BASE_YIELD_PCT: Decimal = dec!(5);

/// Inputs for [`generate_strategies`].
#[derive(Debug, Clone, Default)]
pub struct StrategyInputs {
    /// Token0 priced in token1.
    pub current_price: Decimal,
    /// Annual volatility as a fraction; [`DEFAULT_VOLATILITY`] when `None`.
    pub volatility: Option<Decimal>,
    /// Fee APR in percent the current position or pool earns.
    pub pool_apr_pct: Option<Decimal>,
    /// Capital efficiency of the position the suggestions are compared with.
    pub current_ce: Option<Decimal>,
    /// USD value to size the suggestions; [`DEFAULT_CAPITAL_USD`] when `None`.
    pub position_value_usd: Option<Decimal>,
}

/// A suggested range around the current price with projected fee income.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySuggestion {
    pub strategy: RangeStrategy,
    /// Half-width of the range as a percentage of the current price.
    pub range_width_pct: Decimal,
    pub lower_price: Decimal,
    pub upper_price: Decimal,
    pub capital_efficiency: Decimal,
    pub investment_usd: Decimal,
    /// Half the investment held as token0.
    pub token0_amount: Decimal,
    /// Half the investment held as token1.
    pub token1_amount: Decimal,
    pub apr_estimate_pct: Decimal,
    pub daily_fees_usd: Decimal,
    pub weekly_fees_usd: Decimal,
    pub monthly_fees_usd: Decimal,
    pub annual_fees_usd: Decimal,
}

/// Width multiplier of volatility and the cap on the resulting half-width,
/// both in percent.
fn width_rule(strategy: RangeStrategy) -> (Decimal, Decimal) {
    match strategy {
        RangeStrategy::Conservative => (dec!(1.6), dec!(80)),
        RangeStrategy::Moderate => (dec!(1.0), dec!(50)),
        RangeStrategy::Aggressive => (dec!(0.4), dec!(20)),
    }
}

/// Conservative, moderate and aggressive ranges centred on the current price.
///
/// Half-widths scale with volatility (160%, 100% and 40% of it, capped at 80%,
/// 50% and 20%). With a known APR each suggestion's APR is scaled by
/// `strategy_CE / current_CE`, fees being proportional to concentrated
/// liquidity; without one it falls back to `5% * CE / 2`.
pub fn generate_strategies(inputs: &StrategyInputs) -> Result<Vec<StrategySuggestion>, MathError> {
    let price = inputs.current_price;
    if price <= Decimal::ZERO {
        return Err(MathError::NonPositivePrice(price));
    }
    let volatility = inputs.volatility.unwrap_or(DEFAULT_VOLATILITY);
    if volatility <= Decimal::ZERO {
        return Err(MathError::NonPositive("volatility"));
    }
    let vol_pct = volatility * Decimal::ONE_HUNDRED;
    let investment = inputs
        .position_value_usd
        .filter(|v| *v > Decimal::ZERO)
        .unwrap_or(DEFAULT_CAPITAL_USD);
    let overflow = || MathError::Overflow("strategy projection");

    [
        RangeStrategy::Conservative,
        RangeStrategy::Moderate,
        RangeStrategy::Aggressive,
    ]
    .into_iter()
    .map(|strategy| -> Result<StrategySuggestion, MathError> {
        let (multiplier, cap) = width_rule(strategy);
        let range_width_pct = vol_pct.checked_mul(multiplier).ok_or_else(overflow)?.min(cap);
        let width = range_width_pct / Decimal::ONE_HUNDRED;
        let lower_price = price.checked_mul(Decimal::ONE - width).ok_or_else(overflow)?;
        let upper_price = price.checked_mul(Decimal::ONE + width).ok_or_else(overflow)?;
        let ce = capital_efficiency(lower_price, upper_price)?;

        let apr_estimate_pct = match inputs.pool_apr_pct.filter(|apr| *apr > Decimal::ZERO) {
            Some(apr) => {
                let baseline = inputs
                    .current_ce
                    .filter(|c| *c > Decimal::ZERO)
                    .unwrap_or_else(|| ce.max(Decimal::ONE))
                    .max(Decimal::ONE);
                apr.checked_mul(ce)
                    .and_then(|v| v.checked_div(baseline))
                    .ok_or_else(overflow)?
            }
            None => BASE_YIELD_PCT.checked_mul(ce).ok_or_else(overflow)? / Decimal::TWO,
        };

        let annual = investment
            .checked_mul(apr_estimate_pct)
            .ok_or_else(overflow)?
            / Decimal::ONE_HUNDRED;
        let half = investment / Decimal::TWO;
        Ok(StrategySuggestion {
            strategy,
            range_width_pct,
            lower_price,
            upper_price,
            capital_efficiency: ce,
            investment_usd: investment,
            token0_amount: half.checked_div(price).ok_or_else(overflow)?,
            token1_amount: half,
            apr_estimate_pct,
            daily_fees_usd: (annual / dec!(365)).round_dp(4),
            weekly_fees_usd: (annual / dec!(52)).round_dp(4),
            monthly_fees_usd: (annual / dec!(12)).round_dp(2),
            annual_fees_usd: annual.round_dp(2),
        })
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(actual: Decimal, expected: Decimal) {
        assert!(
            (actual - expected).abs() < dec!(0.001),
            "expected {expected}, got {actual}"
        );
    }

    fn at(price: Decimal) -> StrategyInputs {
        StrategyInputs {
            current_price: price,
            ..StrategyInputs::default()
        }
    }

    #[test]
    fn test_returns_three_strategies_in_order() {
        let s = generate_strategies(&at(dec!(2000))).unwrap();
        let kinds: Vec<_> = s.iter().map(|x| x.strategy).collect();
        assert_eq!(
            kinds,
            vec![
                RangeStrategy::Conservative,
                RangeStrategy::Moderate,
                RangeStrategy::Aggressive
            ]
        );
    }

    #[test]
    fn test_default_volatility_bounds_and_efficiency() {
        let s = generate_strategies(&at(dec!(2000))).unwrap();

        // 80% / 50% / 20% half-widths around 2000
        assert_eq!((s[0].lower_price, s[0].upper_price), (dec!(400), dec!(3600)));
        assert_eq!((s[1].lower_price, s[1].upper_price), (dec!(1000), dec!(3000)));
        assert_eq!((s[2].lower_price, s[2].upper_price), (dec!(1600), dec!(2400)));

        // 1 / (1 - sqrt(1/9)) = 1.5, 1 / (1 - sqrt(1/3)) ~= 2.366, 1 / (1 - sqrt(2/3)) ~= 5.449
        close(s[0].capital_efficiency, dec!(1.5));
        close(s[1].capital_efficiency, dec!(2.3660));
        close(s[2].capital_efficiency, dec!(5.4495));

        let c_width = s[0].upper_price - s[0].lower_price;
        let a_width = s[2].upper_price - s[2].lower_price;
        assert!(c_width > a_width);
    }

    #[test]
    fn test_low_volatility_narrows_ranges_below_caps() {
        let s = generate_strategies(&StrategyInputs {
            volatility: Some(dec!(0.1)),
            ..at(dec!(100))
        })
        .unwrap();
        assert_eq!(s[0].range_width_pct, dec!(16));
        assert_eq!(s[1].range_width_pct, dec!(10));
        assert_eq!(s[2].range_width_pct, dec!(4));
        assert_eq!((s[2].lower_price, s[2].upper_price), (dec!(96), dec!(104)));
    }

    #[test]
    fn test_without_apr_uses_base_yield_on_default_capital() {
        let s = generate_strategies(&at(dec!(2000))).unwrap();
        let conservative = &s[0];
        assert_eq!(conservative.investment_usd, DEFAULT_CAPITAL_USD);
        // 5% * 1.5 / 2 = 3.75% of 10,000 = 375 a year
        close(conservative.apr_estimate_pct, dec!(3.75));
        close(conservative.annual_fees_usd, dec!(375));
        close(conservative.daily_fees_usd, dec!(1.0274));
        close(conservative.monthly_fees_usd, dec!(31.25));
        assert_eq!(conservative.token0_amount, dec!(2.5));
        assert_eq!(conservative.token1_amount, dec!(5000));
    }

    #[test]
    fn test_apr_scales_with_efficiency_relative_to_current() {
        let s = generate_strategies(&StrategyInputs {
            pool_apr_pct: Some(dec!(20)),
            current_ce: Some(dec!(5)),
            position_value_usd: Some(dec!(4000)),
            ..at(dec!(2000))
        })
        .unwrap();
        // aggressive: 20 * 5.449 / 5
        close(s[2].apr_estimate_pct, dec!(21.798));
        // conservative: 20 * 1.5 / 5
        close(s[0].apr_estimate_pct, dec!(6));
        close(s[0].annual_fees_usd, dec!(240));
        assert_eq!(s[0].investment_usd, dec!(4000));

        // Without a current CE every strategy is its own baseline.
        let own = generate_strategies(&StrategyInputs {
            pool_apr_pct: Some(dec!(20)),
            ..at(dec!(2000))
        })
        .unwrap();
        assert!(own.iter().all(|x| (x.apr_estimate_pct - dec!(20)).abs() < dec!(0.001)));
    }

    #[test]
    fn test_rejects_invalid_inputs() {
        assert!(matches!(
            generate_strategies(&at(Decimal::ZERO)),
            Err(MathError::NonPositivePrice(_))
        ));
        assert_eq!(
            generate_strategies(&StrategyInputs {
                volatility: Some(Decimal::ZERO),
                ..at(dec!(2000))
            }),
            Err(MathError::NonPositive("volatility"))
        );
    }
}
