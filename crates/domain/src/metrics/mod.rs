use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub mod efficiency;
pub mod fees;
pub mod impermanent_loss;
pub mod range;
pub mod strategies;

pub use efficiency::{CAPITAL_EFFICIENCY_CAP, capital_efficiency, capital_efficiency_for_ticks};
pub use fees::{daily_fee_estimate, fee_apy, pool_apr, volume_tvl_ratio};
pub use impermanent_loss::{
    fees_versus_loss, impermanent_loss, impermanent_loss_between, impermanent_loss_concentrated,
    impermanent_loss_v3,
};
pub use range::{classify_strategy, range_proximity, range_width_pct};
pub use strategies::{
    DEFAULT_CAPITAL_USD, DEFAULT_VOLATILITY, StrategyInputs, StrategySuggestion,
    generate_strategies,
};

/// Impermanent loss of a move from an entry price, full-range and concentrated.
///
/// All loss figures are fractions (`-0.0572` is a 5.72% loss).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpermanentLossEstimate {
    /// Loss of an unbounded constant-product position.
    pub v2: Decimal,
    /// `v2` amplified by capital efficiency, floored at -1.
    pub v3: Decimal,
    pub capital_efficiency: Decimal,
    /// current / entry
    pub price_ratio: Decimal,
}

/// Distance of the current price to each range boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeProximity {
    /// Price-level containment, inclusive at both bounds.
    pub in_range: bool,
    /// Percent the price can fall before leaving the range.
    pub downside_buffer_pct: Decimal,
    /// Percent the price can rise before leaving the range.
    pub upside_buffer_pct: Decimal,
    /// Where the price sits inside the range, 0 at lower and 100 at upper.
    /// Zero when out of range.
    pub position_in_range_pct: Decimal,
}

/// Fees earned so far set against the loss the position would take if the
/// price moved to either boundary. Losses are negative USD amounts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeesVersusLoss {
    pub fees_usd: Decimal,
    pub loss_at_lower_usd: Decimal,
    pub loss_at_upper_usd: Decimal,
    /// `fees_usd + loss_at_lower_usd`
    pub net_at_lower_usd: Decimal,
    /// `fees_usd + loss_at_upper_usd`
    pub net_at_upper_usd: Decimal,
}
