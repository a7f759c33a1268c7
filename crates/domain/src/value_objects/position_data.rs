use crate::entities::{Address, Token};
use crate::enums::{FeeAccuracy, PositionStatus, ProtocolId, RangeStrategy};
use crate::fees::FeeTier;
use crate::metrics::{FeesVersusLoss, ImpermanentLossEstimate, RangeProximity, StrategySuggestion};
use crate::value_objects::price::Price;
use crate::value_objects::price_range::PriceRange;
use chrono::{DateTime, Utc};
use primitive_types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Where USD prices in a valuation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    /// Supplied by the caller, typically a market-data client.
    External,
    /// One side is a known stablecoin pegged at $1.
    StablecoinPeg,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsdValuation {
    pub token0_price_usd: Decimal,
    pub token1_price_usd: Decimal,
    pub amount0_usd: Decimal,
    pub amount1_usd: Decimal,
    pub total_usd: Decimal,
    pub fees_usd: Decimal,
    pub source: PriceSource,
}

/// Fee income projected from 24h pool volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeYield {
    pub daily_fees_usd: Decimal,
    pub apy_pct: Decimal,
}

/// Shape of the range relative to the current price and worst-case losses at
/// its boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeAnalytics {
    pub width_pct: Decimal,
    pub proximity: RangeProximity,
    pub strategy: RangeStrategy,
    /// Loss if the price moved from here to the lower bound.
    pub il_at_lower: ImpermanentLossEstimate,
    /// Loss if the price moved from here to the upper bound.
    pub il_at_upper: ImpermanentLossEstimate,
}

/// Provenance of the raw values a result was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditTrail {
    /// Block every call was pinned to; `None` means the node's latest.
    pub block_number: Option<u64>,
    pub network: String,
    pub rpc_url: String,
    pub position_manager: Address,
    pub factory: Address,
    pub pool: Address,
    pub sqrt_price_x96: U256,
    pub fee_growth_global0_x128: U256,
    pub fee_growth_global1_x128: U256,
    pub fetched_at: DateTime<Utc>,
}

/// Fully assembled state of one position.
///
/// Prices are token0 quoted in token1; amounts are human units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionData {
    pub token_id: U256,
    pub protocol: ProtocolId,
    pub network: String,
    pub pool: Address,
    pub token0: Token,
    pub token1: Token,
    pub fee_tier: FeeTier,
    pub fee_label: String,

    pub tick_lower: i32,
    pub tick_upper: i32,
    pub current_tick: i32,
    pub liquidity: u128,

    pub current_price: Price,
    /// Human bound prices; `None` when a bound is too extreme for a decimal,
    /// as with full-range positions between tokens of equal decimals.
    pub range: Option<PriceRange>,

    pub amount0: Decimal,
    pub amount1: Decimal,
    /// Whole position expressed in token1.
    pub value_in_token1: Decimal,
    /// Share of the position's value held in token0, in percent.
    pub token0_pct: Decimal,
    pub token1_pct: Decimal,

    pub fees0: Decimal,
    pub fees1: Decimal,
    pub fee_accuracy: FeeAccuracy,

    pub in_range: bool,
    pub status: PositionStatus,
    pub capital_efficiency: Decimal,
    /// Position liquidity over active pool liquidity, in percent.
    pub pool_share_pct: Decimal,

    pub usd: Option<UsdValuation>,
    pub fee_yield: Option<FeeYield>,
    pub pool_apr_pct: Option<Decimal>,
    pub volume_tvl_ratio: Option<Decimal>,
    pub analytics: Option<RangeAnalytics>,
    /// Needs both a USD valuation and range analytics.
    pub fees_vs_loss: Option<FeesVersusLoss>,
    /// Alternative ranges around the current price; empty when the price
    /// cannot seed them.
    pub strategies: Vec<StrategySuggestion>,
    pub audit: AuditTrail,
}
