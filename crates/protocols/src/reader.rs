//! Assembles the full state of one located position.
//!
//! A read is three dependent steps: the position record, the pool address,
//! then every pool and token read at once. The results feed the fee
//! accountant and the math engine; the output is a single [`PositionData`].

use crate::abi::calls;
use crate::error::{LensError, Result};
use crate::registry::Candidate;
use crate::rpc::{BlockTag, CallError, EthCall};
use chrono::{DateTime, Utc};
use clmm_lens_domain::entities::{Address, PoolState, PositionRaw, TickInfo, Token};
use clmm_lens_domain::enums::PositionStatus;
use clmm_lens_domain::error::MathError;
use clmm_lens_domain::fees::{FeeAccrual, compute_fee_accrual, tokens_owed_only};
use clmm_lens_domain::math::concentrated_liquidity::token_amounts;
use clmm_lens_domain::math::f64_to_decimal;
use clmm_lens_domain::math::price_tick::{sqrt_price_x96_to_price, tick_to_price};
use clmm_lens_domain::metrics::{
    FeesVersusLoss, StrategyInputs, StrategySuggestion, capital_efficiency_for_ticks,
    classify_strategy, daily_fee_estimate, fee_apy, fees_versus_loss, generate_strategies,
    impermanent_loss_v3, pool_apr, range_proximity, range_width_pct, volume_tvl_ratio,
};
use clmm_lens_domain::stablecoins::{StableSide, stablecoin_side};
use clmm_lens_domain::value_objects::{
    Amount, AuditTrail, FeeYield, PositionData, Price, PriceRange, PriceSource, RangeAnalytics,
    UsdValuation,
};
use primitive_types::U256;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Symbol reported when a token's `symbol()` cannot be read.
pub const UNKNOWN_SYMBOL: &str = "UNK";

/// What to do when the tick reads needed for exact fee accounting fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeeFallbackPolicy {
    /// Report `tokensOwed` as the uncollected fees, flagged
    /// `FeeAccuracy::TokensOwedOnly`.
    #[default]
    Degrade,
    /// Fail the read with [`LensError::FeeTicksUnavailable`].
    Strict,
}

/// Configuration for the reader.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    pub fee_fallback: FeeFallbackPolicy,
    /// Pin every call of a read to the block current when the read starts.
    pub pin_block: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            fee_fallback: FeeFallbackPolicy::default(),
            pin_block: true,
        }
    }
}

/// Market figures supplied by an external data source, all in USD.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketInputs {
    pub token0_usd: Option<Decimal>,
    pub token1_usd: Option<Decimal>,
    pub volume_24h_usd: Option<Decimal>,
    pub tvl_usd: Option<Decimal>,
}

/// One position to read.
#[derive(Debug, Clone)]
pub struct ReadRequest {
    pub candidate: Candidate,
    pub token_id: U256,
    /// Known pool address; resolved through the factory when absent.
    pub pool: Option<Address>,
    pub market: MarketInputs,
}

/// Everything read from chain for one position.
#[derive(Debug, Clone)]
struct ChainSnapshot {
    block: Option<u64>,
    position: PositionRaw,
    pool: PoolState,
    token0: Token,
    token1: Token,
    fees: FeeAccrual,
}

/// Reads positions through an [`EthCall`] implementation.
pub struct PositionReader {
    client: Arc<dyn EthCall>,
    config: ReaderConfig,
}

impl PositionReader {
    /// Creates a new reader.
    pub fn new(client: Arc<dyn EthCall>, config: ReaderConfig) -> Self {
        Self { client, config }
    }

    /// Reads and assembles one position.
    ///
    /// Any failed required read aborts the whole read; no partial result is
    /// returned. Only the two tick reads are optional, governed by
    /// [`ReaderConfig::fee_fallback`].
    pub async fn read(&self, request: &ReadRequest) -> Result<PositionData> {
        let candidate = &request.candidate;
        let endpoint = &candidate.network;
        info!(
            token_id = %request.token_id,
            network = %endpoint.name,
            protocol = %candidate.protocol,
            "Reading position"
        );

        let block = self.pin_block(candidate).await;
        let tag = block.map_or(BlockTag::Latest, BlockTag::Number);

        let position = self.read_position(candidate, request.token_id, tag).await?;
        if position.is_closed() {
            info!(token_id = %request.token_id, "Position has zero liquidity");
        }
        let pool_address = match request.pool {
            Some(pool) => pool,
            None => self.resolve_pool(candidate, &position, tag).await?,
        };

        let slot0_call = calls::slot0();
        let liquidity_call = calls::liquidity();
        let fg0_call = calls::fee_growth_global0();
        let fg1_call = calls::fee_growth_global1();
        let lower_call = calls::ticks(position.tick_lower);
        let upper_call = calls::ticks(position.tick_upper);
        let decimals_call = calls::decimals();
        let symbol_call = calls::symbol();

        let (slot0, liquidity, fg0, fg1, tick_lower, tick_upper, dec0, dec1, sym0, sym1) = tokio::join!(
            self.call(candidate, pool_address, &slot0_call, tag),
            self.call(candidate, pool_address, &liquidity_call, tag),
            self.call(candidate, pool_address, &fg0_call, tag),
            self.call(candidate, pool_address, &fg1_call, tag),
            self.call(candidate, pool_address, &lower_call, tag),
            self.call(candidate, pool_address, &upper_call, tag),
            self.call(candidate, position.token0, &decimals_call, tag),
            self.call(candidate, position.token1, &decimals_call, tag),
            self.call(candidate, position.token0, &symbol_call, tag),
            self.call(candidate, position.token1, &symbol_call, tag),
        );

        let (sqrt_price_x96, current_tick) = calls::decode_slot0(&slot0?)?;
        let pool = PoolState {
            address: pool_address,
            sqrt_price_x96,
            current_tick,
            liquidity: calls::decode_liquidity(&liquidity?)?,
            fee_growth_global0_x128: calls::decode_uint256(&fg0?)?,
            fee_growth_global1_x128: calls::decode_uint256(&fg1?)?,
        };
        let token0 = Token::new(
            position.token0,
            symbol_or_unknown(position.token0, sym0),
            calls::decode_decimals(&dec0?)?,
        );
        let token1 = Token::new(
            position.token1,
            symbol_or_unknown(position.token1, sym1),
            calls::decode_decimals(&dec1?)?,
        );

        let ticks = decode_tick(position.tick_lower, tick_lower)
            .and_then(|lower| Ok((lower, decode_tick(position.tick_upper, tick_upper)?)));
        let fees = match ticks {
            Ok((lower, upper)) => compute_fee_accrual(&position, &pool, &lower, &upper),
            Err(e) => match self.config.fee_fallback {
                FeeFallbackPolicy::Strict => return Err(e),
                FeeFallbackPolicy::Degrade => {
                    warn!(
                        token_id = %request.token_id,
                        pool = %pool_address,
                        error = %e,
                        "Tick data unavailable, reporting tokensOwed only"
                    );
                    tokens_owed_only(&position)
                }
            },
        };

        let snapshot = ChainSnapshot {
            block,
            position,
            pool,
            token0,
            token1,
            fees,
        };
        let data = assemble(request, snapshot, Utc::now())?;
        info!(
            token_id = %request.token_id,
            status = ?data.status,
            value_in_token1 = %data.value_in_token1,
            "Position read"
        );
        Ok(data)
    }

    async fn pin_block(&self, candidate: &Candidate) -> Option<u64> {
        if !self.config.pin_block {
            return None;
        }
        match self.client.block_number(&candidate.network).await {
            Ok(block) => {
                debug!(network = %candidate.network.name, block, "Pinned block");
                Some(block)
            }
            Err(e) => {
                warn!(
                    network = %candidate.network.name,
                    error = %e,
                    "Block number unavailable, reading latest"
                );
                None
            }
        }
    }

    async fn call(
        &self,
        candidate: &Candidate,
        to: Address,
        data: &[u8],
        block: BlockTag,
    ) -> std::result::Result<Vec<u8>, CallError> {
        self.client
            .eth_call(&candidate.network, to, data, block)
            .await
    }

    async fn read_position(
        &self,
        candidate: &Candidate,
        token_id: U256,
        block: BlockTag,
    ) -> Result<PositionRaw> {
        let manager = candidate.deployment.position_manager;
        let bytes = match self
            .call(candidate, manager, &calls::positions(token_id), block)
            .await
        {
            Ok(bytes) => bytes,
            Err(CallError::Rpc(e)) if e.is_nonexistent() => {
                return Err(LensError::NotFound(format!(
                    "position {token_id} on {} {}: {e}",
                    candidate.network.name, candidate.protocol
                )));
            }
            Err(e) => return Err(e.into()),
        };
        let position = calls::decode_positions(token_id, &bytes)?;
        if position.is_empty() {
            return Err(LensError::NotFound(format!(
                "position {token_id} on {} {}",
                candidate.network.name, candidate.protocol
            )));
        }
        Ok(position)
    }

    async fn resolve_pool(
        &self,
        candidate: &Candidate,
        position: &PositionRaw,
        block: BlockTag,
    ) -> Result<Address> {
        let data = calls::get_pool(position.token0, position.token1, position.fee);
        let bytes = self
            .call(candidate, candidate.deployment.factory, &data, block)
            .await?;
        let pool = calls::decode_address(&bytes)?;
        if pool.is_zero() {
            return Err(LensError::NotFound(format!(
                "pool for {}/{} at fee {}",
                position.token0, position.token1, position.fee.pips
            )));
        }
        debug!(pool = %pool, "Resolved pool from factory");
        Ok(pool)
    }
}

fn symbol_or_unknown(token: Address, result: std::result::Result<Vec<u8>, CallError>) -> String {
    let decoded = result
        .map_err(LensError::from)
        .and_then(|bytes| Ok(calls::decode_symbol(&bytes)?));
    match decoded {
        Ok(symbol) if !symbol.trim_matches('\0').trim().is_empty() => symbol,
        Ok(_) => UNKNOWN_SYMBOL.to_string(),
        Err(e) => {
            warn!(token = %token, error = %e, "Token symbol unavailable");
            UNKNOWN_SYMBOL.to_string()
        }
    }
}

fn decode_tick(tick: i32, result: std::result::Result<Vec<u8>, CallError>) -> Result<TickInfo> {
    let bytes = result.map_err(LensError::FeeTicksUnavailable)?;
    Ok(calls::decode_ticks(tick, &bytes)?)
}

/// Human bound prices, or `None` when either bound does not fit a decimal.
fn price_range(position: &PositionRaw, decimals0: u8, decimals1: u8) -> Result<Option<PriceRange>> {
    let bound = |tick| match tick_to_price(tick, decimals0, decimals1) {
        Ok(price) => Ok(Some(Price::new(price))),
        Err(MathError::PriceOutOfBounds) => Ok(None),
        Err(e) => Err(e),
    };
    match (bound(position.tick_lower)?, bound(position.tick_upper)?) {
        (Some(lower), Some(upper)) => Ok(Some(PriceRange::new(lower, upper))),
        _ => {
            debug!(
                tick_lower = position.tick_lower,
                tick_upper = position.tick_upper,
                "Range bound prices not representable"
            );
            Ok(None)
        }
    }
}

fn percent(part: Decimal, whole: Decimal) -> Option<Decimal> {
    part.checked_div(whole)?.checked_mul(Decimal::ONE_HUNDRED)
}

/// Combines a chain snapshot with market inputs into the final result.
fn assemble(
    request: &ReadRequest,
    snapshot: ChainSnapshot,
    fetched_at: DateTime<Utc>,
) -> Result<PositionData> {
    let ChainSnapshot {
        block,
        position,
        pool,
        token0,
        token1,
        fees,
    } = snapshot;
    let (d0, d1) = (token0.decimals, token1.decimals);

    let (amount0, amount1) = token_amounts(
        position.liquidity,
        pool.sqrt_price_x96,
        position.tick_lower,
        position.tick_upper,
        d0,
        d1,
    )?;

    let current_price = Price::new(sqrt_price_x96_to_price(pool.sqrt_price_x96, d0, d1)?);
    let range = price_range(&position, d0, d1)?;

    let in_range = position.tick_lower <= pool.current_tick && pool.current_tick < position.tick_upper;
    let status = if position.is_closed() {
        PositionStatus::Closed
    } else if in_range {
        PositionStatus::InRange
    } else {
        PositionStatus::OutOfRange
    };

    let amount0_in_token1 = amount0
        .checked_mul(current_price.value)
        .ok_or(MathError::Overflow("position value"))?;
    let value_in_token1 = amount0_in_token1
        .checked_add(amount1)
        .ok_or(MathError::Overflow("position value"))?;
    let (token0_pct, token1_pct) = if value_in_token1 > Decimal::ZERO {
        let pct0 = percent(amount0_in_token1, value_in_token1)
            .ok_or(MathError::Overflow("composition"))?;
        (pct0, Decimal::ONE_HUNDRED - pct0)
    } else {
        (Decimal::ZERO, Decimal::ZERO)
    };

    let fees0 = Amount::new(fees.amount0, d0).to_decimal()?;
    let fees1 = Amount::new(fees.amount1, d1).to_decimal()?;

    let capital_efficiency = capital_efficiency_for_ticks(position.tick_lower, position.tick_upper)?;
    let share = pool_share(position.liquidity, pool.liquidity)?;
    let pool_share_pct = share * Decimal::ONE_HUNDRED;

    let usd = usd_valuation(
        &request.market,
        &token0,
        &token1,
        current_price,
        [amount0, amount1],
        [fees0, fees1],
    );
    let fee_fraction = position.fee.fraction();
    let fee_yield = match (request.market.volume_24h_usd, &usd) {
        (Some(volume), Some(usd)) if usd.total_usd > Decimal::ZERO => {
            estimate_fee_yield(volume, fee_fraction, share, in_range, usd.total_usd)
        }
        _ => None,
    };
    let pool_apr_pct = match (request.market.volume_24h_usd, request.market.tvl_usd) {
        (Some(volume), Some(tvl)) => pool_apr(volume, fee_fraction, tvl),
        _ => None,
    };
    let volume_tvl_ratio = match (request.market.volume_24h_usd, request.market.tvl_usd) {
        (Some(volume), Some(tvl)) => volume_tvl_ratio(volume, tvl),
        _ => None,
    };
    let analytics = range.and_then(|range| range_analytics(current_price, range));
    let fees_vs_loss = match (&usd, &analytics) {
        (Some(usd), Some(analytics)) => boundary_losses(usd, analytics),
        _ => None,
    };
    // The position's own yield is the better baseline when it is known.
    let strategies = suggest_ranges(StrategyInputs {
        current_price: current_price.value,
        volatility: None,
        pool_apr_pct: fee_yield.as_ref().map(|y| y.apy_pct).or(pool_apr_pct),
        current_ce: Some(capital_efficiency),
        position_value_usd: usd.as_ref().map(|u| u.total_usd),
    });

    Ok(PositionData {
        token_id: position.token_id,
        protocol: request.candidate.protocol,
        network: request.candidate.network.name.clone(),
        pool: pool.address,
        fee_tier: position.fee,
        fee_label: position.fee.label(),
        tick_lower: position.tick_lower,
        tick_upper: position.tick_upper,
        current_tick: pool.current_tick,
        liquidity: position.liquidity,
        current_price,
        range,
        amount0,
        amount1,
        value_in_token1,
        token0_pct,
        token1_pct,
        fees0,
        fees1,
        fee_accuracy: fees.accuracy,
        in_range,
        status,
        capital_efficiency,
        pool_share_pct,
        usd,
        fee_yield,
        pool_apr_pct,
        volume_tvl_ratio,
        analytics,
        fees_vs_loss,
        strategies,
        audit: AuditTrail {
            block_number: block,
            network: request.candidate.network.name.clone(),
            rpc_url: request.candidate.network.rpc_url.clone(),
            position_manager: request.candidate.deployment.position_manager,
            factory: request.candidate.deployment.factory,
            pool: pool.address,
            sqrt_price_x96: pool.sqrt_price_x96,
            fee_growth_global0_x128: pool.fee_growth_global0_x128,
            fee_growth_global1_x128: pool.fee_growth_global1_x128,
            fetched_at,
        },
        token0,
        token1,
    })
}

/// Position liquidity over active pool liquidity, capped at 1.
fn pool_share(position_liquidity: u128, pool_liquidity: u128) -> Result<Decimal> {
    if pool_liquidity == 0 {
        return Ok(Decimal::ZERO);
    }
    // Liquidity can exceed a decimal mantissa, so the ratio is taken in f64.
    let ratio = (position_liquidity as f64 / pool_liquidity as f64).min(1.0);
    match f64_to_decimal(ratio) {
        Ok(share) => Ok(share),
        // Smaller than the finest decimal step.
        Err(MathError::PriceOutOfBounds) if ratio < 1e-27 => Ok(Decimal::ZERO),
        Err(e) => Err(e.into()),
    }
}

/// USD prices from market inputs, else from a stablecoin side, else none.
fn usd_prices(
    market: &MarketInputs,
    token0: &Token,
    token1: &Token,
    price: Price,
) -> Option<(Decimal, Decimal, PriceSource)> {
    match (market.token0_usd, market.token1_usd) {
        (Some(p0), Some(p1)) => Some((p0, p1, PriceSource::External)),
        (Some(p0), None) => {
            let p1 = p0.checked_div(price.value)?;
            Some((p0, p1, PriceSource::External))
        }
        (None, Some(p1)) => Some((p1.checked_mul(price.value)?, p1, PriceSource::External)),
        (None, None) => match stablecoin_side(&token0.symbol, &token1.symbol)? {
            StableSide::Token1 => Some((price.value, Decimal::ONE, PriceSource::StablecoinPeg)),
            StableSide::Token0 => {
                let p1 = price.invert().value;
                Some((Decimal::ONE, p1, PriceSource::StablecoinPeg))
            }
        },
    }
}

fn usd_valuation(
    market: &MarketInputs,
    token0: &Token,
    token1: &Token,
    price: Price,
    amounts: [Decimal; 2],
    fees: [Decimal; 2],
) -> Option<UsdValuation> {
    let (p0, p1, source) = usd_prices(market, token0, token1, price)?;
    let amount0_usd = amounts[0].checked_mul(p0)?;
    let amount1_usd = amounts[1].checked_mul(p1)?;
    let fees_usd = fees[0].checked_mul(p0)?.checked_add(fees[1].checked_mul(p1)?)?;
    Some(UsdValuation {
        token0_price_usd: p0,
        token1_price_usd: p1,
        amount0_usd,
        amount1_usd,
        total_usd: amount0_usd.checked_add(amount1_usd)?,
        fees_usd,
        source,
    })
}

fn estimate_fee_yield(
    volume: Decimal,
    fee_fraction: Decimal,
    share: Decimal,
    in_range: bool,
    position_value: Decimal,
) -> Option<FeeYield> {
    // Out-of-range liquidity earns nothing from swaps.
    let daily_fees_usd = if in_range {
        daily_fee_estimate(volume, fee_fraction, share).ok()?
    } else {
        Decimal::ZERO
    };
    let apy_pct = fee_apy(daily_fees_usd, position_value).ok()?;
    Some(FeeYield {
        daily_fees_usd,
        apy_pct,
    })
}

fn range_analytics(current: Price, range: PriceRange) -> Option<RangeAnalytics> {
    let (lower, upper) = (range.lower_price.value, range.upper_price.value);
    let build = || -> std::result::Result<RangeAnalytics, MathError> {
        Ok(RangeAnalytics {
            width_pct: range_width_pct(current.value, lower, upper)?,
            proximity: range_proximity(current.value, lower, upper)?,
            strategy: classify_strategy(current.value, lower, upper)?,
            il_at_lower: impermanent_loss_v3(current.value, lower, lower, upper)?,
            il_at_upper: impermanent_loss_v3(current.value, upper, lower, upper)?,
        })
    };
    match build() {
        Ok(analytics) => Some(analytics),
        Err(e) => {
            debug!(error = %e, "Range analytics unavailable");
            None
        }
    }
}

fn boundary_losses(usd: &UsdValuation, analytics: &RangeAnalytics) -> Option<FeesVersusLoss> {
    match fees_versus_loss(
        usd.total_usd,
        usd.fees_usd,
        analytics.il_at_lower.v3,
        analytics.il_at_upper.v3,
    ) {
        Ok(f) => Some(f),
        Err(e) => {
            debug!(error = %e, "Boundary losses unavailable");
            None
        }
    }
}

fn suggest_ranges(inputs: StrategyInputs) -> Vec<StrategySuggestion> {
    generate_strategies(&inputs).unwrap_or_else(|e| {
        debug!(error = %e, "Range suggestions unavailable");
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::AbiValue;
    use crate::abi::calls::tests::positions_result;
    use crate::registry::CandidateFilter;
    use crate::rpc::{RpcError, TransportError};
    use crate::testing::{MockChain, factory_address, manager_address, registry, string_result, words};
    use clmm_lens_domain::enums::{FeeAccuracy, RangeStrategy};
    use clmm_lens_domain::fees::FeeTier;
    use clmm_lens_domain::math::Q96_F64;
    use rust_decimal::prelude::ToPrimitive;
    use rust_decimal_macros::dec;

    const POOL: Address = Address([0x77; 20]);
    const TOKEN0: Address = Address([0x10; 20]);
    const TOKEN1: Address = Address([0x20; 20]);

    fn q128(n: u64) -> U256 {
        U256::from(n) << 128
    }

    fn candidate() -> Candidate {
        registry(&["alpha"])
            .candidates(&CandidateFilter::default())
            .remove(0)
    }

    fn request() -> ReadRequest {
        ReadRequest {
            candidate: candidate(),
            token_id: U256::from(1234u32),
            pool: None,
            market: MarketInputs::default(),
        }
    }

    fn sample_position() -> PositionRaw {
        PositionRaw {
            token_id: U256::from(1234u32),
            nonce: U256::zero(),
            operator: Address::ZERO,
            token0: TOKEN0,
            token1: TOKEN1,
            fee: FeeTier::new(3000),
            tick_lower: -600,
            tick_upper: 600,
            liquidity: 1_000_000_000_000_000_000,
            fee_growth_inside0_last_x128: q128(2),
            fee_growth_inside1_last_x128: q128(2),
            tokens_owed0: 500_000_000_000_000_000,
            tokens_owed1: 0,
        }
    }

    /// Pool, factory, manager and both tokens answering by selector.
    struct Fixture {
        position: PositionRaw,
        sqrt_price_x96: U256,
        tick: i32,
        pool_liquidity: u128,
        decimals: (u8, u8),
        symbols: (&'static str, &'static str),
        ticks_fail: bool,
        liquidity_fails: bool,
        factory_pool: Address,
        block: Option<u64>,
    }

    impl Default for Fixture {
        fn default() -> Self {
            Self {
                position: sample_position(),
                sqrt_price_x96: U256::one() << 96,
                tick: 0,
                pool_liquidity: 4_000_000_000_000_000_000,
                decimals: (18, 18),
                symbols: ("WETH", "DAI"),
                ticks_fail: false,
                liquidity_fails: false,
                factory_pool: POOL,
                block: Some(19_000_000),
            }
        }
    }

    fn tick_arg(data: &[u8]) -> i32 {
        let mut be = [0u8; 4];
        be.copy_from_slice(&data[32..36]);
        i32::from_be_bytes(be)
    }

    impl Fixture {
        fn chain(self) -> Arc<MockChain> {
            let Fixture {
                position,
                sqrt_price_x96,
                tick,
                pool_liquidity,
                decimals,
                symbols,
                ticks_fail,
                liquidity_fails,
                factory_pool,
                block,
            } = self;
            let (lower, upper) = (position.tick_lower, position.tick_upper);
            let manager_result = positions_result(&position);
            let mut chain = MockChain::new()
                .with_contract("alpha", manager_address(0), move |_| Ok(manager_result.clone()))
                .with_contract("alpha", factory_address(0), move |_| {
                    Ok(words(&[AbiValue::Address(factory_pool)]))
                })
                .with_contract("alpha", POOL, move |data| {
                    let selector = [data[0], data[1], data[2], data[3]];
                    match selector {
                        calls::SLOT0 => Ok(words(&[
                            AbiValue::Uint(sqrt_price_x96),
                            AbiValue::Int24(tick),
                            AbiValue::Uint(U256::zero()),
                        ])),
                        calls::LIQUIDITY if liquidity_fails => Err(RpcError::Reverted {
                            code: -32000,
                            message: "execution reverted".to_string(),
                        }
                        .into()),
                        calls::LIQUIDITY => Ok(words(&[AbiValue::Uint(U256::from(pool_liquidity))])),
                        calls::FEE_GROWTH_GLOBAL0 | calls::FEE_GROWTH_GLOBAL1 => {
                            Ok(words(&[AbiValue::Uint(q128(10))]))
                        }
                        calls::TICKS if ticks_fail => Err(TransportError::Timeout.into()),
                        calls::TICKS => {
                            let t = tick_arg(data);
                            let outside = if t == lower {
                                q128(1)
                            } else if t == upper {
                                q128(3)
                            } else {
                                U256::zero()
                            };
                            Ok(words(&[
                                AbiValue::Uint(U256::from(1u8)),
                                AbiValue::Uint(U256::zero()),
                                AbiValue::Uint(outside),
                                AbiValue::Uint(outside),
                            ]))
                        }
                        _ => Err(RpcError::EmptyResult.into()),
                    }
                })
                .with_contract("alpha", TOKEN0, move |data| {
                    if data[..4] == calls::DECIMALS {
                        Ok(words(&[AbiValue::Uint(U256::from(decimals.0))]))
                    } else {
                        Ok(string_result(symbols.0))
                    }
                })
                .with_contract("alpha", TOKEN1, move |data| {
                    if data[..4] == calls::DECIMALS {
                        Ok(words(&[AbiValue::Uint(U256::from(decimals.1))]))
                    } else {
                        Ok(string_result(symbols.1))
                    }
                });
            if let Some(block) = block {
                chain = chain.with_block(block);
            }
            Arc::new(chain)
        }
    }

    fn reader(chain: Arc<MockChain>, policy: FeeFallbackPolicy) -> PositionReader {
        PositionReader::new(
            chain,
            ReaderConfig {
                fee_fallback: policy,
                pin_block: true,
            },
        )
    }

    fn assert_close(actual: Decimal, expected: f64, rel: f64) {
        let actual = actual.to_f64().unwrap();
        let err = ((actual - expected) / expected).abs();
        assert!(err <= rel, "expected {expected}, got {actual} (rel err {err})");
    }

    #[tokio::test]
    async fn test_read_in_range_position() {
        let chain = Fixture::default().chain();
        let data = reader(chain.clone(), FeeFallbackPolicy::Degrade)
            .read(&request())
            .await
            .unwrap();

        // Symmetric range around price 1: both sides hold 1 - 1.0001^-300.
        let expected = 1.0 - 1.0001f64.powi(-300);
        assert_close(data.amount0, expected, 1e-4);
        assert_close(data.amount1, expected, 1e-4);
        assert_eq!(data.current_price.value, Decimal::ONE);
        assert_eq!(data.status, PositionStatus::InRange);
        assert!(data.in_range);
        assert_close(data.token0_pct, 50.0, 1e-6);

        // inside = 10 - 1 - 3 = 6, last = 2, so 4 per unit of liquidity
        assert_eq!(data.fee_accuracy, FeeAccuracy::Exact);
        assert_eq!(data.fees0, dec!(4.5));
        assert_eq!(data.fees1, dec!(4));

        assert_eq!(data.pool, POOL);
        assert_eq!(data.pool_share_pct, dec!(25));
        assert_eq!(data.token0.symbol, "WETH");
        assert_eq!(data.fee_label, "0.3%");

        // DAI is token1, so it anchors the USD valuation at $1
        let usd = data.usd.unwrap();
        assert_eq!(usd.source, PriceSource::StablecoinPeg);
        assert_eq!(usd.token1_price_usd, Decimal::ONE);
        assert_close(usd.total_usd, 2.0 * expected, 1e-4);
        assert_eq!(usd.fees_usd, dec!(8.5));

        let range = data.range.unwrap();
        assert!(range.lower_price.value < Decimal::ONE);
        assert!(range.upper_price.value > Decimal::ONE);
        let analytics = data.analytics.unwrap();
        assert!(analytics.proximity.in_range);
        assert!(analytics.il_at_lower.v3 < Decimal::ZERO);
        // 1 / (1 - 1.0001^-600) ~= 17.2
        assert!(data.capital_efficiency > dec!(17) && data.capital_efficiency < dec!(17.5));
    }

    #[tokio::test]
    async fn test_read_pins_every_call_to_one_block() {
        let chain = Fixture::default().chain();
        let data = reader(chain.clone(), FeeFallbackPolicy::Degrade)
            .read(&request())
            .await
            .unwrap();
        assert_eq!(data.audit.block_number, Some(19_000_000));
        let blocks = chain.blocks();
        assert_eq!(blocks.len(), 12);
        assert!(blocks.iter().all(|b| *b == BlockTag::Number(19_000_000)));
    }

    #[tokio::test]
    async fn test_read_falls_back_to_latest_without_block_number() {
        let chain = Fixture {
            block: None,
            ..Fixture::default()
        }
        .chain();
        let data = reader(chain.clone(), FeeFallbackPolicy::Degrade)
            .read(&request())
            .await
            .unwrap();
        assert_eq!(data.audit.block_number, None);
        assert!(chain.blocks().iter().all(|b| *b == BlockTag::Latest));
    }

    // Consistency check: reader output against the closed-form amounts for the
    // same snapshot. Published vectors are pinned in the domain math tests.
    #[tokio::test]
    async fn test_weth_usdc_value_matches_closed_form() {
        let tick = -196_256;
        let (tick_lower, tick_upper) = (-197_280, -195_240);
        let liquidity = 1_000_000_000_000_000u128;
        let sqrt = 1.0001f64.powf(tick as f64 / 2.0);
        let position = PositionRaw {
            fee: FeeTier::new(500),
            tick_lower,
            tick_upper,
            liquidity,
            // Equal to the current inside growth, so nothing accrued
            fee_growth_inside0_last_x128: q128(6),
            fee_growth_inside1_last_x128: q128(6),
            tokens_owed0: 0,
            ..sample_position()
        };
        let chain = Fixture {
            position,
            sqrt_price_x96: U256::from((sqrt * Q96_F64) as u128),
            tick,
            decimals: (18, 6),
            symbols: ("WETH", "USDC"),
            ..Fixture::default()
        }
        .chain();
        let data = reader(chain, FeeFallbackPolicy::Degrade)
            .read(&request())
            .await
            .unwrap();

        let sl = 1.0001f64.powf(tick_lower as f64 / 2.0);
        let su = 1.0001f64.powf(tick_upper as f64 / 2.0);
        let l = liquidity as f64;
        let amount0 = l * (1.0 / sqrt - 1.0 / su) / 1e18;
        let amount1 = l * (sqrt - sl) / 1e6;
        let price = sqrt * sqrt * 1e12;

        assert_close(data.current_price.value, price, 1e-6);
        assert!(data.current_price.value > dec!(2900) && data.current_price.value < dec!(3100));
        assert_close(data.amount0, amount0, 1e-4);
        assert_close(data.amount1, amount1, 1e-4);
        assert_close(data.value_in_token1, amount0 * price + amount1, 1e-4);
        assert_close(data.usd.unwrap().total_usd, amount0 * price + amount1, 1e-4);
        assert_eq!(data.fee_label, "0.05%");
        assert_eq!(data.fees0, Decimal::ZERO);
        assert_eq!(data.analytics.unwrap().strategy, RangeStrategy::Aggressive);
    }

    #[tokio::test]
    async fn test_large_liquidity_on_small_price_pair() {
        let tick = -230_000;
        let (tick_lower, tick_upper) = (-232_000, -228_000);
        let liquidity = 100_000_000_000_000_000_000_000_000u128;
        let sqrt = 1.0001f64.powf(tick as f64 / 2.0);
        let position = PositionRaw {
            tick_lower,
            tick_upper,
            liquidity,
            ..sample_position()
        };
        let chain = Fixture {
            position,
            sqrt_price_x96: U256::from((sqrt * Q96_F64) as u128),
            tick,
            symbols: ("PEPE", "WETH"),
            ..Fixture::default()
        }
        .chain();
        let data = reader(chain, FeeFallbackPolicy::Degrade)
            .read(&request())
            .await
            .unwrap();

        let sl = 1.0001f64.powf(tick_lower as f64 / 2.0);
        let su = 1.0001f64.powf(tick_upper as f64 / 2.0);
        let l = liquidity as f64;
        // Roughly 9.4e11 PEPE, i.e. 9.4e29 raw units
        let amount0 = l * (1.0 / sqrt - 1.0 / su) / 1e18;
        let amount1 = l * (sqrt - sl) / 1e18;
        assert!(amount0 > 1e11);
        assert_close(data.amount0, amount0, 1e-6);
        assert_close(data.amount1, amount1, 1e-6);
        assert_eq!(data.status, PositionStatus::InRange);
        assert_eq!(data.pool_share_pct, dec!(100));
        assert!(data.usd.is_none());
    }

    #[tokio::test]
    async fn test_tick_failure_degrades_to_tokens_owed() {
        let chain = Fixture {
            ticks_fail: true,
            ..Fixture::default()
        }
        .chain();
        let data = reader(chain, FeeFallbackPolicy::Degrade)
            .read(&request())
            .await
            .unwrap();
        assert_eq!(data.fee_accuracy, FeeAccuracy::TokensOwedOnly);
        assert_eq!(data.fees0, dec!(0.5));
        assert_eq!(data.fees1, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_tick_failure_is_fatal_under_strict_policy() {
        let chain = Fixture {
            ticks_fail: true,
            ..Fixture::default()
        }
        .chain();
        let err = reader(chain, FeeFallbackPolicy::Strict)
            .read(&request())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LensError::FeeTicksUnavailable(CallError::Transport(TransportError::Timeout))
        ));
    }

    #[tokio::test]
    async fn test_required_read_failure_is_fatal() {
        let chain = Fixture {
            liquidity_fails: true,
            ..Fixture::default()
        }
        .chain();
        let err = reader(chain, FeeFallbackPolicy::Degrade)
            .read(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, LensError::Rpc(RpcError::Reverted { .. })), "got {err:?}");
    }

    #[tokio::test]
    async fn test_closed_position_is_read() {
        let chain = Fixture {
            position: PositionRaw {
                liquidity: 0,
                ..sample_position()
            },
            ..Fixture::default()
        }
        .chain();
        let data = reader(chain, FeeFallbackPolicy::Degrade)
            .read(&request())
            .await
            .unwrap();
        assert_eq!(data.status, PositionStatus::Closed);
        assert_eq!(data.amount0, Decimal::ZERO);
        assert_eq!(data.value_in_token1, Decimal::ZERO);
        assert_eq!(data.pool_share_pct, Decimal::ZERO);
        // owed fees are still reported
        assert_eq!(data.fees0, dec!(0.5));
    }

    #[tokio::test]
    async fn test_full_range_position_without_representable_bounds() {
        let chain = Fixture {
            position: PositionRaw {
                tick_lower: -887_220,
                tick_upper: 887_220,
                ..sample_position()
            },
            ..Fixture::default()
        }
        .chain();
        let data = reader(chain, FeeFallbackPolicy::Degrade)
            .read(&request())
            .await
            .unwrap();
        assert!(data.range.is_none());
        assert!(data.analytics.is_none());
        assert_close(data.capital_efficiency, 1.0, 1e-6);
        assert_close(data.amount0, 1.0, 1e-6);
        assert_close(data.amount1, 1.0, 1e-6);
    }

    #[tokio::test]
    async fn test_missing_pool_is_not_found() {
        let chain = Fixture {
            factory_pool: Address::ZERO,
            ..Fixture::default()
        }
        .chain();
        let err = reader(chain, FeeFallbackPolicy::Degrade)
            .read(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, LensError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_supplied_pool_skips_factory() {
        let chain = Fixture::default().chain();
        let req = ReadRequest {
            pool: Some(POOL),
            ..request()
        };
        reader(chain.clone(), FeeFallbackPolicy::Degrade)
            .read(&req)
            .await
            .unwrap();
        assert!(!chain.selectors().contains(&calls::GET_POOL));
        assert_eq!(chain.selectors().len(), 11);
    }

    #[tokio::test]
    async fn test_external_prices_and_fee_yield() {
        let chain = Fixture {
            symbols: ("WETH", "WBTC"),
            ..Fixture::default()
        }
        .chain();
        let req = ReadRequest {
            market: MarketInputs {
                token0_usd: Some(dec!(3000)),
                token1_usd: None,
                volume_24h_usd: Some(dec!(1_000_000)),
                tvl_usd: Some(dec!(10_000_000)),
            },
            ..request()
        };
        let data = reader(chain, FeeFallbackPolicy::Degrade)
            .read(&req)
            .await
            .unwrap();
        let usd = data.usd.unwrap();
        assert_eq!(usd.source, PriceSource::External);
        assert_eq!(usd.token1_price_usd, dec!(3000));

        // 1M volume * 0.3% * 25% share
        let fee_yield = data.fee_yield.unwrap();
        assert_eq!(fee_yield.daily_fees_usd, dec!(750));
        assert!(fee_yield.apy_pct > Decimal::ZERO);
        // 1M * 0.003 * 365 / 10M * 100
        assert_eq!(data.pool_apr_pct, Some(dec!(10.95)));
        assert_eq!(data.volume_tvl_ratio, Some(dec!(0.1)));

        let losses = data.fees_vs_loss.unwrap();
        assert_eq!(losses.fees_usd, usd.fees_usd);
        assert!(losses.loss_at_lower_usd < Decimal::ZERO);
        assert!(losses.net_at_upper_usd < losses.fees_usd);

        // Suggestions are sized on the position and scaled from its own APY.
        assert_eq!(data.strategies.len(), 3);
        let aggressive = &data.strategies[2];
        assert_eq!(aggressive.strategy, RangeStrategy::Aggressive);
        assert_eq!(aggressive.investment_usd, usd.total_usd);
        let expected = fee_yield.apy_pct * aggressive.capital_efficiency / data.capital_efficiency;
        assert!((aggressive.apr_estimate_pct - expected).abs() < dec!(0.0001));
    }

    #[tokio::test]
    async fn test_no_usd_without_prices_or_stablecoin() {
        let chain = Fixture {
            symbols: ("WETH", "WBTC"),
            ..Fixture::default()
        }
        .chain();
        let data = reader(chain, FeeFallbackPolicy::Degrade)
            .read(&request())
            .await
            .unwrap();
        assert!(data.usd.is_none());
        assert!(data.fee_yield.is_none());
        assert!(data.fees_vs_loss.is_none());
        assert!(data.value_in_token1 > Decimal::ZERO);
        // Without a USD value the suggestions fall back to default capital.
        assert_eq!(data.strategies.len(), 3);
        assert_eq!(
            data.strategies[0].investment_usd,
            clmm_lens_domain::metrics::DEFAULT_CAPITAL_USD
        );
    }

    #[tokio::test]
    async fn test_reverted_position_is_not_found() {
        let chain = Arc::new(MockChain::new().with_contract("alpha", manager_address(0), |_| {
            Err(crate::testing::reverted())
        }));
        let err = reader(chain, FeeFallbackPolicy::Degrade)
            .read(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, LensError::NotFound(_)));
    }

    #[test]
    fn test_pool_share_is_capped() {
        assert_eq!(pool_share(10, 0).unwrap(), Decimal::ZERO);
        assert_eq!(pool_share(10, 5).unwrap(), Decimal::ONE);
        assert_eq!(pool_share(1, 4).unwrap(), dec!(0.25));
        assert_eq!(pool_share(1, u128::MAX).unwrap(), Decimal::ZERO);
        let dust = pool_share(1, 1_000_000_000_000_000_000_000).unwrap().to_f64().unwrap();
        assert!((dust - 1e-21).abs() < 1e-27);
    }

    #[test]
    fn test_stablecoin_token0_prices_token1_by_inverse() {
        let usdc = Token::new(TOKEN0, "USDC", 6);
        let weth = Token::new(TOKEN1, "WETH", 18);
        let (p0, p1, source) =
            usd_prices(&MarketInputs::default(), &usdc, &weth, Price::new(dec!(0.0005))).unwrap();
        assert_eq!(p0, Decimal::ONE);
        assert_eq!(p1, dec!(2000));
        assert_eq!(source, PriceSource::StablecoinPeg);
    }

    #[tokio::test]
    async fn test_rate_limited_position_read_is_not_not_found() {
        let chain = Arc::new(MockChain::new().with_contract("alpha", manager_address(0), |_| {
            Err(RpcError::Reverted {
                code: -32005,
                message: "rate limit exceeded".to_string(),
            }
            .into())
        }));
        let err = reader(chain, FeeFallbackPolicy::Degrade)
            .read(&request())
            .await
            .unwrap_err();
        assert!(
            matches!(err, LensError::Rpc(RpcError::Reverted { code: -32005, .. })),
            "got {err:?}"
        );
    }
}
