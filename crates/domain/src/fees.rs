//! Fee accounting over Uniswap V3 style fee-growth counters.
//!
//! Fee-growth values are Q128.128 counters that are allowed to wrap. All
//! subtraction here is modulo 2^256 on [`U256`]; the product with liquidity is
//! taken at 512 bits before shifting so nothing is lost to overflow.

use crate::entities::{PoolState, PositionRaw, TickInfo};
use crate::enums::FeeAccuracy;
use primitive_types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Pool fee in hundredths of a basis point (3000 = 0.3%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeeTier {
    pub pips: u32,
}

impl FeeTier {
    pub fn new(pips: u32) -> Self {
        Self { pips }
    }

    /// Fee as a fraction of volume (0.003 for 3000).
    #[must_use]
    pub fn fraction(&self) -> Decimal {
        Decimal::new(self.pips as i64, 6)
    }

    /// Human label such as `0.05%`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}%", Decimal::new(self.pips as i64, 4).normalize())
    }

    /// Tick spacing of the standard tiers.
    #[must_use]
    pub fn tick_spacing(&self) -> Option<i32> {
        match self.pips {
            100 => Some(1),
            500 => Some(10),
            2500 => Some(50),
            3000 => Some(60),
            10000 => Some(200),
            _ => None,
        }
    }
}

/// Uncollected fees of one position, in raw token units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeAccrual {
    pub amount0: U256,
    pub amount1: U256,
    pub accuracy: FeeAccuracy,
}

/// Fee growth below `tick_lower`, as seen from the current tick.
pub fn fee_growth_below(
    tick_current: i32,
    tick_lower: i32,
    fee_growth_global: U256,
    fee_growth_outside_lower: U256,
) -> U256 {
    if tick_current >= tick_lower {
        fee_growth_outside_lower
    } else {
        fee_growth_global.overflowing_sub(fee_growth_outside_lower).0
    }
}

/// Fee growth above `tick_upper`, as seen from the current tick.
pub fn fee_growth_above(
    tick_current: i32,
    tick_upper: i32,
    fee_growth_global: U256,
    fee_growth_outside_upper: U256,
) -> U256 {
    if tick_current < tick_upper {
        fee_growth_outside_upper
    } else {
        fee_growth_global.overflowing_sub(fee_growth_outside_upper).0
    }
}

/// inside = global - below - above (mod 2^256)
pub fn fee_growth_inside(fee_growth_global: U256, below: U256, above: U256) -> U256 {
    fee_growth_global
        .overflowing_sub(below)
        .0
        .overflowing_sub(above)
        .0
}

/// owed + uint128(liquidity * (inside_now - inside_last) / 2^128)
///
/// The delta wraps modulo 2^256 and the scaled product is truncated to 128
/// bits, matching the pool contract's own accounting.
pub fn uncollected_fees(
    tokens_owed: u128,
    liquidity: u128,
    fee_growth_inside_now: U256,
    fee_growth_inside_last: U256,
) -> U256 {
    let delta = fee_growth_inside_now.overflowing_sub(fee_growth_inside_last).0;
    let product = delta.full_mul(U256::from(liquidity));
    // Limbs are little-endian u64s; limbs 2 and 3 are bits 128..256, i.e.
    // the product shifted right by 128 and masked to 128 bits.
    let limbs = product.0;
    let accrued = (limbs[2] as u128) | ((limbs[3] as u128) << 64);
    U256::from(tokens_owed) + U256::from(accrued)
}

/// Uncollected fees from full fee-growth accounting.
pub fn compute_fee_accrual(
    position: &PositionRaw,
    pool: &PoolState,
    lower: &TickInfo,
    upper: &TickInfo,
) -> FeeAccrual {
    let tick = pool.current_tick;

    let inside0 = fee_growth_inside(
        pool.fee_growth_global0_x128,
        fee_growth_below(
            tick,
            position.tick_lower,
            pool.fee_growth_global0_x128,
            lower.fee_growth_outside0_x128,
        ),
        fee_growth_above(
            tick,
            position.tick_upper,
            pool.fee_growth_global0_x128,
            upper.fee_growth_outside0_x128,
        ),
    );
    let inside1 = fee_growth_inside(
        pool.fee_growth_global1_x128,
        fee_growth_below(
            tick,
            position.tick_lower,
            pool.fee_growth_global1_x128,
            lower.fee_growth_outside1_x128,
        ),
        fee_growth_above(
            tick,
            position.tick_upper,
            pool.fee_growth_global1_x128,
            upper.fee_growth_outside1_x128,
        ),
    );

    FeeAccrual {
        amount0: uncollected_fees(
            position.tokens_owed0,
            position.liquidity,
            inside0,
            position.fee_growth_inside0_last_x128,
        ),
        amount1: uncollected_fees(
            position.tokens_owed1,
            position.liquidity,
            inside1,
            position.fee_growth_inside1_last_x128,
        ),
        accuracy: FeeAccuracy::Exact,
    }
}

/// Reduced-accuracy fallback when tick data cannot be read: reports only
/// what the position manager already recorded as owed.
pub fn tokens_owed_only(position: &PositionRaw) -> FeeAccrual {
    FeeAccrual {
        amount0: U256::from(position.tokens_owed0),
        amount1: U256::from(position.tokens_owed1),
        accuracy: FeeAccuracy::TokensOwedOnly,
    }
}
