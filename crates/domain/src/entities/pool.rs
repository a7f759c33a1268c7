use crate::entities::address::Address;
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Pool state needed to value a position and account its fees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    pub address: Address,
    /// Q64.96 square root of the raw price.
    pub sqrt_price_x96: U256,
    pub current_tick: i32,
    /// Active (in-range) liquidity.
    pub liquidity: u128,
    pub fee_growth_global0_x128: U256,
    pub fee_growth_global1_x128: U256,
}

/// Fee growth recorded on the far side of one initialized tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickInfo {
    pub tick: i32,
    pub liquidity_gross: u128,
    pub liquidity_net: i128,
    pub fee_growth_outside0_x128: U256,
    pub fee_growth_outside1_x128: U256,
}
