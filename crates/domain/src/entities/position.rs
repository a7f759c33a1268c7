use crate::entities::address::Address;
use crate::fees::FeeTier;
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Position record as returned by the position manager's `positions(id)`.
///
/// A snapshot for one invocation; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRaw {
    pub token_id: U256,
    pub nonce: U256,
    pub operator: Address,
    pub token0: Address,
    pub token1: Address,
    pub fee: FeeTier,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u128,
    pub fee_growth_inside0_last_x128: U256,
    pub fee_growth_inside1_last_x128: U256,
    pub tokens_owed0: u128,
    pub tokens_owed1: u128,
}

impl PositionRaw {
    /// A burned or never-minted id decodes to zero token addresses.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.token0.is_zero() || self.token1.is_zero()
    }

    /// Still exists but holds no liquidity.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.liquidity == 0
    }
}
