//! Pure domain model for reading concentrated liquidity positions.
//!
//! Everything here is synchronous and free of I/O: the tick and liquidity
//! math, fee-growth accounting over 256-bit counters, position analytics and
//! the types the protocol layer decodes into.

/// Typed errors of the math engine and value parsing.
pub mod error;
/// Position, pool, tick and token records decoded from chain.
pub mod entities;
/// Protocol identifiers and status flags.
pub mod enums;
/// Fee tiers and fee-growth accounting.
pub mod fees;
/// Tick, price and liquidity conversions.
pub mod math;
/// Capital efficiency, impermanent loss, yield and range analytics.
pub mod metrics;
/// Stablecoin classification.
pub mod stablecoins;
/// Amounts, prices and the aggregated position result.
pub mod value_objects;

/// Commonly used items.
pub mod prelude {
    pub use crate::entities::{Address, PoolState, PositionRaw, TickInfo, Token};
    pub use crate::enums::{FeeAccuracy, PositionStatus, ProtocolId, RangeStrategy};
    pub use crate::error::{AddressError, MathError};
    pub use crate::fees::{FeeAccrual, FeeTier};
    pub use crate::value_objects::{Amount, PositionData, Price, PriceRange};
}
