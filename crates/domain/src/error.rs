use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by the pure math and fee functions.
///
/// Every guard in the math engine surfaces one of these instead of clamping or
/// returning NaN, so callers decide whether to abort or fall back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MathError {
    /// Tick lies outside `[MIN_TICK, MAX_TICK]`.
    #[error("tick {0} is outside the valid range [-887272, 887272]")]
    TickOutOfRange(i64),
    /// A derived price cannot be represented as a decimal.
    #[error("derived price is outside representable bounds")]
    PriceOutOfBounds,
    /// Price inputs must be strictly positive.
    #[error("price must be positive, got {0}")]
    NonPositivePrice(Decimal),
    /// Lower bound of a price range is above its upper bound.
    #[error("invalid price range: lower {lower} is above upper {upper}")]
    InvalidRange { lower: Decimal, upper: Decimal },
    /// A model parameter must be strictly positive.
    #[error("{0} must be positive")]
    NonPositive(&'static str),
    /// Position value is zero, so no yield can be expressed against it.
    #[error("position value must be non-zero")]
    ZeroPositionValue,
    /// An intermediate result does not fit the target numeric type.
    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),
}

/// Failure to parse a hex account address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address must be 20 bytes, got {0}")]
    InvalidLength(usize),
    #[error("address is not valid hex: {0}")]
    InvalidHex(String),
}
