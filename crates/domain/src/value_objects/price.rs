use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Price of token0 quoted in token1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price {
    pub value: Decimal,
}

impl Price {
    pub fn new(value: Decimal) -> Self {
        Self { value }
    }

    /// Price of token1 quoted in token0. Zero stays zero.
    pub fn invert(&self) -> Self {
        if self.value.is_zero() {
            return Self {
                value: Decimal::ZERO,
            };
        }
        Self {
            value: Decimal::ONE.checked_div(self.value).unwrap_or(Decimal::ZERO),
        }
    }
}
