use crate::error::MathError;
use primitive_types::U256;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

// Decimal holds a 96-bit mantissa and at most 28 fractional digits.
const MAX_MANTISSA_BITS: usize = 96;
const MAX_SCALE: u32 = 28;

/// A raw on-chain token quantity together with the token's decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Amount {
    pub raw: U256,
    pub decimals: u8,
}

impl Amount {
    pub fn new(raw: U256, decimals: u8) -> Self {
        Self { raw, decimals }
    }

    /// Scales a human amount up to raw units, truncating sub-unit dust.
    pub fn from_decimal(d: Decimal, decimals: u8) -> Result<Self, MathError> {
        if d.is_sign_negative() {
            return Err(MathError::Overflow("negative amount"));
        }
        let mut raw_decimal = d;
        for _ in 0..decimals {
            raw_decimal = raw_decimal
                .checked_mul(Decimal::TEN)
                .ok_or(MathError::Overflow("amount scaling"))?;
        }
        let raw = raw_decimal
            .trunc()
            .to_u128()
            .ok_or(MathError::Overflow("amount scaling"))?;
        Ok(Self {
            raw: U256::from(raw),
            decimals,
        })
    }

    /// Human amount, `raw / 10^decimals`.
    ///
    /// Exact while the raw value fits a decimal mantissa; beyond that the
    /// least significant digits are dropped. Fails only when the integer part
    /// alone exceeds the decimal range.
    pub fn to_decimal(&self) -> Result<Decimal, MathError> {
        let mut raw = self.raw;
        let mut scale = self.decimals as u32;
        let ten = U256::from(10u8);
        while raw.bits() > MAX_MANTISSA_BITS || scale > MAX_SCALE {
            if scale == 0 {
                return Err(MathError::Overflow("amount to decimal"));
            }
            raw /= ten;
            scale -= 1;
        }
        Decimal::try_from_i128_with_scale(raw.as_u128() as i128, scale)
            .map_err(|_| MathError::Overflow("amount to decimal"))
    }
}
