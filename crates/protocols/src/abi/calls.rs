//! Calldata builders and result decoders for the position manager, factory,
//! pool and ERC-20 functions the reader touches.

use super::{AbiDecoder, AbiValue, DecodeError, encode_call};
use clmm_lens_domain::entities::{Address, PositionRaw, TickInfo};
use clmm_lens_domain::fees::FeeTier;
use clmm_lens_domain::math::price_tick::check_tick;
use primitive_types::U256;

/// `positions(uint256)`
pub const POSITIONS: [u8; 4] = [0x99, 0xfb, 0xab, 0x88];
/// `slot0()`
pub const SLOT0: [u8; 4] = [0x38, 0x50, 0xc7, 0xbd];
/// `liquidity()`
pub const LIQUIDITY: [u8; 4] = [0x1a, 0x68, 0x65, 0x02];
/// `feeGrowthGlobal0X128()`
pub const FEE_GROWTH_GLOBAL0: [u8; 4] = [0xf3, 0x05, 0x83, 0x99];
/// `feeGrowthGlobal1X128()`
pub const FEE_GROWTH_GLOBAL1: [u8; 4] = [0x46, 0x14, 0x13, 0x19];
/// `ticks(int24)`
pub const TICKS: [u8; 4] = [0xf3, 0x0d, 0xba, 0x93];
/// `getPool(address,address,uint24)`
pub const GET_POOL: [u8; 4] = [0x16, 0x98, 0xee, 0x82];
/// `decimals()`
pub const DECIMALS: [u8; 4] = [0x31, 0x3c, 0xe5, 0x67];
/// `symbol()`
pub const SYMBOL: [u8; 4] = [0x95, 0xd8, 0x9b, 0x41];
/// `balanceOf(address)`
pub const BALANCE_OF: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];
/// `tokenOfOwnerByIndex(address,uint256)`
pub const TOKEN_OF_OWNER_BY_INDEX: [u8; 4] = [0x2f, 0x74, 0x5c, 0x59];

const POSITIONS_WORDS: usize = 12;
const TICKS_WORDS: usize = 4;

pub fn positions(token_id: U256) -> Vec<u8> {
    encode_call(POSITIONS, &[AbiValue::Uint(token_id)])
}

pub fn slot0() -> Vec<u8> {
    encode_call(SLOT0, &[])
}

pub fn liquidity() -> Vec<u8> {
    encode_call(LIQUIDITY, &[])
}

pub fn fee_growth_global0() -> Vec<u8> {
    encode_call(FEE_GROWTH_GLOBAL0, &[])
}

pub fn fee_growth_global1() -> Vec<u8> {
    encode_call(FEE_GROWTH_GLOBAL1, &[])
}

pub fn ticks(tick: i32) -> Vec<u8> {
    encode_call(TICKS, &[AbiValue::Int24(tick)])
}

pub fn get_pool(token0: Address, token1: Address, fee: FeeTier) -> Vec<u8> {
    encode_call(
        GET_POOL,
        &[
            AbiValue::Address(token0),
            AbiValue::Address(token1),
            AbiValue::Uint(U256::from(fee.pips)),
        ],
    )
}

pub fn decimals() -> Vec<u8> {
    encode_call(DECIMALS, &[])
}

pub fn symbol() -> Vec<u8> {
    encode_call(SYMBOL, &[])
}

pub fn balance_of(owner: Address) -> Vec<u8> {
    encode_call(BALANCE_OF, &[AbiValue::Address(owner)])
}

pub fn token_of_owner_by_index(owner: Address, index: U256) -> Vec<u8> {
    encode_call(
        TOKEN_OF_OWNER_BY_INDEX,
        &[AbiValue::Address(owner), AbiValue::Uint(index)],
    )
}

fn tick_field(decoder: &AbiDecoder<'_>, index: usize, field: &'static str) -> Result<i32, DecodeError> {
    let tick = decoder.int24(index, field)?;
    check_tick(tick as i64).map_err(|_| DecodeError::OutOfRange { field })
}

/// Decodes the 12-word `positions()` result.
pub fn decode_positions(token_id: U256, data: &[u8]) -> Result<PositionRaw, DecodeError> {
    let d = AbiDecoder::new(data);
    d.require_words(POSITIONS_WORDS)?;
    Ok(PositionRaw {
        token_id,
        nonce: d.uint(0)?,
        operator: d.address(1)?,
        token0: d.address(2)?,
        token1: d.address(3)?,
        fee: FeeTier::new(d.uint24(4, "fee")?),
        tick_lower: tick_field(&d, 5, "tickLower")?,
        tick_upper: tick_field(&d, 6, "tickUpper")?,
        liquidity: d.uint128(7, "liquidity")?,
        fee_growth_inside0_last_x128: d.uint(8)?,
        fee_growth_inside1_last_x128: d.uint(9)?,
        tokens_owed0: d.uint128(10, "tokensOwed0")?,
        tokens_owed1: d.uint128(11, "tokensOwed1")?,
    })
}

/// `(sqrtPriceX96, tick)` from the first two words of `slot0()`.
///
/// The trailing words differ between deployments and are ignored.
pub fn decode_slot0(data: &[u8]) -> Result<(U256, i32), DecodeError> {
    let d = AbiDecoder::new(data);
    d.require_words(2)?;
    let sqrt_price_x96 = d.uint(0)?;
    if sqrt_price_x96.bits() > 160 {
        return Err(DecodeError::OutOfRange {
            field: "sqrtPriceX96",
        });
    }
    Ok((sqrt_price_x96, tick_field(&d, 1, "tick")?))
}

pub fn decode_liquidity(data: &[u8]) -> Result<u128, DecodeError> {
    AbiDecoder::new(data).uint128(0, "liquidity")
}

pub fn decode_uint256(data: &[u8]) -> Result<U256, DecodeError> {
    AbiDecoder::new(data).uint(0)
}

/// Decodes `ticks(int24)`: liquidityGross, liquidityNet, feeGrowthOutside0X128,
/// feeGrowthOutside1X128, then fields the reader does not use.
pub fn decode_ticks(tick: i32, data: &[u8]) -> Result<TickInfo, DecodeError> {
    let d = AbiDecoder::new(data);
    d.require_words(TICKS_WORDS)?;
    Ok(TickInfo {
        tick,
        liquidity_gross: d.uint128(0, "liquidityGross")?,
        liquidity_net: d.int128(1, "liquidityNet")?,
        fee_growth_outside0_x128: d.uint(2)?,
        fee_growth_outside1_x128: d.uint(3)?,
    })
}

pub fn decode_address(data: &[u8]) -> Result<Address, DecodeError> {
    AbiDecoder::new(data).address(0)
}

pub fn decode_decimals(data: &[u8]) -> Result<u8, DecodeError> {
    AbiDecoder::new(data).uint8(0, "decimals")
}

pub fn decode_symbol(data: &[u8]) -> Result<String, DecodeError> {
    AbiDecoder::new(data).string()
}
