//! Contract ABI encoding for the fixed set of read-only calls the reader makes.
//!
//! Calldata is a 4-byte selector followed by 32-byte words. Results are
//! decoded word by word; short or malformed results are a [`DecodeError`],
//! never a silent zero.

/// Typed call builders and result decoders.
pub mod calls;
/// Result decoding.
pub mod decode;
/// Calldata encoding.
pub mod encode;

pub use decode::AbiDecoder;
pub use encode::{AbiValue, encode_call};

use thiserror::Error;
use tiny_keccak::{Hasher, Keccak};

/// Size of one ABI word in bytes.
pub const WORD_SIZE: usize = 32;

/// Errors raised while decoding call results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Result holds fewer bytes than the layout requires.
    #[error("result too short: needed {needed} bytes, got {got}")]
    TooShort { needed: usize, got: usize },
    /// Result is not a valid 0x-prefixed hex string.
    #[error("invalid hex in result: {0}")]
    InvalidHex(String),
    /// A word does not fit the declared type.
    #[error("value of {field} does not fit its type")]
    OutOfRange { field: &'static str },
    /// String payload is not UTF-8.
    #[error("string is not valid UTF-8")]
    InvalidUtf8,
    /// Dynamic offset or length points outside the result.
    #[error("dynamic offset {0} is out of bounds")]
    BadOffset(usize),
}

/// Keccak-256 of `data`.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}

/// First four bytes of the keccak-256 hash of a canonical signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Parses a 0x-prefixed hex result into bytes. `0x` alone is empty.
pub fn decode_hex(data: &str) -> Result<Vec<u8>, DecodeError> {
    let digits = data.strip_prefix("0x").unwrap_or(data);
    hex::decode(digits).map_err(|e| DecodeError::InvalidHex(e.to_string()))
}

/// Renders bytes as 0x-prefixed lowercase hex.
pub fn encode_hex(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}
