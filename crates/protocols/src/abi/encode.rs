use super::WORD_SIZE;
use clmm_lens_domain::entities::Address;
use primitive_types::U256;

/// A static argument value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbiValue {
    /// Right-aligned in the low 20 bytes.
    Address(Address),
    /// Big-endian, zero padded on the left.
    Uint(U256),
    /// Signed tick, sign-extended to 256 bits.
    Int24(i32),
}

impl AbiValue {
    /// Encodes the value as one 32-byte word.
    pub fn to_word(&self) -> [u8; WORD_SIZE] {
        let mut word = [0u8; WORD_SIZE];
        match self {
            AbiValue::Address(address) => {
                word[12..].copy_from_slice(address.as_bytes());
            }
            AbiValue::Uint(value) => {
                // Limbs are little-endian u64s.
                for (i, limb) in value.0.iter().enumerate() {
                    let end = WORD_SIZE - i * 8;
                    word[end - 8..end].copy_from_slice(&limb.to_be_bytes());
                }
            }
            AbiValue::Int24(value) => {
                let fill = if *value < 0 { 0xff } else { 0x00 };
                word = [fill; WORD_SIZE];
                word[28..].copy_from_slice(&value.to_be_bytes());
            }
        }
        word
    }
}

/// Builds calldata: selector followed by one word per argument.
pub fn encode_call(selector: [u8; 4], args: &[AbiValue]) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + args.len() * WORD_SIZE);
    data.extend_from_slice(&selector);
    for arg in args {
        data.extend_from_slice(&arg.to_word());
    }
    data
}
